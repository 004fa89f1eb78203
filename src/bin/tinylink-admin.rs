use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tinylink::analytics::visit_log;
use tinylink::config::Config;
use tinylink::shortcode::CodeAssigner;
use tinylink::storage;

#[derive(Parser)]
#[command(name = "tinylink-admin")]
#[command(about = "tinylink store management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Shorten a URL and print its short URL
    Shorten {
        /// Original URL to shorten
        url: String,
    },
    /// Show the original URL behind a short code (no visit is recorded)
    Lookup {
        /// Short code
        code: String,
    },
    /// List recorded visits for a short code
    Analytics {
        /// Short code
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let storage = storage::connect(&config.database)
        .await
        .context("failed to open the configured store")?;

    match cli.command {
        Commands::Shorten { url } => {
            let code = CodeAssigner::new(storage).assign(&url).await?;
            println!("✓ {}", config.short_url(&code));
        }
        Commands::Lookup { code } => match storage.get_mapping(&code).await? {
            Some(mapping) => println!("{} -> {}", mapping.short_code, mapping.original_url),
            None => println!("⚠ Short code '{}' not found", code),
        },
        Commands::Analytics { code } => {
            let visits = visit_log(storage.as_ref(), &code).await?;
            if visits.is_empty() {
                println!("No visits recorded for '{}'.", code);
            } else {
                println!("{:<20} {}", "Timestamp", "IP Address");
                println!("{}", "-".repeat(60));
                for (timestamp, ip_address) in visits {
                    println!("{:<20} {}", timestamp, ip_address);
                }
            }
        }
    }

    Ok(())
}
