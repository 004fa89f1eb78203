//! Short code assignment.
//!
//! A code is the first [`CODE_LENGTH`] hex characters of the SHA-256 digest of
//! the original URL. When that prefix is already taken by a *different* URL the
//! URL is salted with an attempt counter and hashed again, up to
//! [`MAX_ATTEMPTS`] candidates. Shortening a URL that is already stored
//! returns its existing code without writing a second row.

use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::storage::{Storage, StorageError};

/// Number of hex characters kept from the digest
pub const CODE_LENGTH: usize = 8;

/// Candidates tried before giving up
pub const MAX_ATTEMPTS: u32 = 10;

#[derive(Debug, Error)]
pub enum AssignError {
    #[error("failed to generate a unique short code after {attempts} attempts")]
    CodeSpaceExhausted { attempts: u32 },
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Candidate code for `original_url` on the given attempt.
///
/// Attempt 0 hashes the URL as-is; later attempts append the attempt number.
pub fn candidate_code(original_url: &str, attempt: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(original_url.as_bytes());
    if attempt > 0 {
        hasher.update(attempt.to_string().as_bytes());
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..CODE_LENGTH].to_string()
}

pub struct CodeAssigner {
    storage: Arc<dyn Storage>,
    max_attempts: u32,
}

impl CodeAssigner {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            max_attempts: MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Assign (or look up) the short code for `original_url` and persist the mapping.
    pub async fn assign(&self, original_url: &str) -> Result<String, AssignError> {
        for attempt in 0..self.max_attempts {
            let code = candidate_code(original_url, attempt);

            if let Some(existing) = self.storage.get_mapping(&code).await? {
                if existing.original_url == original_url {
                    debug!(short_code = %code, "URL already shortened, reusing code");
                    return Ok(code);
                }
                warn!(short_code = %code, attempt, "short code collision");
                continue;
            }

            match self.storage.insert_mapping(&code, original_url).await {
                Ok(_) => {
                    info!(short_code = %code, attempt, "created short code");
                    return Ok(code);
                }
                Err(StorageError::Conflict) => {
                    // Another writer took the code between lookup and insert
                    match self.storage.get_mapping(&code).await? {
                        Some(existing) if existing.original_url == original_url => {
                            return Ok(code);
                        }
                        _ => {
                            warn!(short_code = %code, attempt, "short code collision on insert");
                        }
                    }
                }
                Err(StorageError::Other(e)) => return Err(AssignError::Storage(e)),
            }
        }

        Err(AssignError::CodeSpaceExhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::SqliteStorage;

    async fn setup() -> Arc<dyn Storage> {
        let storage = SqliteStorage::new("sqlite::memory:", 1).await.unwrap();
        storage.init().await.unwrap();
        Arc::new(storage)
    }

    #[test]
    fn test_candidate_code_matches_sha256_prefix() {
        // sha256("hello") = 2cf24dba5fb0a30e26e83b2ac5b9e29e...
        assert_eq!(candidate_code("hello", 0), "2cf24dba");
    }

    #[test]
    fn test_candidate_code_is_deterministic_and_hex() {
        let a = candidate_code("https://example.com/page", 0);
        let b = candidate_code("https://example.com/page", 0);
        assert_eq!(a, b);
        assert_eq!(a.len(), CODE_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_salted_attempts_differ() {
        let first = candidate_code("https://example.com/page", 0);
        let second = candidate_code("https://example.com/page", 1);
        assert_ne!(first, second);
        assert_eq!(second, candidate_code("https://example.com/page1", 0));
    }

    #[tokio::test]
    async fn test_assign_persists_mapping() {
        let storage = setup().await;
        let assigner = CodeAssigner::new(Arc::clone(&storage));

        let code = assigner.assign("https://example.com/page").await.unwrap();
        assert_eq!(code, candidate_code("https://example.com/page", 0));

        let mapping = storage.get_mapping(&code).await.unwrap().unwrap();
        assert_eq!(mapping.original_url, "https://example.com/page");
    }

    #[tokio::test]
    async fn test_assign_same_url_twice_is_noop() {
        let storage = setup().await;
        let assigner = CodeAssigner::new(Arc::clone(&storage));

        let first = assigner.assign("https://example.com/page").await.unwrap();
        let second = assigner.assign("https://example.com/page").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(storage.count_mappings().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_assign_resolves_collision_with_salt() {
        let storage = setup().await;
        let url = "https://example.com/page";

        // Occupy the unsalted candidate with a different URL
        storage
            .insert_mapping(&candidate_code(url, 0), "https://squatter.example")
            .await
            .unwrap();

        let assigner = CodeAssigner::new(Arc::clone(&storage));
        let code = assigner.assign(url).await.unwrap();

        assert_eq!(code, candidate_code(url, 1));
        assert_eq!(
            storage.get_mapping(&code).await.unwrap().unwrap().original_url,
            url
        );
    }

    #[tokio::test]
    async fn test_assign_finds_url_stored_under_salted_code() {
        let storage = setup().await;
        let url = "https://example.com/page";

        storage
            .insert_mapping(&candidate_code(url, 0), "https://squatter.example")
            .await
            .unwrap();

        let assigner = CodeAssigner::new(Arc::clone(&storage));
        let first = assigner.assign(url).await.unwrap();
        let second = assigner.assign(url).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(storage.count_mappings().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_assign_gives_up_after_max_attempts() {
        let storage = setup().await;
        let url = "https://example.com/page";

        for attempt in 0..3 {
            storage
                .insert_mapping(
                    &candidate_code(url, attempt),
                    &format!("https://other.example/{attempt}"),
                )
                .await
                .unwrap();
        }

        let assigner = CodeAssigner::new(Arc::clone(&storage)).with_max_attempts(3);
        let err = assigner.assign(url).await.unwrap_err();
        assert!(matches!(
            err,
            AssignError::CodeSpaceExhausted { attempts: 3 }
        ));
    }
}
