pub mod handlers;
pub mod routes;

pub use handlers::{resolve, RedirectOutcome, RedirectState};
pub use routes::create_redirect_router;
