//! Remote REST API access.
//!
//! - `client`: bearer attachment, transparent refresh, status classification.
//! - `user`: the current-account lookup used by `whoami`.

mod client;
mod user;

pub use client::AuthenticatedClient;
pub use user::{current_user, CurrentUser};
