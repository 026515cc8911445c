//! OAuth token lifecycle for the Lawmatics integration: the durable token
//! record, its single-file store, the authorization-server client, and the
//! manager that decides when a token is usable and when to refresh it.

pub mod client;
pub mod lifecycle;
pub mod store;
pub mod token;

pub use client::LawmaticsAuthServer;
pub use lifecycle::{KeepAliveStatus, TokenLifecycle};
pub use store::TokenStore;
