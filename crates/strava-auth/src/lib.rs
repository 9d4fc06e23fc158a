//! Strava OAuth building blocks
//!
//! Holds the pieces of the OAuth flow that do not need an HTTP client:
//! endpoint constants, the `TokenSet` triple, token grant request bodies,
//! authorization URL construction, CSRF state generation, and a file-backed
//! token store for callers that want to persist refreshed tokens.
//!
//! Typical flow:
//! 1. `generate_state()` + `build_authorization_url()` for the browser step
//! 2. The client POSTs a `TokenRequest::authorization_code()` grant
//! 3. The returned `TokenSet` is saved with `TokenStore::put()`
//! 4. On refresh the client POSTs `TokenRequest::refresh()` and the caller's
//!    refresh callback writes the new `TokenSet` back to the store

pub mod authorize;
pub mod constants;
pub mod error;
pub mod store;
pub mod token;

pub use authorize::{ApprovalPrompt, build_authorization_url, generate_state};
pub use constants::*;
pub use error::{Error, Result};
pub use store::TokenStore;
pub use token::{TokenRequest, TokenSet, unix_now};
