//! Credential models: redacted secrets and the OAuth token pair.

pub mod secret;
pub mod token;

pub use secret::*;
pub use token::*;
