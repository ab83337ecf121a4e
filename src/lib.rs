pub mod api;
pub mod auth;
pub mod config;
pub mod error;

pub use api::DataverseClient;
pub use auth::{AuthMode, CredentialResolver, Token};
pub use config::Config;
pub use error::{DataverseError, Result};
