//! Credential resolution and token lifecycle

pub mod credentials;
pub mod identity;
pub mod resolver;
pub mod token;

pub use credentials::{AuthMode, Credentials};
pub use identity::IdentityProvider;
pub use resolver::CredentialResolver;
pub use token::{REFRESH_MARGIN_SECS, Token};
