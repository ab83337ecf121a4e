use std::fmt;

/// How a token was (or will be) obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    AccessToken,
    ServicePrincipal,
    UserPassword,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::ServicePrincipal => "service_principal",
            Self::UserPassword => "user_credentials",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete credential combination resolved from configuration
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Pre-obtained bearer token, used as-is
    AccessToken(String),
    /// Client-credentials grant with an application secret
    ServicePrincipal {
        tenant_id: String,
        client_id: String,
        client_secret: String,
    },
    /// Resource-owner password grant
    UserPassword {
        tenant_id: String,
        client_id: String,
        username: String,
        password: String,
    },
}

impl Credentials {
    pub fn mode(&self) -> AuthMode {
        match self {
            Self::AccessToken(_) => AuthMode::AccessToken,
            Self::ServicePrincipal { .. } => AuthMode::ServicePrincipal,
            Self::UserPassword { .. } => AuthMode::UserPassword,
        }
    }

    pub fn tenant_id(&self) -> Option<&str> {
        match self {
            Self::AccessToken(_) => None,
            Self::ServicePrincipal { tenant_id, .. } | Self::UserPassword { tenant_id, .. } => {
                Some(tenant_id)
            }
        }
    }

    /// Non-secret identity for display: client ID or username
    pub fn principal(&self) -> Option<&str> {
        match self {
            Self::AccessToken(_) => None,
            Self::ServicePrincipal { client_id, .. } => Some(client_id),
            Self::UserPassword { username, .. } => Some(username),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessToken(_) => f.debug_tuple("AccessToken").field(&"<redacted>").finish(),
            Self::ServicePrincipal { tenant_id, client_id, .. } => f
                .debug_struct("ServicePrincipal")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            Self::UserPassword { tenant_id, client_id, username, .. } => f
                .debug_struct("UserPassword")
                .field("tenant_id", tenant_id)
                .field("client_id", client_id)
                .field("username", username)
                .finish_non_exhaustive(),
        }
    }
}
