// ABOUTME: Service principal credential used to reach the management API.
// ABOUTME: The access token is held as a secret and never printed.

use secrecy::{ExposeSecret, SecretString};

/// Identity plus bearer token for one subscription.
///
/// Token acquisition happens outside this crate; the token is taken as given.
#[derive(Clone)]
pub struct ServicePrincipal {
    pub id: String,
    pub subscription_id: String,
    pub access_token: SecretString,
}

impl ServicePrincipal {
    pub fn new(
        id: impl Into<String>,
        subscription_id: impl Into<String>,
        access_token: SecretString,
    ) -> Self {
        Self {
            id: id.into(),
            subscription_id: subscription_id.into(),
            access_token,
        }
    }

    /// Whether two credentials carry the same identity and the same secret.
    pub fn same_identity(&self, other: &ServicePrincipal) -> bool {
        self.id == other.id
            && self.subscription_id == other.subscription_id
            && self.access_token.expose_secret() == other.access_token.expose_secret()
    }
}

impl std::fmt::Debug for ServicePrincipal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicePrincipal")
            .field("id", &self.id)
            .field("subscription_id", &self.subscription_id)
            .field("access_token", &"<redacted>")
            .finish()
    }
}
