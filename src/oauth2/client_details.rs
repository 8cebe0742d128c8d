use std::collections::{BTreeSet, HashMap};

use bcrypt::BcryptError;
use strum::{AsRefStr, Display, EnumString};

use crate::password::PasswordEncoder;

pub const TRUSTED_CLIENT_ID: &str = "squeezer";
pub const TRUSTED_CLIENT_PASSWORD: &str = "squeezer";

/// Access-token lifetime of the trusted client
pub const TRUSTED_CLIENT_ACCESS_TOKEN_VALIDITY_SECONDS: i64 = 10_000;

/// Refresh-token lifetime of the trusted client (1 day)
pub const TRUSTED_CLIENT_REFRESH_TOKEN_VALIDITY_SECONDS: i64 = 86_400;

/// OAuth2 grant types known to the token endpoint.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumString, Display, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    Implicit,
    ClientCredentials,
    Password,
    RefreshToken,
}

/// A registered OAuth2 client.
#[derive(Debug, Clone)]
pub struct ClientDetails {
    pub client_id: String,
    /// bcrypt encoded secret
    pub client_secret: String,
    pub authorized_grant_types: BTreeSet<GrantType>,
    pub scope: BTreeSet<String>,
    pub access_token_validity_seconds: i64,
    pub refresh_token_validity_seconds: i64,
}

impl ClientDetails {
    /// The built-in trusted client: password and refresh-token grants,
    /// `read` and `write` scopes.
    pub fn trusted(encoder: &PasswordEncoder) -> Result<Self, BcryptError> {
        Ok(Self {
            client_id: TRUSTED_CLIENT_ID.to_string(),
            client_secret: encoder.encode(TRUSTED_CLIENT_PASSWORD)?,
            authorized_grant_types: BTreeSet::from([GrantType::RefreshToken, GrantType::Password]),
            scope: BTreeSet::from(["read".to_string(), "write".to_string()]),
            access_token_validity_seconds: TRUSTED_CLIENT_ACCESS_TOKEN_VALIDITY_SECONDS,
            refresh_token_validity_seconds: TRUSTED_CLIENT_REFRESH_TOKEN_VALIDITY_SECONDS,
        })
    }

    #[must_use]
    pub fn is_authorized_for(&self, grant_type: GrantType) -> bool {
        self.authorized_grant_types.contains(&grant_type)
    }
}

/// In-memory client registry.
#[derive(Debug, Clone, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, ClientDetails>,
}

impl ClientRegistry {
    pub fn in_memory(clients: impl IntoIterator<Item = ClientDetails>) -> Self {
        Self {
            clients: clients
                .into_iter()
                .map(|client| (client.client_id.clone(), client))
                .collect(),
        }
    }

    /// Registry holding only the trusted client
    pub fn with_trusted_client(encoder: &PasswordEncoder) -> Result<Self, BcryptError> {
        Ok(Self::in_memory([ClientDetails::trusted(encoder)?]))
    }

    #[must_use]
    pub fn load_client_by_client_id(&self, client_id: &str) -> Option<&ClientDetails> {
        self.clients.get(client_id)
    }
}
