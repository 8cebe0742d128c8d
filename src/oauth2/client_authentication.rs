use axum::http::{header, HeaderMap};
use base64::{engine::general_purpose, Engine as _};

use crate::{
    oauth2::{client_details::ClientDetails, ClientRegistry, OAuth2Error},
    password::PasswordEncoder,
};

/// Client id and secret as presented by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Reads client credentials from HTTP Basic, falling back to the
/// `client_id`/`client_secret` form parameters.
///
/// Returns `Ok(None)` when neither is present. A Basic header that cannot be
/// decoded is an error rather than a fallback.
pub fn client_credentials(
    headers: &HeaderMap,
    form_client_id: Option<&str>,
    form_client_secret: Option<&str>,
) -> Result<Option<ClientCredentials>, OAuth2Error> {
    if let Some(value) = headers.get(header::AUTHORIZATION) {
        let value = value
            .to_str()
            .map_err(|_| invalid_basic_token())?;

        if let Some(encoded) = value.strip_prefix("Basic ") {
            return decode_basic(encoded).map(Some);
        }
    }

    Ok(form_client_id
        .filter(|client_id| !client_id.is_empty())
        .map(|client_id| ClientCredentials {
            client_id: client_id.to_string(),
            client_secret: form_client_secret.unwrap_or_default().to_string(),
        }))
}

fn decode_basic(encoded: &str) -> Result<ClientCredentials, OAuth2Error> {
    let decoded = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|_| invalid_basic_token())?;
    let decoded = String::from_utf8(decoded).map_err(|_| invalid_basic_token())?;

    let (client_id, client_secret) = decoded.split_once(':').ok_or_else(invalid_basic_token)?;

    Ok(ClientCredentials {
        client_id: client_id.to_string(),
        client_secret: client_secret.to_string(),
    })
}

fn invalid_basic_token() -> OAuth2Error {
    OAuth2Error::InvalidClient("Failed to decode basic authentication token".to_string())
}

/// Authenticates the caller as a registered client.
pub async fn authenticate_client<'a>(
    registry: &'a ClientRegistry,
    encoder: &PasswordEncoder,
    credentials: Option<ClientCredentials>,
) -> Result<&'a ClientDetails, OAuth2Error> {
    let credentials = credentials.ok_or(OAuth2Error::Unauthorized)?;

    let client = registry
        .load_client_by_client_id(&credentials.client_id)
        .ok_or_else(OAuth2Error::bad_client_credentials)?;

    if !encoder
        .matches_blocking(&credentials.client_secret, &client.client_secret)
        .await
    {
        return Err(OAuth2Error::bad_client_credentials());
    }

    Ok(client)
}
