use std::{collections::BTreeSet, str::FromStr as _};

use sea_orm::DatabaseConnection;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    oauth2::{
        client_details::ClientDetails,
        scope::{format_scope, parse_scope},
        user_details::{authenticate_user, load_user_by_username},
        GrantType, IssuedToken, OAuth2Authentication, OAuth2Error, TokenServices,
    },
    password::PasswordEncoder,
};

/// Form parameters accepted by the token endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRequest {
    pub grant_type: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl TokenRequest {
    fn requested_scope(&self) -> Option<BTreeSet<String>> {
        self.scope.as_deref().map(parse_scope)
    }
}

/// Grants a token to an already authenticated client.
pub async fn grant(
    db: &DatabaseConnection,
    encoder: &PasswordEncoder,
    client: &ClientDetails,
    request: &TokenRequest,
) -> Result<IssuedToken, OAuth2Error> {
    let grant_type = request
        .grant_type
        .as_deref()
        .filter(|grant_type| !grant_type.is_empty())
        .ok_or_else(|| OAuth2Error::InvalidRequest("Missing grant type".to_string()))?;

    let grant_type = GrantType::from_str(grant_type).map_err(|_| {
        OAuth2Error::UnsupportedGrantType(format!("Unsupported grant type: {grant_type}"))
    })?;

    if !client.is_authorized_for(grant_type) {
        warn!(
            "Client {} attempted unauthorized grant type {}",
            client.client_id, grant_type
        );
        return Err(OAuth2Error::UnauthorizedClient(format!(
            "Unauthorized grant type: {grant_type}"
        )));
    }

    match grant_type {
        GrantType::Password => password_grant(db, encoder, client, request).await,
        GrantType::RefreshToken => refresh_token_grant(db, client, request).await,
        GrantType::AuthorizationCode | GrantType::Implicit | GrantType::ClientCredentials => Err(
            OAuth2Error::UnsupportedGrantType(format!("Unsupported grant type: {grant_type}")),
        ),
    }
}

/// Resolves the requested scope against the client's registered scope.
/// An absent or empty request means every registered scope.
fn validate_scope(
    client: &ClientDetails,
    requested: Option<BTreeSet<String>>,
) -> Result<BTreeSet<String>, OAuth2Error> {
    match requested {
        Some(requested) if !requested.is_empty() => {
            if let Some(invalid) = requested.iter().find(|scope| !client.scope.contains(*scope)) {
                return Err(OAuth2Error::InvalidScope(format!(
                    "Invalid scope: {invalid}"
                )));
            }
            Ok(requested)
        }
        _ => Ok(client.scope.clone()),
    }
}

async fn password_grant(
    db: &DatabaseConnection,
    encoder: &PasswordEncoder,
    client: &ClientDetails,
    request: &TokenRequest,
) -> Result<IssuedToken, OAuth2Error> {
    let username = request
        .username
        .as_deref()
        .ok_or_else(|| OAuth2Error::InvalidRequest("Missing username".to_string()))?;
    let password = request
        .password
        .as_deref()
        .ok_or_else(|| OAuth2Error::InvalidRequest("Missing password".to_string()))?;

    let scope = validate_scope(client, request.requested_scope())?;

    let user = authenticate_user(db, encoder, username, password)
        .await?
        .ok_or_else(|| {
            warn!("Password grant refused for user {}", username);
            OAuth2Error::bad_credentials()
        })?;

    let authentication = OAuth2Authentication {
        user_name: user.username.clone(),
        client_id: client.client_id.clone(),
        scope,
        authorities: user.authority_list(),
    };

    let token = TokenServices::new(db.clone())
        .create_access_token(client, &authentication)
        .await?;

    info!(
        "Issued access token to user {} via client {} with scope [{}]",
        authentication.user_name,
        authentication.client_id,
        format_scope(&authentication.scope)
    );

    Ok(token)
}

async fn refresh_token_grant(
    db: &DatabaseConnection,
    client: &ClientDetails,
    request: &TokenRequest,
) -> Result<IssuedToken, OAuth2Error> {
    let refresh_token = request
        .refresh_token
        .as_deref()
        .filter(|token| !token.is_empty())
        .ok_or_else(|| OAuth2Error::InvalidRequest("Missing refresh token".to_string()))?;

    let services = TokenServices::new(db.clone());
    let stored = services.read_refresh_token(client, refresh_token).await?;

    // The account may have been disabled or removed since the token was issued
    let user = load_user_by_username(db, &stored.user_name)
        .await?
        .filter(|user| user.enabled)
        .ok_or_else(|| {
            OAuth2Error::InvalidGrant(format!(
                "User account is no longer active: {}",
                stored.user_name
            ))
        })?;

    let token = services
        .refresh_access_token(
            client,
            refresh_token,
            &stored,
            request.requested_scope(),
            user.authority_list(),
        )
        .await?;

    info!(
        "Refreshed access token for user {} via client {}",
        stored.user_name, client.client_id
    );

    Ok(token)
}
