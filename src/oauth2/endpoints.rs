use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    app::App,
    oauth2::{
        client_authentication::{authenticate_client, client_credentials},
        scope::parse_scope,
        token_granter::{self, TokenRequest},
        OAuth2Error, TokenLookup, TokenServices, CHECK_TOKEN_ENDPOINT_PATH, TOKEN_ENDPOINT_PATH,
    },
};

pub fn router() -> Router<App> {
    Router::new()
        .route(TOKEN_ENDPOINT_PATH, post(token))
        .route(
            CHECK_TOKEN_ENDPOINT_PATH,
            get(check_token_query).post(check_token_form),
        )
}

/// Token endpoint. Clients authenticate with HTTP Basic or form parameters.
async fn token(
    State(app): State<App>,
    headers: HeaderMap,
    Form(request): Form<TokenRequest>,
) -> Result<impl IntoResponse, OAuth2Error> {
    let credentials = client_credentials(
        &headers,
        request.client_id.as_deref(),
        request.client_secret.as_deref(),
    )?;
    let client = authenticate_client(&app.clients, &app.password_encoder, credentials).await?;

    let token = token_granter::grant(&app.db, &app.password_encoder, client, &request).await?;

    Ok((
        [(header::CACHE_CONTROL, "no-store"), (header::PRAGMA, "no-cache")],
        Json(token),
    ))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckTokenRequest {
    pub token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckTokenResponse {
    pub active: bool,
    /// Expiry as Unix seconds
    pub exp: i64,
    pub user_name: String,
    pub client_id: String,
    pub scope: Vec<String>,
    pub authorities: Vec<String>,
}

async fn check_token_query(
    State(app): State<App>,
    headers: HeaderMap,
    Query(request): Query<CheckTokenRequest>,
) -> Result<Json<CheckTokenResponse>, OAuth2Error> {
    check_token(&app, &headers, request).await.map(Json)
}

async fn check_token_form(
    State(app): State<App>,
    headers: HeaderMap,
    Form(request): Form<CheckTokenRequest>,
) -> Result<Json<CheckTokenResponse>, OAuth2Error> {
    check_token(&app, &headers, request).await.map(Json)
}

/// Token inspection; only authenticated clients may ask.
async fn check_token(
    app: &App,
    headers: &HeaderMap,
    request: CheckTokenRequest,
) -> Result<CheckTokenResponse, OAuth2Error> {
    let credentials = client_credentials(
        headers,
        request.client_id.as_deref(),
        request.client_secret.as_deref(),
    )?;
    let client = authenticate_client(&app.clients, &app.password_encoder, credentials).await?;

    let token = request
        .token
        .filter(|token| !token.is_empty())
        .ok_or_else(|| OAuth2Error::InvalidRequest("Missing token".to_string()))?;

    debug!("Client {} is checking a token", client.client_id);

    match TokenServices::new(app.db.clone())
        .load_access_token(&token)
        .await?
    {
        TokenLookup::NotFound => Err(OAuth2Error::InvalidToken(
            "Token was not recognised".to_string(),
        )),
        TokenLookup::Expired => Err(OAuth2Error::InvalidToken("Token has expired".to_string())),
        TokenLookup::Valid(stored) => Ok(CheckTokenResponse {
            active: true,
            exp: stored.expires_at.and_utc().timestamp(),
            scope: parse_scope(&stored.scope).into_iter().collect(),
            authorities: stored
                .authorities
                .split(',')
                .filter(|authority| !authority.is_empty())
                .map(str::to_string)
                .collect(),
            user_name: stored.user_name,
            client_id: stored.client_id,
        }),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{header, HeaderValue, StatusCode};
    use base64::{engine::general_purpose, Engine as _};
    use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
    use serde_json::Value;

    use super::*;
    use crate::{
        database::models::user_account,
        oauth2::TokenStore,
        tests::{setup_test, trusted_client_basic_auth, TestUtils},
    };

    fn basic_auth(client_id: &str, secret: &str) -> HeaderValue {
        HeaderValue::from_str(&format!(
            "Basic {}",
            general_purpose::STANDARD.encode(format!("{client_id}:{secret}"))
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn password_grant_issues_tokens() {
        let test = setup_test().await;

        let response = test
            .server
            .post("/login")
            .add_header(header::AUTHORIZATION, trusted_client_basic_auth())
            .form(&[
                ("grant_type", "password"),
                ("username", "alice"),
                ("password", "password"),
            ])
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.header(header::CACHE_CONTROL), "no-store");

        let body = response.json::<Value>();
        assert_eq!(body["token_type"], "bearer");
        assert_eq!(body["expires_in"], 10_000);
        assert_eq!(body["scope"], "read write");
        assert!(body["access_token"].as_str().is_some());
        assert!(body["refresh_token"].as_str().is_some());
    }

    #[tokio::test]
    async fn accepts_client_credentials_in_form() {
        let test = setup_test().await;

        let response = test
            .server
            .post("/login")
            .form(&[
                ("grant_type", "password"),
                ("username", "alice"),
                ("password", "password"),
                ("scope", "read"),
                ("client_id", "squeezer"),
                ("client_secret", "squeezer"),
            ])
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
        assert_eq!(response.json::<Value>()["scope"], "read");
    }

    #[tokio::test]
    async fn refresh_token_grant_issues_new_access_token() {
        let test = setup_test().await;
        let issued = test.obtain_token("alice", "password").await;
        let refresh_token = issued["refresh_token"].as_str().unwrap();

        let response = test
            .server
            .post("/login")
            .add_header(header::AUTHORIZATION, trusted_client_basic_auth())
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);

        let body = response.json::<Value>();
        assert_ne!(body["access_token"], issued["access_token"]);
        assert_eq!(body["refresh_token"], issued["refresh_token"]);
        assert_eq!(body["expires_in"], 10_000);
    }

    async fn refused_refresh(test: &TestUtils, refresh_token: &str) -> Value {
        let response = test
            .server
            .post("/login")
            .add_header(header::AUTHORIZATION, trusted_client_basic_auth())
            .form(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        response.json::<Value>()
    }

    #[tokio::test]
    async fn refresh_token_grant_rejects_disabled_user() {
        let test = setup_test().await;
        let issued = test.obtain_token("alice", "password").await;

        user_account::ActiveModel {
            username: Set("alice".to_string()),
            enabled: Set(false),
            ..Default::default()
        }
        .update(&test.db)
        .await
        .unwrap();

        let body = refused_refresh(&test, issued["refresh_token"].as_str().unwrap()).await;
        assert_eq!(body["error"], "invalid_grant");
        assert_eq!(
            body["error_description"],
            "User account is no longer active: alice"
        );
    }

    #[tokio::test]
    async fn refresh_token_grant_rejects_removed_user() {
        let test = setup_test().await;
        let issued = test.obtain_token("alice", "password").await;

        user_account::Entity::delete_by_id("alice".to_string())
            .exec(&test.db)
            .await
            .unwrap();

        let body = refused_refresh(&test, issued["refresh_token"].as_str().unwrap()).await;
        assert_eq!(body["error"], "invalid_grant");
    }

    #[tokio::test]
    async fn rejects_other_grant_types() {
        let test = setup_test().await;

        for (grant_type, expected_error) in [
            ("client_credentials", "unauthorized_client"),
            ("authorization_code", "unauthorized_client"),
            ("implicit", "unauthorized_client"),
            ("urn:ietf:params:oauth:grant-type:jwt-bearer", "unsupported_grant_type"),
        ] {
            let response = test
                .server
                .post("/login")
                .add_header(header::AUTHORIZATION, trusted_client_basic_auth())
                .form(&[("grant_type", grant_type)])
                .await;

            assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{grant_type}");
            assert_eq!(response.json::<Value>()["error"], expected_error, "{grant_type}");
        }
    }

    #[tokio::test]
    async fn requires_client_authentication() {
        let test = setup_test().await;

        let response = test
            .server
            .post("/login")
            .form(&[
                ("grant_type", "password"),
                ("username", "alice"),
                ("password", "password"),
            ])
            .await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["error"], "unauthorized");
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn rejects_wrong_client_secret() {
        let test = setup_test().await;

        let response = test
            .server
            .post("/login")
            .add_header(header::AUTHORIZATION, basic_auth("squeezer", "squeezed"))
            .form(&[
                ("grant_type", "password"),
                ("username", "alice"),
                ("password", "password"),
            ])
            .await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.json::<Value>()["error"], "invalid_client");
    }

    #[tokio::test]
    async fn rejects_bad_user_credentials() {
        let test = setup_test().await;

        for (username, password) in [("alice", "wrong"), ("bob", "password"), ("nobody", "x")] {
            let response = test
                .server
                .post("/login")
                .add_header(header::AUTHORIZATION, trusted_client_basic_auth())
                .form(&[
                    ("grant_type", "password"),
                    ("username", username),
                    ("password", password),
                ])
                .await;

            assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "{username}");
            let body = response.json::<Value>();
            assert_eq!(body["error"], "invalid_grant");
            assert_eq!(body["error_description"], "Bad credentials");
        }
    }

    #[tokio::test]
    async fn rejects_unregistered_scope() {
        let test = setup_test().await;

        let response = test
            .server
            .post("/login")
            .add_header(header::AUTHORIZATION, trusted_client_basic_auth())
            .form(&[
                ("grant_type", "password"),
                ("username", "alice"),
                ("password", "password"),
                ("scope", "read admin"),
            ])
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "invalid_scope");
    }

    #[tokio::test]
    async fn missing_grant_type_is_invalid_request() {
        let test = setup_test().await;

        let response = test
            .server
            .post("/login")
            .add_header(header::AUTHORIZATION, trusted_client_basic_auth())
            .form(&[("username", "alice")])
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "invalid_request");
    }

    #[tokio::test]
    async fn unknown_refresh_token_is_invalid_grant() {
        let test = setup_test().await;

        let response = test
            .server
            .post("/login")
            .add_header(header::AUTHORIZATION, trusted_client_basic_auth())
            .form(&[("grant_type", "refresh_token"), ("refresh_token", "made-up")])
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "invalid_grant");
    }

    #[tokio::test]
    async fn check_token_describes_live_token() {
        let test = setup_test().await;
        let issued = test.obtain_token("alice", "password").await;
        let access_token = issued["access_token"].as_str().unwrap();

        let response = test
            .server
            .post("/oauth/check_token")
            .add_header(header::AUTHORIZATION, trusted_client_basic_auth())
            .form(&[("token", access_token)])
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);

        let body = response.json::<CheckTokenResponse>();
        assert!(body.active);
        assert_eq!(body.user_name, "alice");
        assert_eq!(body.client_id, "squeezer");
        assert_eq!(body.scope, vec!["read", "write"]);
        assert_eq!(body.authorities, vec!["ROLE_USER"]);

        let remaining = body.exp - chrono::Utc::now().timestamp();
        assert!(remaining > 9_900 && remaining <= 10_000, "{remaining}");
    }

    #[tokio::test]
    async fn check_token_accepts_query_parameter() {
        let test = setup_test().await;
        let issued = test.obtain_token("alice", "password").await;
        let access_token = issued["access_token"].as_str().unwrap();

        let response = test
            .server
            .get("/oauth/check_token")
            .add_query_param("token", access_token)
            .add_header(header::AUTHORIZATION, trusted_client_basic_auth())
            .await;

        assert_eq!(response.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn check_token_requires_authenticated_client() {
        let test = setup_test().await;
        let issued = test.obtain_token("alice", "password").await;
        let access_token = issued["access_token"].as_str().unwrap();

        let response = test
            .server
            .post("/oauth/check_token")
            .form(&[("token", access_token)])
            .await;

        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn check_token_rejects_unknown_and_expired_tokens() {
        let test = setup_test().await;

        let unknown = test
            .server
            .post("/oauth/check_token")
            .add_header(header::AUTHORIZATION, trusted_client_basic_auth())
            .form(&[("token", "not-a-token")])
            .await;
        assert_eq!(unknown.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(unknown.json::<Value>()["error_description"], "Token was not recognised");

        let issued = test.obtain_token("alice", "password").await;
        let access_token = issued["access_token"].as_str().unwrap();

        let stored = TokenStore::new(test.db.clone())
            .read_access_token(access_token)
            .await
            .unwrap()
            .unwrap();
        let mut expired = stored.into_active_model();
        expired.expires_at = Set(chrono::Utc::now().naive_utc() - chrono::Duration::seconds(1));
        expired.update(&test.db).await.unwrap();

        let response = test
            .server
            .post("/oauth/check_token")
            .add_header(header::AUTHORIZATION, trusted_client_basic_auth())
            .form(&[("token", access_token)])
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body = response.json::<Value>();
        assert_eq!(body["error"], "invalid_token");
        assert_eq!(body["error_description"], "Token has expired");
    }
}
