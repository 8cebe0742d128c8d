use std::collections::BTreeSet;

use chrono::{Duration, NaiveDateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr, SqlErr};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::{
    database::models::{oauth_access_token, oauth_refresh_token},
    oauth2::{
        client_details::ClientDetails,
        scope::{format_scope, parse_scope},
        OAuth2Authentication, OAuth2Error, TokenStore,
    },
};

const ISSUE_ATTEMPTS: usize = 3;

/// Tokens handed back by the token endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires
    pub expires_in: i64,
    /// Space-separated granted scopes
    pub scope: String,
}

/// Result of looking up an access token presented by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenLookup {
    Valid(oauth_access_token::Model),
    /// The token existed but had expired; it has been removed
    Expired,
    NotFound,
}

/// Issues, refreshes and resolves tokens over a [`TokenStore`].
///
/// Lifetimes come from the client the token is issued to. Refresh tokens are
/// reused across refreshes until they expire.
#[derive(Debug, Clone)]
pub struct TokenServices {
    store: TokenStore,
}

impl TokenServices {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            store: TokenStore::new(db),
        }
    }

    #[must_use]
    pub const fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Issues a fresh access/refresh token pair.
    ///
    /// Tokens previously issued for the same authentication are revoked. The
    /// revoke and both inserts commit together; a concurrent grant that wins
    /// the `authentication_id` index makes this one retry against its row.
    pub async fn create_access_token(
        &self,
        client: &ClientDetails,
        authentication: &OAuth2Authentication,
    ) -> Result<IssuedToken, DbErr> {
        let mut attempt = 1;
        loop {
            match self.try_create_access_token(client, authentication).await {
                Err(err) if attempt < ISSUE_ATTEMPTS && is_lost_race(&err) => {
                    debug!(
                        "Concurrent grant for user {} and client {}, retrying",
                        authentication.user_name, authentication.client_id
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_create_access_token(
        &self,
        client: &ClientDetails,
        authentication: &OAuth2Authentication,
    ) -> Result<IssuedToken, DbErr> {
        let txn = self.store.begin().await?;

        if let Some(existing) = txn.get_access_token(authentication).await? {
            debug!(
                "Replacing access token for user {} and client {}",
                authentication.user_name, authentication.client_id
            );
            if let Some(refresh_token_id) = &existing.refresh_token_id {
                txn.remove_refresh_token(refresh_token_id).await?;
            }
            txn.remove_access_token(&existing.token_id).await?;
        }

        let now = Utc::now().naive_utc();

        let refresh_token = new_token_value();
        txn.store_refresh_token(
            &refresh_token,
            authentication,
            expiry(now, client.refresh_token_validity_seconds),
        )
        .await?;

        let token = issue_access_token(&txn, client, authentication, refresh_token, now).await?;
        txn.commit().await?;

        Ok(token)
    }

    /// Checks a presented refresh token against the requesting client.
    ///
    /// Expired refresh tokens are removed before the grant is refused.
    pub async fn read_refresh_token(
        &self,
        client: &ClientDetails,
        refresh_token: &str,
    ) -> Result<oauth_refresh_token::Model, OAuth2Error> {
        let stored = self
            .store
            .read_refresh_token(refresh_token)
            .await?
            .ok_or_else(|| {
                OAuth2Error::InvalidGrant(format!("Invalid refresh token: {refresh_token}"))
            })?;

        if stored.client_id != client.client_id {
            return Err(OAuth2Error::InvalidGrant(format!(
                "Wrong client for this refresh token: {refresh_token}"
            )));
        }

        if stored.is_expired() {
            self.store.remove_refresh_token(&stored.token_id).await?;
            return Err(OAuth2Error::InvalidGrant(format!(
                "Invalid refresh token (expired): {refresh_token}"
            )));
        }

        Ok(stored)
    }

    /// Issues a new access token from a refresh token already validated by
    /// [`Self::read_refresh_token`].
    ///
    /// `requested_scope` may only narrow the originally granted scope.
    pub async fn refresh_access_token(
        &self,
        client: &ClientDetails,
        refresh_token: &str,
        stored: &oauth_refresh_token::Model,
        requested_scope: Option<BTreeSet<String>>,
        authorities: Vec<String>,
    ) -> Result<IssuedToken, OAuth2Error> {
        let original_scope = parse_scope(&stored.scope);

        let scope = match requested_scope {
            Some(requested) if !requested.is_empty() => {
                if !requested.is_subset(&original_scope) {
                    return Err(OAuth2Error::InvalidScope(format!(
                        "Unable to narrow the scope of the client authentication to [{}].",
                        format_scope(&requested)
                    )));
                }
                requested
            }
            _ => original_scope,
        };

        let authentication = OAuth2Authentication {
            user_name: stored.user_name.clone(),
            client_id: stored.client_id.clone(),
            scope,
            authorities,
        };

        let mut attempt = 1;
        loop {
            match self
                .try_refresh_access_token(client, refresh_token, stored, &authentication)
                .await
            {
                Err(err) if attempt < ISSUE_ATTEMPTS && is_lost_race(&err) => {
                    debug!(
                        "Concurrent refresh for user {} and client {}, retrying",
                        authentication.user_name, authentication.client_id
                    );
                    attempt += 1;
                }
                result => return Ok(result?),
            }
        }
    }

    async fn try_refresh_access_token(
        &self,
        client: &ClientDetails,
        refresh_token: &str,
        stored: &oauth_refresh_token::Model,
        authentication: &OAuth2Authentication,
    ) -> Result<IssuedToken, DbErr> {
        let txn = self.store.begin().await?;

        txn.remove_access_token_using_refresh_token(&stored.token_id)
            .await?;

        // A narrowed refresh may collide with a token issued directly for that scope
        if let Some(existing) = txn.get_access_token(authentication).await? {
            txn.remove_access_token(&existing.token_id).await?;
        }

        let now = Utc::now().naive_utc();
        let token = issue_access_token(
            &txn,
            client,
            authentication,
            refresh_token.to_string(),
            now,
        )
        .await?;
        txn.commit().await?;

        Ok(token)
    }

    /// Resolves a presented access token, removing it if it has expired.
    pub async fn load_access_token(&self, access_token: &str) -> Result<TokenLookup, DbErr> {
        match self.store.read_access_token(access_token).await? {
            None => Ok(TokenLookup::NotFound),
            Some(stored) if stored.is_expired() => {
                self.store.remove_access_token(&stored.token_id).await?;
                Ok(TokenLookup::Expired)
            }
            Some(stored) => Ok(TokenLookup::Valid(stored)),
        }
    }
}

async fn issue_access_token<C: ConnectionTrait>(
    store: &TokenStore<C>,
    client: &ClientDetails,
    authentication: &OAuth2Authentication,
    refresh_token: String,
    now: NaiveDateTime,
) -> Result<IssuedToken, DbErr> {
    let access_token = new_token_value();

    store
        .store_access_token(
            &access_token,
            authentication,
            Some(&refresh_token),
            expiry(now, client.access_token_validity_seconds),
        )
        .await?;

    Ok(IssuedToken {
        access_token,
        token_type: "bearer",
        refresh_token: Some(refresh_token),
        expires_in: client.access_token_validity_seconds,
        scope: format_scope(&authentication.scope),
    })
}

/// A concurrent grant committed a token for the same authentication first.
fn is_lost_race(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn new_token_value() -> String {
    Uuid::new_v4().to_string()
}

fn expiry(now: NaiveDateTime, validity_seconds: i64) -> NaiveDateTime {
    now + Duration::seconds(validity_seconds)
}
