use std::collections::BTreeSet;

use sha2::{Digest, Sha256};

use crate::oauth2::scope::format_scope;

/// The user, client and scope a token is issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth2Authentication {
    pub user_name: String,
    pub client_id: String,
    pub scope: BTreeSet<String>,
    pub authorities: Vec<String>,
}

impl OAuth2Authentication {
    /// Key identifying this authentication in the token store.
    ///
    /// Authorities are left out so a token survives role changes until it expires.
    #[must_use]
    pub fn authentication_key(&self) -> String {
        digest(&format!(
            "username={}&client_id={}&scope={}",
            self.user_name,
            self.client_id,
            format_scope(&self.scope)
        ))
    }
}

/// Hex-encoded SHA-256 digest
pub fn digest(value: &str) -> String {
    format!("{:x}", Sha256::digest(value.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth2::scope::parse_scope;

    fn authentication(scope: &str) -> OAuth2Authentication {
        OAuth2Authentication {
            user_name: "alice".to_string(),
            client_id: "squeezer".to_string(),
            scope: parse_scope(scope),
            authorities: vec!["ROLE_USER".to_string()],
        }
    }

    #[test]
    fn key_ignores_scope_order_and_authorities() {
        let mut admin = authentication("write read");
        admin.authorities.push("ROLE_ADMIN".to_string());

        assert_eq!(
            authentication("read write").authentication_key(),
            admin.authentication_key()
        );
    }

    #[test]
    fn key_depends_on_scope() {
        assert_ne!(
            authentication("read").authentication_key(),
            authentication("read write").authentication_key()
        );
    }

    #[test]
    fn digest_is_hex_sha256() {
        assert_eq!(
            digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
