//! Account identity, roles and JWT claims

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Role granted to an account by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Borrower,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Role::Admin => "admin",
            Role::Borrower => "borrower",
        };
        write!(f, "{}", label)
    }
}

/// Caller of an engine operation, as vouched for by the auth layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Opaque account identifier (wallet address, user handle...)
    pub account: String,
    pub role: Role,
}

impl Actor {
    pub fn admin(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            role: Role::Admin,
        }
    }

    pub fn borrower(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            role: Role::Borrower,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Require admin privileges for `action`
    pub fn require_admin(&self, action: &str) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Unauthorized(format!(
                "Administrator privileges required to {}",
                action
            )))
        }
    }

    /// Admins may see everything, other accounts only their own data
    pub fn require_self_or_admin(&self, account: &str) -> Result<(), AppError> {
        if self.is_admin() || self.account == account {
            Ok(())
        } else {
            Err(AppError::Unauthorized(format!(
                "Account {} cannot access data of {}",
                self.account, account
            )))
        }
    }
}

/// JWT Claims for authenticated accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountClaims {
    /// Account identifier
    pub sub: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl AccountClaims {
    pub fn new(account: impl Into<String>, role: Role, ttl_hours: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: account.into(),
            role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(ttl_hours)).timestamp(),
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn actor(&self) -> Actor {
        Actor {
            account: self.sub.clone(),
            role: self.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_keeps_identity() {
        let claims = AccountClaims::new("0xabc", Role::Borrower, 1);
        let token = claims.create_token("secret").unwrap();
        let parsed = AccountClaims::from_token(&token, "secret").unwrap();
        assert_eq!(parsed.actor(), Actor::borrower("0xabc"));
    }

    #[test]
    fn token_signed_with_other_secret_is_refused() {
        let token = AccountClaims::new("0xabc", Role::Admin, 1)
            .create_token("secret")
            .unwrap();
        assert!(AccountClaims::from_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_refused() {
        let token = AccountClaims::new("0xabc", Role::Admin, -2)
            .create_token("secret")
            .unwrap();
        assert!(AccountClaims::from_token(&token, "secret").is_err());
    }

    #[test]
    fn role_checks() {
        let admin = Actor::admin("root");
        let alice = Actor::borrower("alice");
        assert!(admin.require_admin("approve").is_ok());
        assert!(matches!(
            alice.require_admin("approve"),
            Err(AppError::Unauthorized(_))
        ));
        assert!(alice.require_self_or_admin("alice").is_ok());
        assert!(admin.require_self_or_admin("alice").is_ok());
        assert!(alice.require_self_or_admin("bob").is_err());
    }
}
