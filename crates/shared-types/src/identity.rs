//! Identity-provider port.
//!
//! Authorization gates verify a bearer credential into [`Claims`] before
//! any operation runs. The money logic itself never touches this port;
//! it receives the already-verified user id.

use crate::entities::{RankId, UserId};
use crate::errors::{CoreError, CoreResult};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Role claim on an identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Member,
    Admin,
}

/// Custom claims attached to an identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Claims {
    pub user_id: UserId,
    pub role: Role,
    pub active: bool,
    pub rank: Option<RankId>,
}

impl Claims {
    pub fn member(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Member,
            active: false,
            rank: None,
        }
    }

    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Admin,
            active: true,
            rank: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Auth-identity provider. Issues opaque bearer tokens and custom claims.
pub trait IdentityProvider: Send + Sync {
    /// Verify a bearer credential. Fails with `AuthenticationRequired`.
    fn verify_token(&self, token: &str) -> CoreResult<Claims>;

    /// Create an identity for a new user, returning its bearer token.
    fn create_identity(&self, claims: Claims) -> CoreResult<String>;

    /// Replace the custom claims for an existing identity.
    fn set_claims(&self, user_id: UserId, claims: Claims) -> CoreResult<()>;
}

/// In-memory identity provider for tests and local development.
#[derive(Default)]
pub struct StaticIdentityProvider {
    by_token: RwLock<HashMap<String, Claims>>,
    token_of: RwLock<HashMap<UserId, String>>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn verify_token(&self, token: &str) -> CoreResult<Claims> {
        let tokens = self.by_token.read().unwrap_or_else(|e| e.into_inner());
        tokens
            .get(token)
            .cloned()
            .ok_or_else(|| CoreError::AuthenticationRequired("unknown bearer token".into()))
    }

    fn create_identity(&self, claims: Claims) -> CoreResult<String> {
        let token = Uuid::new_v4().to_string();
        let user_id = claims.user_id;
        self.by_token
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(token.clone(), claims);
        self.token_of
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(user_id, token.clone());
        Ok(token)
    }

    fn set_claims(&self, user_id: UserId, claims: Claims) -> CoreResult<()> {
        let token_of = self.token_of.read().unwrap_or_else(|e| e.into_inner());
        let token = token_of
            .get(&user_id)
            .ok_or_else(|| CoreError::NotFound(format!("identity for user {user_id}")))?;
        self.by_token
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(token.clone(), claims);
        Ok(())
    }
}
