//! Session context resolution.
//!
//! The submitter never derives identity itself: the shell application
//! resolves the persisted session once at its boundary into a
//! [`SessionContext`] and passes it down explicitly.
//!
//! The persisted record historically stored the user under either of
//! two keys, so resolution checks both in order. A missing token is a
//! logged-out session; a token without a user id is a corrupted one,
//! and the two cases stay distinct so the shell can tell them apart.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::types::BetError;

/// Resolved identity for one submission: who is betting, with what
/// bearer token.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: String,
    pub token: SecretString,
}

impl SessionContext {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: SecretString::new(token.into()),
        }
    }
}

/// User record as stored in the session file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: Option<String>,
    pub username: Option<String>,
}

/// On-disk session state. `user` is the current key; `shopUser` is the
/// legacy key older clients wrote, checked second.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersistedSession {
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserRecord>,
    #[serde(default, rename = "shopUser", skip_serializing_if = "Option::is_none")]
    pub shop_user: Option<UserRecord>,
}

impl PersistedSession {
    /// Resolve into a usable [`SessionContext`].
    ///
    /// No token at all means `NotAuthenticated`. A token whose user
    /// record yields no id under either key means `UserIdNotFound`.
    pub fn resolve(&self) -> Result<SessionContext, BetError> {
        let token = self
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(BetError::NotAuthenticated)?;

        let user_id = self
            .user
            .as_ref()
            .and_then(|u| u.id.clone())
            .or_else(|| self.shop_user.as_ref().and_then(|u| u.id.clone()))
            .filter(|id| !id.is_empty())
            .ok_or(BetError::UserIdNotFound)?;

        Ok(SessionContext {
            user_id,
            token: SecretString::new(token.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
