// src/api/identity.rs
//! Outbound identity: which bearer token and user agent a call carries.
//!
//! The transport asks its [`IdentityProvider`] for the current identity on
//! every attempt and tells it to rotate before a retry. Business logic never
//! sees tokens.

use crate::constants::USER_AGENTS;
use crate::error::AppError;
use crate::types::ApiKey;
use parking_lot::Mutex;
use rand::seq::IndexedRandom;

/// Credentials and client identification for one outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub token: ApiKey,
    pub user_agent: String,
}

impl Identity {
    /// Value of the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token.as_str())
    }
}

/// Source of outbound identities.
pub trait IdentityProvider: Send + Sync {
    /// Identity the next call should use.
    fn current(&self) -> Identity;

    /// Switches to a fresh identity and returns it.
    fn rotate(&self) -> Identity;
}

/// Picks tokens and user agents at random from fixed pools, never repeating
/// the previous choice when the pool offers an alternative.
pub struct RotatingIdentity {
    tokens: Vec<ApiKey>,
    user_agents: Vec<String>,
    current: Mutex<Identity>,
}

impl RotatingIdentity {
    pub fn new(tokens: Vec<ApiKey>) -> Result<Self, AppError> {
        Self::with_user_agents(
            tokens,
            USER_AGENTS.iter().map(|ua| ua.to_string()).collect(),
        )
    }

    pub fn with_user_agents(
        tokens: Vec<ApiKey>,
        user_agents: Vec<String>,
    ) -> Result<Self, AppError> {
        let mut rng = rand::rng();
        let token = tokens
            .choose(&mut rng)
            .cloned()
            .ok_or_else(|| AppError::MissingConfiguration("at least one API token".to_string()))?;
        let user_agent = user_agents
            .choose(&mut rng)
            .cloned()
            .ok_or_else(|| AppError::MissingConfiguration("at least one user agent".to_string()))?;

        Ok(Self {
            tokens,
            user_agents,
            current: Mutex::new(Identity { token, user_agent }),
        })
    }
}

/// Random element of `pool` other than `previous`, or `previous` itself when
/// the pool has nothing else to offer.
fn pick_other<T: Clone + PartialEq>(pool: &[T], previous: &T) -> T {
    let others: Vec<&T> = pool.iter().filter(|item| *item != previous).collect();
    others
        .choose(&mut rand::rng())
        .map(|item| (*item).clone())
        .unwrap_or_else(|| previous.clone())
}

impl IdentityProvider for RotatingIdentity {
    fn current(&self) -> Identity {
        self.current.lock().clone()
    }

    fn rotate(&self) -> Identity {
        let mut current = self.current.lock();
        *current = Identity {
            token: pick_other(&self.tokens, &current.token),
            user_agent: pick_other(&self.user_agents, &current.user_agent),
        };
        log::debug!("Rotated identity to token {}", current.token);
        current.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(suffix: &str) -> ApiKey {
        ApiKey::new(format!("secret_rotation_test_{}", suffix)).unwrap()
    }

    #[test]
    fn test_requires_a_token() {
        assert!(RotatingIdentity::new(Vec::new()).is_err());
    }

    #[test]
    fn test_rotation_switches_token_and_agent() {
        let provider = RotatingIdentity::with_user_agents(
            vec![key("a"), key("b")],
            vec!["agent-1".to_string(), "agent-2".to_string()],
        )
        .unwrap();

        for _ in 0..10 {
            let before = provider.current();
            let after = provider.rotate();
            assert_ne!(before.token, after.token);
            assert_ne!(before.user_agent, after.user_agent);
            assert_eq!(provider.current(), after);
        }
    }

    #[test]
    fn test_single_token_is_kept() {
        let provider = RotatingIdentity::new(vec![key("only")]).unwrap();
        let rotated = provider.rotate();
        assert_eq!(rotated.token, key("only"));
        assert_eq!(rotated.bearer(), "Bearer secret_rotation_test_only");
    }
}
