// ============================================================================
// SESSION STORE - Bearer token in persistent storage
// ============================================================================
// The only shared mutable state between components. Injected, never global.
// ============================================================================

use std::rc::Rc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::routing::AppKind;
use crate::utils::constants::{ADMIN_ROLE, PSP_TOKEN_KEY, WEB_SHOP_TOKEN_KEY};
use crate::utils::jwt::{decode_claims, Claims};
use crate::utils::KeyValueStore;

/// Snapshot of a valid session
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub token: String,
    pub expiry: DateTime<Utc>,
    pub role: Option<String>,
}

pub struct SessionStore {
    storage: Rc<dyn KeyValueStore>,
    token_key: &'static str,
    clock_skew: chrono::Duration,
}

impl SessionStore {
    pub fn new(storage: Rc<dyn KeyValueStore>, token_key: &'static str, clock_skew: Duration) -> Self {
        Self {
            storage,
            token_key,
            clock_skew: chrono::Duration::from_std(clock_skew)
                .unwrap_or_else(|_| chrono::Duration::seconds(30)),
        }
    }

    /// Storage key of each front-end's token
    pub fn token_key_for(kind: AppKind) -> &'static str {
        match kind {
            AppKind::PspFront => PSP_TOKEN_KEY,
            AppKind::WebShop => WEB_SHOP_TOKEN_KEY,
        }
    }

    pub fn token_key(&self) -> &'static str {
        self.token_key
    }

    pub fn set_token(&self, token: &str) -> Result<()> {
        self.storage.set(self.token_key, token)?;
        log::info!("🔐 Session token stored");
        Ok(())
    }

    /// Stored token, if any. An empty string counts as absent.
    pub fn get_token(&self) -> Option<String> {
        self.storage
            .get(self.token_key)
            .filter(|token| !token.is_empty())
    }

    pub fn has_token(&self) -> bool {
        self.get_token().is_some()
    }

    pub fn clear(&self) {
        if self.get_token().is_some() {
            log::info!("🚪 Session cleared");
        }
        self.storage.remove(self.token_key);
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// A malformed, claim-less or expired token is cleared as a side effect
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let token = match self.get_token() {
            Some(token) => token,
            None => return false,
        };
        let live = decode_claims(&token)
            .map(|claims| claims.is_live_at(now, self.clock_skew))
            .unwrap_or(false);
        if !live {
            log::warn!("⚠️ Stored token is invalid or expired, clearing session");
            self.clear();
        }
        live
    }

    pub fn claims(&self) -> Option<Claims> {
        self.get_token().and_then(|token| decode_claims(&token))
    }

    pub fn role(&self) -> Option<String> {
        self.claims().and_then(|claims| claims.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role()
            .map(|role| role.eq_ignore_ascii_case(ADMIN_ROLE) || role == "ROLE_ADMIN")
            .unwrap_or(false)
    }

    /// Current session, validated first
    pub fn session(&self) -> Option<Session> {
        if !self.is_valid() {
            return None;
        }
        let token = self.get_token()?;
        let claims = decode_claims(&token)?;
        Some(Session {
            expiry: claims.expires_at()?,
            role: claims.role,
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::jwt::encode_test_token;
    use crate::utils::MemoryStorage;
    use serde_json::json;

    fn store() -> (Rc<MemoryStorage>, SessionStore) {
        let storage = Rc::new(MemoryStorage::new());
        let session = SessionStore::new(storage.clone(), "token", Duration::from_secs(30));
        (storage, session)
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn live_token_is_valid_and_kept() {
        let (storage, session) = store();
        let token = encode_test_token(&json!({"sub": "ana", "exp": 1_700_003_600i64, "role": "USER"}));
        session.set_token(&token).unwrap();

        assert!(session.is_valid_at(now()));
        assert_eq!(storage.get("token"), Some(token));
        assert_eq!(session.role().as_deref(), Some("USER"));
        assert!(!session.is_admin());
    }

    #[test]
    fn token_without_exp_is_invalid_and_cleared() {
        let (storage, session) = store();
        session
            .set_token(&encode_test_token(&json!({"sub": "ana"})))
            .unwrap();
        assert!(!session.is_valid_at(now()));
        assert!(storage.get("token").is_none());
    }

    #[test]
    fn malformed_tokens_are_invalid_and_cleared() {
        for token in ["abc", "a.b", "only.two", "x.y.z.w"] {
            let (storage, session) = store();
            session.set_token(token).unwrap();
            assert!(!session.is_valid_at(now()), "{} should be invalid", token);
            assert!(storage.is_empty(), "{} should be cleared", token);
        }
    }

    #[test]
    fn expiry_inside_skew_counts_as_expired() {
        let (_, session) = store();
        let token = encode_test_token(&json!({"exp": 1_700_000_010i64}));
        session.set_token(&token).unwrap();
        assert!(!session.is_valid_at(now()));
        assert!(!session.has_token());
    }

    #[test]
    fn admin_role_from_claims() {
        let (_, session) = store();
        session
            .set_token(&encode_test_token(&json!({"exp": 4_102_444_800i64, "role": "ADMIN"})))
            .unwrap();
        assert!(session.is_admin());
        let snapshot = session.session().unwrap();
        assert_eq!(snapshot.role.as_deref(), Some("ADMIN"));
        assert_eq!(snapshot.expiry.timestamp(), 4_102_444_800);
    }

    #[test]
    fn empty_stored_value_is_absent() {
        let (storage, session) = store();
        storage.set("token", "").unwrap();
        assert_eq!(session.get_token(), None);
        assert!(!session.is_valid());
    }
}
