use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{TokenGenerator, parse_token};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Account, Role, Session};

const MAX_LOOKUP_RETRIES: u32 = 3;

/// Who is acting during one request. Handed to every operation that writes
/// to the operation log.
#[derive(Debug, Clone, Serialize)]
pub struct SessionContext {
    #[serde(skip)]
    pub session: Session,
    pub account: Account,
}

impl SessionContext {
    #[must_use]
    pub fn username(&self) -> &str {
        &self.account.username
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.account.role
    }
}

/// Checks credentials and opens a session. Returns the context and the raw
/// bearer token, which is not stored anywhere.
pub fn login(
    store: &dyn Store,
    generator: &TokenGenerator,
    username: &str,
    password: &str,
    ttl: Duration,
) -> Result<(SessionContext, String)> {
    let account = store
        .get_account_by_username(username)?
        .ok_or(Error::Unauthorized)?;

    if !generator.verify(password, &account.password_hash)? {
        return Err(Error::Unauthorized);
    }

    for _ in 0..MAX_LOOKUP_RETRIES {
        let (raw_token, lookup, hash) = generator.generate()?;
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            account_id: account.id,
            token_lookup: lookup,
            token_hash: hash,
            created_at: now,
            expires_at: now + ttl,
        };

        match store.create_session(&session) {
            Ok(()) => {
                store.append_log(&account.username, "Logged in")?;
                return Ok((SessionContext { session, account }, raw_token));
            }
            Err(Error::SessionLookupCollision) => continue,
            Err(e) => return Err(e),
        }
    }

    Err(Error::SessionLookupCollision)
}

/// Resolves a raw bearer token to its live session.
pub fn authenticate(
    store: &dyn Store,
    generator: &TokenGenerator,
    raw_token: &str,
) -> Result<SessionContext> {
    let (lookup, _secret) = parse_token(raw_token).map_err(|_| Error::Unauthorized)?;

    let session = store
        .get_session_by_lookup(&lookup)?
        .ok_or(Error::Unauthorized)?;

    if !generator.verify(raw_token, &session.token_hash)? {
        return Err(Error::Unauthorized);
    }

    if session.expires_at < Utc::now() {
        if let Err(e) = store.delete_session(&session.id) {
            tracing::warn!("Failed to delete expired session: {e}");
        }
        return Err(Error::SessionExpired);
    }

    let account = store
        .get_account(session.account_id)?
        .ok_or(Error::Unauthorized)?;

    Ok(SessionContext { session, account })
}

pub fn logout(store: &dyn Store, ctx: &SessionContext) -> Result<()> {
    store.delete_session(&ctx.session.id)?;
    store.append_log(ctx.username(), "Logged out")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SqliteStore, TokenGenerator) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let generator = TokenGenerator::new();
        let hash = generator.hash("user123").unwrap();
        store.create_account("clerk", &hash, Role::Staff).unwrap();
        (temp, store, generator)
    }

    #[test]
    fn test_login_then_authenticate() {
        let (_temp, store, generator) = setup();

        let (ctx, token) = login(&store, &generator, "clerk", "user123", Duration::hours(1)).unwrap();
        let resolved = authenticate(&store, &generator, &token).unwrap();

        assert_eq!(resolved.session.id, ctx.session.id);
        assert_eq!(resolved.username(), "clerk");
        assert_eq!(resolved.role(), Role::Staff);
        assert_eq!(store.list_logs(1).unwrap()[0].action, "Logged in");
    }

    #[test]
    fn test_login_rejects_wrong_password_and_unknown_user() {
        let (_temp, store, generator) = setup();

        let wrong = login(&store, &generator, "clerk", "nope", Duration::hours(1));
        assert!(matches!(wrong, Err(Error::Unauthorized)));

        let unknown = login(&store, &generator, "ghost", "user123", Duration::hours(1));
        assert!(matches!(unknown, Err(Error::Unauthorized)));
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let (_temp, store, generator) = setup();
        let (_, token) = login(&store, &generator, "clerk", "user123", Duration::hours(-1)).unwrap();

        let result = authenticate(&store, &generator, &token);
        assert!(matches!(result, Err(Error::SessionExpired)));
    }

    #[test]
    fn test_logout_revokes_token() {
        let (_temp, store, generator) = setup();
        let (ctx, token) = login(&store, &generator, "clerk", "user123", Duration::hours(1)).unwrap();

        logout(&store, &ctx).unwrap();

        let result = authenticate(&store, &generator, &token);
        assert!(matches!(result, Err(Error::Unauthorized)));
    }

    #[test]
    fn test_malformed_token_is_unauthorized() {
        let (_temp, store, generator) = setup();
        let result = authenticate(&store, &generator, "Bearer nonsense");
        assert!(matches!(result, Err(Error::Unauthorized)));
    }
}
