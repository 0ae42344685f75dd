//! Session state and the sign-in gate for mutating operations

use std::sync::{Arc, OnceLock};

use super::credentials::{CredentialSource, PasswordDigest};

/// Verified against when the username is unknown, so a miss costs as much
/// as a wrong password
fn placeholder_digest() -> Option<&'static PasswordDigest> {
    static DIGEST: OnceLock<Option<PasswordDigest>> = OnceLock::new();
    DIGEST
        .get_or_init(|| PasswordDigest::generate("").ok())
        .as_ref()
}

/// Per-visitor state carried between requests.
///
/// `SignedOut -> sign_in -> SignedIn -> sign_out -> SignedOut`; sessions do
/// not expire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    current_user: Option<String>,
    flash: Option<String>,
}

impl Session {
    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    /// Queue a message for the next page view
    pub fn flash(&mut self, message: impl Into<String>) {
        self.flash = Some(message.into());
    }

    /// Read and clear the queued message
    pub fn take_flash(&mut self) -> Option<String> {
        self.flash.take()
    }
}

/// A mutating operation was attempted without signing in
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("You must be signed in to do that.")]
pub struct Unauthorized;

/// Sign-in failed. Deliberately silent about which part was wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid credentials")]
pub struct InvalidCredentials;

/// Authorization decisions for mutating routes
#[derive(Clone)]
pub struct SessionGate {
    credentials: Arc<dyn CredentialSource>,
}

impl SessionGate {
    pub fn new(credentials: Arc<dyn CredentialSource>) -> Self {
        if placeholder_digest().is_none() {
            tracing::warn!("Could not hash placeholder password; unknown usernames fail fast");
        }
        Self { credentials }
    }

    /// True only for a registered username with its exact password
    pub fn verify_credentials(&self, username: &str, password: &str) -> bool {
        match self.credentials.lookup(username) {
            Some(digest) => digest.matches(password),
            None => {
                if let Some(placeholder) = placeholder_digest() {
                    let _ = placeholder.matches(password);
                }
                false
            }
        }
    }

    pub fn is_authenticated(&self, session: &Session) -> bool {
        session.current_user().is_some_and(|user| !user.is_empty())
    }

    pub fn require_authenticated(&self, session: &Session) -> Result<(), Unauthorized> {
        if self.is_authenticated(session) {
            Ok(())
        } else {
            Err(Unauthorized)
        }
    }

    /// Run `op` only for an authenticated session
    pub fn guard<T>(&self, session: &Session, op: impl FnOnce() -> T) -> Result<T, Unauthorized> {
        self.require_authenticated(session)?;
        Ok(op())
    }

    pub fn sign_in(
        &self,
        session: &mut Session,
        username: &str,
        password: &str,
    ) -> Result<(), InvalidCredentials> {
        if !self.verify_credentials(username, password) {
            tracing::warn!("Rejected sign-in attempt");
            return Err(InvalidCredentials);
        }

        tracing::info!("User signed in: {}", username);
        session.current_user = Some(username.to_string());
        Ok(())
    }

    pub fn sign_out(&self, session: &mut Session) {
        if let Some(user) = session.current_user.take() {
            tracing::info!("User signed out: {}", user);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::auth::credentials::{CredentialFile, PasswordDigest};
    use crate::core::document::RenderedDocument;
    use crate::core::error::{StoreError, StoreResult};
    use crate::core::file_system::DocumentStore;
    use crate::core::render::RendererRegistry;

    fn gate() -> SessionGate {
        let credentials: CredentialFile = [(
            "admin".to_string(),
            PasswordDigest::generate("secret").unwrap(),
        )]
        .into_iter()
        .collect();
        SessionGate::new(Arc::new(credentials))
    }

    fn signed_in(user: &str) -> Session {
        Session {
            current_user: Some(user.to_string()),
            flash: None,
        }
    }

    /// Counts every call; nothing is stored
    #[derive(Default)]
    struct CountingStore {
        calls: AtomicUsize,
        renderers: RendererRegistry,
    }

    impl CountingStore {
        fn hit<T>(&self, value: T) -> StoreResult<T> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(value)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl DocumentStore for CountingStore {
        fn list(&self) -> StoreResult<Vec<String>> {
            self.hit(Vec::new())
        }
        fn exists(&self, _name: &str) -> StoreResult<bool> {
            self.hit(false)
        }
        fn load(&self, name: &str) -> StoreResult<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::NotFound(name.to_string()))
        }
        fn create(&self, _name: &str, _content: &[u8]) -> StoreResult<()> {
            self.hit(())
        }
        fn write(&self, _name: &str, _content: &[u8]) -> StoreResult<()> {
            self.hit(())
        }
        fn delete(&self, _name: &str) -> StoreResult<()> {
            self.hit(())
        }
        fn renderers(&self) -> &RendererRegistry {
            &self.renderers
        }
        fn read(&self, _name: &str) -> StoreResult<RenderedDocument> {
            unreachable!("read is never guarded")
        }
    }

    #[test]
    fn test_verify_credentials() {
        let gate = gate();
        assert!(gate.verify_credentials("admin", "secret"));
        assert!(!gate.verify_credentials("admin", "wrong"));
        assert!(!gate.verify_credentials("unknown", "secret"));
        assert!(!gate.verify_credentials("", ""));
    }

    #[test]
    fn test_unknown_user_still_verifies_a_digest() {
        let gate = gate();
        assert!(placeholder_digest().is_some());
        // The placeholder's own password must not open an unknown account
        assert!(!gate.verify_credentials("ghost", ""));
        assert!(!gate.verify_credentials("ghost", "secret"));
    }

    #[test]
    fn test_authentication_state() {
        let gate = gate();
        assert!(!gate.is_authenticated(&Session::default()));
        assert!(!gate.is_authenticated(&signed_in("")));
        assert!(gate.is_authenticated(&signed_in("admin")));

        assert_eq!(gate.require_authenticated(&Session::default()), Err(Unauthorized));
        assert_eq!(gate.require_authenticated(&signed_in("admin")), Ok(()));
    }

    #[test]
    fn test_sign_in_and_out() {
        let gate = gate();
        let mut session = Session::default();

        assert_eq!(gate.sign_in(&mut session, "admin", "nope"), Err(InvalidCredentials));
        assert_eq!(session.current_user(), None);

        gate.sign_in(&mut session, "admin", "secret").unwrap();
        assert_eq!(session.current_user(), Some("admin"));

        gate.sign_out(&mut session);
        assert!(!gate.is_authenticated(&session));
    }

    #[test]
    fn test_flash_is_read_once() {
        let mut session = Session::default();
        session.flash("Welcome!");
        assert_eq!(session.take_flash().as_deref(), Some("Welcome!"));
        assert_eq!(session.take_flash(), None);
    }

    #[test]
    fn test_unauthenticated_mutations_never_reach_store() {
        let gate = gate();
        let store = CountingStore::default();
        let session = Session::default();

        assert!(gate.guard(&session, || store.create("a.txt", b"")).is_err());
        assert!(gate.guard(&session, || store.write("a.txt", b"x")).is_err());
        assert!(gate.guard(&session, || store.delete("a.txt")).is_err());
        assert!(gate.guard(&session, || store.load("a.txt")).is_err());
        assert_eq!(store.calls(), 0);
    }

    #[test]
    fn test_authenticated_mutations_reach_store() {
        let gate = gate();
        let store = CountingStore::default();
        let session = signed_in("admin");

        gate.guard(&session, || store.create("a.txt", b"")).unwrap().unwrap();
        gate.guard(&session, || store.delete("a.txt")).unwrap().unwrap();
        assert_eq!(store.calls(), 2);
    }
}
