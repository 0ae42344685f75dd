//! Application state shared by every request handler

use std::sync::Arc;

use crate::auth::credentials::CredentialSource;
use crate::auth::gate::SessionGate;
use crate::core::file_system::DocumentStore;
use crate::server::sessions::SessionRegistry;

/// Handles to the document store, the sign-in gate, and live sessions
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub gate: SessionGate,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(
        store: impl DocumentStore + 'static,
        credentials: impl CredentialSource + 'static,
        session_cookie: &str,
    ) -> Self {
        Self {
            store: Arc::new(store),
            gate: SessionGate::new(Arc::new(credentials)),
            sessions: SessionRegistry::new(session_cookie),
        }
    }
}
