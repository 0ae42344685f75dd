//! Cookie-keyed session registry
//!
//! Sessions live in memory and are lost on restart. A request without a
//! known cookie gets a fresh session, which is stored and announced with
//! `Set-Cookie` only once it holds a user or a flash message. A session
//! emptied again (flash read, user signed out) is removed; its stale cookie
//! later opens a fresh session.

use std::collections::HashMap;
use std::convert::Infallible;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::gate::Session;

/// All live sessions, keyed by cookie token
#[derive(Clone)]
pub struct SessionRegistry {
    cookie_name: Arc<str>,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionRegistry {
    pub fn new(cookie_name: &str) -> Self {
        Self {
            cookie_name: Arc::from(cookie_name),
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Find the session named by the request's cookie, or start a new one
    pub async fn open(&self, headers: &HeaderMap) -> SessionHandle {
        if let Some(token) = self.token_from(headers) {
            if let Some(session) = self.sessions.read().await.get(&token) {
                return SessionHandle {
                    token,
                    fresh: false,
                    session: session.clone(),
                };
            }
        }

        SessionHandle {
            token: Uuid::new_v4().to_string(),
            fresh: true,
            session: Session::default(),
        }
    }

    fn token_from(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == &*self.cookie_name)
            .map(|(_, token)| token.to_string())
    }

    fn cookie_for(&self, token: &str) -> Option<HeaderValue> {
        HeaderValue::from_str(&format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            self.cookie_name, token
        ))
        .ok()
    }
}

/// The caller's session for the duration of one request.
///
/// Changes are kept only when the handle is passed to [`SessionHandle::commit`].
pub struct SessionHandle {
    token: String,
    fresh: bool,
    session: Session,
}

impl SessionHandle {
    /// Persist the session and attach the cookie to `response` when new.
    /// A session with nothing in it is never kept: a new one is dropped and
    /// a stored one is removed.
    pub async fn commit(self, registry: &SessionRegistry, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();
        let empty = self.session == Session::default();

        if self.fresh {
            if empty {
                return response;
            }
            if let Some(cookie) = registry.cookie_for(&self.token) {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
        }

        let mut sessions = registry.sessions.write().await;
        if empty {
            sessions.remove(&self.token);
        } else {
            sessions.insert(self.token, self.session);
        }
        response
    }
}

impl Deref for SessionHandle {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}

impl DerefMut for SessionHandle {
    fn deref_mut(&mut self) -> &mut Session {
        &mut self.session
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionHandle {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(state.sessions.open(&parts.headers).await)
    }
}
