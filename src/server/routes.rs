//! Request handlers
//!
//! Reads go straight to the store. Every mutation, and the edit form, goes
//! through [`SessionGate::guard`](crate::auth::gate::SessionGate::guard) so an
//! unauthenticated request never reaches the store.

use std::fmt::Display;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use super::sessions::SessionHandle;
use super::views;
use crate::app::AppState;
use crate::auth::gate::Unauthorized;
use crate::core::error::{StoreError, StoreResult};
use crate::core::file_system::DocumentStore;
use crate::core::validation::{NameRejection, NameValidator};

/// Build the router with all document and session endpoints
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/users/signin", get(sign_in_form).post(sign_in))
        .route("/users/signout", post(sign_out))
        .route("/new", get(new_document_form))
        .route("/create", post(create_document))
        .route("/:filename", get(view_document).post(update_document))
        .route("/:filename/edit", get(edit_document_form))
        .route("/:filename/delete", post(delete_document))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SignInForm {
    username: String,
    password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreateForm {
    filename: String,
    content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdateForm {
    content: String,
}

fn server_error(err: impl Display) -> Response {
    tracing::error!("Request failed: {}", err);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

async fn deny(state: &AppState, mut session: SessionHandle, denied: Unauthorized) -> Response {
    session.flash(denied.to_string());
    session
        .commit(&state.sessions, Redirect::to("/users/signin"))
        .await
}

/// Redirect home with a flash message
async fn back_home(state: &AppState, mut session: SessionHandle, message: String) -> Response {
    session.flash(message);
    session.commit(&state.sessions, Redirect::to("/")).await
}

async fn index(State(state): State<AppState>, mut session: SessionHandle) -> Response {
    let names = match state.store.list() {
        Ok(names) => names,
        Err(e) => return session.commit(&state.sessions, server_error(e)).await,
    };

    let message = session.take_flash();
    let page = views::index(&names, session.current_user(), message.as_deref());
    session.commit(&state.sessions, Html(page)).await
}

async fn sign_in_form(State(state): State<AppState>, mut session: SessionHandle) -> Response {
    let message = session.take_flash();
    let page = views::sign_in("", message.as_deref());
    session.commit(&state.sessions, Html(page)).await
}

async fn sign_in(
    State(state): State<AppState>,
    mut session: SessionHandle,
    Form(form): Form<SignInForm>,
) -> Response {
    match state.gate.sign_in(&mut session, &form.username, &form.password) {
        Ok(()) => back_home(&state, session, "Welcome!".to_string()).await,
        Err(invalid) => {
            let page = views::sign_in(&form.username, Some(&invalid.to_string()));
            session
                .commit(&state.sessions, (StatusCode::UNPROCESSABLE_ENTITY, Html(page)))
                .await
        }
    }
}

async fn sign_out(State(state): State<AppState>, mut session: SessionHandle) -> Response {
    state.gate.sign_out(&mut session);
    back_home(&state, session, "You have been signed out.".to_string()).await
}

async fn new_document_form(State(state): State<AppState>, session: SessionHandle) -> Response {
    match state.gate.require_authenticated(&session) {
        Ok(()) => {
            let page = views::new_document("", "", None);
            session.commit(&state.sessions, Html(page)).await
        }
        Err(denied) => deny(&state, session, denied).await,
    }
}

/// Validate then create; a lost race on the name reads as a rejection
fn create_checked(
    store: &dyn DocumentStore,
    name: &str,
    content: &[u8],
) -> StoreResult<Option<NameRejection>> {
    if let Some(rejection) = NameValidator::new(store).check(name)? {
        return Ok(Some(rejection));
    }

    match store.create(name, content) {
        Ok(()) => Ok(None),
        Err(StoreError::AlreadyExists(_)) => Ok(Some(NameRejection::AlreadyExists)),
        Err(e) => Err(e),
    }
}

async fn create_document(
    State(state): State<AppState>,
    session: SessionHandle,
    Form(form): Form<CreateForm>,
) -> Response {
    let outcome = state.gate.guard(&session, || {
        create_checked(state.store.as_ref(), &form.filename, form.content.as_bytes())
    });

    match outcome {
        Err(denied) => deny(&state, session, denied).await,
        Ok(Ok(None)) => back_home(&state, session, format!("{} was created.", form.filename)).await,
        Ok(Ok(Some(rejection))) => {
            let page = views::new_document(
                &form.filename,
                &form.content,
                Some(&rejection.to_string()),
            );
            session
                .commit(&state.sessions, (StatusCode::UNPROCESSABLE_ENTITY, Html(page)))
                .await
        }
        Ok(Err(e)) => session.commit(&state.sessions, server_error(e)).await,
    }
}

async fn view_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    session: SessionHandle,
) -> Response {
    match state.store.read(&filename) {
        Ok(document) => {
            let content_type = format!("{}; charset=utf-8", document.media_type);
            let response = ([(header::CONTENT_TYPE, content_type)], document.body);
            session.commit(&state.sessions, response).await
        }
        Err(StoreError::NotFound(_) | StoreError::InvalidName(_)) => {
            back_home(&state, session, format!("{filename} does not exist.")).await
        }
        Err(e @ StoreError::UnsupportedType { .. }) => {
            let response = (StatusCode::UNSUPPORTED_MEDIA_TYPE, e.to_string());
            session.commit(&state.sessions, response).await
        }
        Err(e) => session.commit(&state.sessions, server_error(e)).await,
    }
}

async fn edit_document_form(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    session: SessionHandle,
) -> Response {
    let loaded = match state.gate.guard(&session, || state.store.load(&filename)) {
        Ok(loaded) => loaded,
        Err(denied) => return deny(&state, session, denied).await,
    };

    match loaded {
        Ok(content) => {
            let page = views::edit_document(&filename, &String::from_utf8_lossy(&content));
            session.commit(&state.sessions, Html(page)).await
        }
        Err(StoreError::NotFound(_) | StoreError::InvalidName(_)) => {
            back_home(&state, session, format!("{filename} does not exist.")).await
        }
        Err(e) => session.commit(&state.sessions, server_error(e)).await,
    }
}

async fn update_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    session: SessionHandle,
    Form(form): Form<UpdateForm>,
) -> Response {
    let written = match state
        .gate
        .guard(&session, || state.store.write(&filename, form.content.as_bytes()))
    {
        Ok(written) => written,
        Err(denied) => return deny(&state, session, denied).await,
    };

    match written {
        Ok(()) => back_home(&state, session, format!("{filename} has been updated.")).await,
        Err(StoreError::InvalidName(_)) => {
            back_home(&state, session, NameRejection::Unsafe.to_string()).await
        }
        Err(e) => session.commit(&state.sessions, server_error(e)).await,
    }
}

async fn delete_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
    session: SessionHandle,
) -> Response {
    let deleted = match state.gate.guard(&session, || state.store.delete(&filename)) {
        Ok(deleted) => deleted,
        Err(denied) => return deny(&state, session, denied).await,
    };

    match deleted {
        Ok(()) => back_home(&state, session, format!("{filename} has been deleted.")).await,
        Err(StoreError::NotFound(_) | StoreError::InvalidName(_)) => {
            back_home(&state, session, format!("{filename} does not exist.")).await
        }
        Err(e) => session.commit(&state.sessions, server_error(e)).await,
    }
}
