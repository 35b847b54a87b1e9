/// Session resolution
///
/// Two layers share the same token check:
///
/// - [`require_session`] guards signed-in routes. Without a valid session
///   the request never reaches the handler and the client is redirected to
///   the sign-in page.
/// - [`optional_session`] is for pages that personalise themselves when a
///   session exists. A missing or stale token is treated as anonymous.
///
/// Both put an [`AuthContext`] into the request extensions when a session
/// validates; handlers extract `AuthContext` or `Option<AuthContext>`.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use standup_shared::auth::middleware::{self as session, AuthContext};

use crate::{app::AppState, error::ApiError};

pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx = session::require_session(req.headers(), state.session_secret())?;

    tracing::Span::current().record("user_id", tracing::field::display(ctx.user_id));
    req.extensions_mut().insert::<AuthContext>(ctx);

    Ok(next.run(req).await)
}

pub async fn optional_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    match session::authenticate(req.headers(), state.session_secret()) {
        Ok(Some(ctx)) => {
            req.extensions_mut().insert::<AuthContext>(ctx);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid session on public route");
        }
    }

    next.run(req).await
}
