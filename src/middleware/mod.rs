use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    AppState,
    error::AppError,
    utils::{jwt, session},
};

/// Lets a request through only with a valid admin session, from the bearer header or the cookie.
pub async fn session_guard(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let claims = session::token_from_headers(req.headers())
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
        .and_then(|token| jwt::verify_token(&state.auth.jwt_secret, &token));

    match claims {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) if session::wants_html(req.headers()) => {
            tracing::debug!("Redirecting to login: {}", e);
            Redirect::to("/login").into_response()
        }
        Err(e) => e.into_response(),
    }
}
