use axum::{
    Extension, Json,
    extract::State,
    response::{AppendHeaders, IntoResponse, Redirect},
};
use http::header::SET_COOKIE;

use crate::{
    AppState,
    error::{AppError, Result},
    models::{AuthResponse, LoginRequest, SessionResponse},
    queries::admin_queries,
    utils::{
        jwt::{self, Claims},
        session,
    },
};

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse> {
    let admin = admin_queries::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let is_valid = bcrypt::verify(&payload.password, &admin.password)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {}", e)))?;

    if !is_valid {
        return Err(AppError::Unauthorized("Invalid email or password".to_string()));
    }

    let token = jwt::generate_token(
        &state.auth.jwt_secret,
        admin.id,
        &admin.email,
        state.auth.session_ttl_hours,
    )?;

    let cookie = session::session_cookie(
        &token,
        state.auth.session_ttl_hours * 3600,
        state.auth.secure_cookies,
    );

    tracing::info!("Admin {} signed in", admin.email);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie.to_string())]),
        Json(AuthResponse { token }),
    ))
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        AppendHeaders([(
            SET_COOKIE,
            session::clear_session_cookie(state.auth.secure_cookies).to_string(),
        )]),
        Redirect::to("/login"),
    )
}

pub async fn current_session(Extension(claims): Extension<Claims>) -> Result<Json<SessionResponse>> {
    Ok(Json(SessionResponse {
        admin_id: claims.admin_id()?,
        email: claims.email,
        expires_at: claims.exp,
    }))
}
