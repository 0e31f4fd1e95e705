use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            InviteOutcome, InviteRequest, JwtKeys, LoginRequest, RefreshRequest, RegisterRequest,
            TokenResponse, UserProfile,
        },
        extractors::Actor,
        repo_types::{NewUser, User},
        services,
    },
    error::{ApiError, ApiResult, FieldErrors},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/user-profile", get(user_profile))
        .route("/auth/send-registration-invite", post(send_registration_invite))
}

async fn profile(db: &PgPool, user: User) -> ApiResult<UserProfile> {
    let roles = User::roles(db, user.id).await.map_err(ApiError::internal)?;
    Ok(UserProfile { user, roles })
}

fn token_response(keys: &JwtKeys, pair: services::TokenPair, user: UserProfile) -> TokenResponse {
    TokenResponse {
        access_token: pair.access,
        refresh_token: pair.refresh,
        token_type: "bearer",
        expires_in: keys.access_ttl.as_secs(),
        user,
    }
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    payload.email = payload.email.trim().to_lowercase();

    let keys = JwtKeys::from_ref(&state);
    let (pair, user) = services::attempt(&state.db, &keys, &payload.email, &payload.password).await?;

    info!(user_id = %user.id, "user logged in");
    let profile = profile(&state.db, user).await?;
    Ok(Json(token_response(&keys, pair, profile)))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    payload.email = payload.email.map(|e| e.trim().to_lowercase());

    let mut errors = services::validate_register(&payload);
    if let Some(email) = payload.email.as_deref() {
        if errors.0.get("email").is_none()
            && User::find_by_email(&state.db, email)
                .await
                .map_err(ApiError::internal)?
                .is_some()
        {
            warn!(email = %email, "email already registered");
            errors.add("email", "The email has already been taken");
        }
    }
    errors.into_result()?;

    // validate_register guarantees these are present
    let hash = services::hash_password(payload.password.as_deref().unwrap_or_default())
        .map_err(ApiError::internal)?;
    let user = User::create(
        &state.db,
        NewUser {
            first_name: payload.first_name.as_deref().unwrap_or_default(),
            last_name: payload.last_name.as_deref().unwrap_or_default(),
            gender: payload.gender.as_deref().unwrap_or_default(),
            email: payload.email.as_deref().unwrap_or_default(),
            password_hash: &hash,
            image: payload.image.as_deref(),
            date_of_birth: payload.date_of_birth.as_deref(),
            academic_year: payload.academic_year.as_deref(),
        },
    )
    .await
    .map_err(ApiError::internal)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    let profile = profile(&state.db, user).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User successfully registered",
            "user": profile,
        })),
    ))
}

#[instrument(skip(state, actor))]
pub async fn user_profile(
    State(state): State<AppState>,
    actor: Actor,
) -> ApiResult<Json<Value>> {
    let profile = profile(&state.db, actor.user).await?;
    Ok(Json(json!({ "user": profile })))
}

#[instrument(skip(state, actor))]
pub async fn logout(State(state): State<AppState>, actor: Actor) -> ApiResult<Json<Value>> {
    services::invalidate(&state.db, &actor.claims)
        .await
        .map_err(ApiError::internal)?;

    info!(user_id = %actor.user.id, "user logged out");
    Ok(Json(json!({ "message": "Successfully logged out" })))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let old_claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| ApiError::Unauthorized(format!("Could not refresh token: {}", e)))?;

    if crate::auth::repo::is_token_revoked(&state.db, old_claims.jti)
        .await
        .map_err(ApiError::internal)?
    {
        return Err(ApiError::Unauthorized("Token has been invalidated".to_string()));
    }

    let pair = services::issue_pair(&keys, old_claims.sub)?;

    // Best effort: the old refresh token staying valid until expiry is an
    // accepted risk, not a request failure.
    if let Err(e) = services::invalidate(&state.db, &old_claims).await {
        warn!(error = %e, "token could not be invalidated");
    }

    let user = User::find_by_id(&state.db, old_claims.sub)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

    let profile = profile(&state.db, user).await?;
    Ok(Json(token_response(&keys, pair, profile)))
}

#[instrument(skip(state, actor, payload))]
pub async fn send_registration_invite(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<InviteRequest>,
) -> ApiResult<Json<InviteOutcome>> {
    actor.require_role("Admin")?;

    let raw = match payload.invited_users.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => {
            let mut errors = FieldErrors::new();
            errors.add("invited_users", "The invited users field is required");
            return Err(ApiError::Validation(errors));
        }
    };

    let (valid, invalid_emails) = services::parse_invite_emails(raw);
    let existing_users = User::existing_emails(&state.db, &valid)
        .await
        .map_err(ApiError::internal)?;
    let invited_users = services::remove_existing(valid, &existing_users);

    if !invited_users.is_empty() {
        // Invite dispatch is a deliberate no-op; the triage result is the
        // whole deliverable for now.
        info!(count = invited_users.len(), "registration invites prepared");
    }

    Ok(Json(InviteOutcome {
        invited_users,
        invalid_emails,
        existing_users,
    }))
}
