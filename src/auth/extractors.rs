use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::dto::{Claims, JwtKeys, TokenKind};
use crate::auth::repo;
use crate::auth::repo_types::User;
use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated identity behind a request: the user row, its role set,
/// and the claims of the presented token. Handlers pass this into service
/// calls explicitly; capability gates go through [`Actor::require_role`].
pub struct Actor {
    pub user: User,
    pub roles: Vec<String>,
    pub claims: Claims,
}

impl Actor {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn require_role(&self, role: &str) -> Result<(), ApiError> {
        if self.has_role(role) {
            Ok(())
        } else {
            warn!(user_id = %self.user.id, required = role, "capability check failed");
            Err(ApiError::Forbidden(
                "You do not have permission to access this method".to_string(),
            ))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header".to_string()))?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

        if claims.kind != TokenKind::Access {
            return Err(ApiError::Unauthorized("Access token required".to_string()));
        }

        if repo::is_token_revoked(&state.db, claims.jti)
            .await
            .map_err(ApiError::internal)?
        {
            return Err(ApiError::Unauthorized("Token has been invalidated".to_string()));
        }

        let user = User::find_by_id(&state.db, claims.sub)
            .await
            .map_err(ApiError::internal)?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

        let roles = User::roles(&state.db, user.id)
            .await
            .map_err(ApiError::internal)?;

        Ok(Actor {
            user,
            roles,
            claims,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn actor_with_roles(roles: &[&str]) -> Actor {
        use time::OffsetDateTime;
        Actor {
            user: User {
                id: Uuid::new_v4(),
                first_name: "Test".into(),
                last_name: "User".into(),
                gender: "other".into(),
                email: "test@example.com".into(),
                password_hash: "x".into(),
                image: None,
                date_of_birth: None,
                academic_year: None,
                account_status: "active".into(),
                profile_completed: false,
                created_at: OffsetDateTime::UNIX_EPOCH,
                updated_at: OffsetDateTime::UNIX_EPOCH,
            },
            roles: roles.iter().map(|r| r.to_string()).collect(),
            claims: Claims {
                sub: Uuid::new_v4(),
                exp: 0,
                iat: 0,
                iss: "test".into(),
                aud: "test".into(),
                jti: Uuid::new_v4(),
                kind: TokenKind::Access,
            },
        }
    }

    #[test]
    fn admin_passes_the_gate() {
        let actor = actor_with_roles(&["Admin", "Student"]);
        assert!(actor.require_role("Admin").is_ok());
    }

    #[test]
    fn non_admin_is_forbidden() {
        let actor = actor_with_roles(&["Student"]);
        let err = actor.require_role("Admin").unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
