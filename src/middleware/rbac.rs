// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::{ApiError, AppError},
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::UserRole,
};

/// Quais papéis passam por uma rota.
pub trait RoleGate: Send + Sync + 'static {
    fn allows(role: UserRole) -> bool;
}

/// Extrator guardião: rejeita com 403 quem não tem o papel exigido.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleGate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_request_parts(parts, state)
            .await
            .unwrap_or_default();

        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !T::allows(user.role) {
            tracing::warn!("⛔ '{}' ({}) barrado em {}", user.username, user.role.as_str(), parts.uri.path());
            return Err(AppError::Forbidden.to_api_error(&locale));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// PAPÉIS
// ---

/// Gerente ou Supervisor.
pub struct SupervisorOnly;
impl RoleGate for SupervisorOnly {
    fn allows(role: UserRole) -> bool {
        role.is_supervisor()
    }
}

pub type RequireSupervisor = RequireRole<SupervisorOnly>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;

    use crate::models::auth::User;

    fn parts_for(role: Option<UserRole>) -> Parts {
        let mut request = Request::builder().uri("/api/demands").body(()).unwrap();
        if let Some(role) = role {
            request.extensions_mut().insert(AuthenticatedUser(User {
                id: 1,
                username: "ana".into(),
                password_hash: String::new(),
                role,
                created_at: Utc::now(),
            }));
        }
        request.into_parts().0
    }

    #[tokio::test]
    async fn supervisors_and_managers_pass() {
        for role in [UserRole::Gerente, UserRole::Supervisor] {
            let mut parts = parts_for(Some(role));
            assert!(RequireSupervisor::from_request_parts(&mut parts, &()).await.is_ok());
        }
    }

    #[tokio::test]
    async fn technicians_are_forbidden() {
        let mut parts = parts_for(Some(UserRole::Tecnico));
        let err = RequireSupervisor::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn anonymous_requests_are_unauthorized() {
        let mut parts = parts_for(None);
        let err = RequireSupervisor::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
