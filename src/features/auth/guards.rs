//! Authorization guards.
//!
//! Role checks are flat set membership: a guard carries an explicit list of
//! allowed roles and a principal passes only when its role is in that list.
//! Administrators get no implicit pass here; endpoints that should admit
//! them list `Administrator` alongside the other roles.
//!
//! Ownership checks are the one place administrators do bypass: a resource
//! may be touched by its owner or by an administrator. Ownership runs after
//! the role check when an endpoint uses both.
//!
//! Both checks are pure decisions over the principal: no I/O, no retries,
//! and a denial must leave no side effects behind.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::core::error::AppError;
use crate::features::auth::models::{Principal, Role};

/// Flat role membership check. An empty `allowed` list means the endpoint
/// only needs authentication, so every principal passes.
pub fn authorize_roles(principal: &Principal, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.is_empty() || allowed.contains(&principal.role) {
        return Ok(());
    }

    Err(AppError::Forbidden(
        "Insufficient role for this operation".to_string(),
    ))
}

/// Owner-or-administrator check. A missing principal is rejected outright:
/// this guard sits behind the auth middleware, so `None` here means a wiring
/// mistake and must fail closed. The denial message never says whether the
/// resource exists.
pub fn authorize_ownership(principal: Option<&Principal>, owner_id: Uuid) -> Result<(), AppError> {
    let Some(principal) = principal else {
        return Err(AppError::Forbidden("Access denied".to_string()));
    };

    if principal.id == owner_id || principal.is_administrator() {
        return Ok(());
    }

    Err(AppError::Forbidden("Access denied".to_string()))
}

fn principal_from_parts(parts: &mut Parts) -> Result<Principal, AppError> {
    parts
        .extensions
        .get::<Principal>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
}

/// Guard for administrator-only endpoints.
///
/// # Example
/// ```ignore
/// pub async fn handler(RequireAdmin(principal): RequireAdmin) { ... }
/// ```
pub struct RequireAdmin(pub Principal);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = principal_from_parts(parts)?;
        authorize_roles(&principal, &[Role::Administrator])?;
        Ok(RequireAdmin(principal))
    }
}

/// Guard for patient-only endpoints (booking, paying, reviewing).
/// Administrators are deliberately not admitted; they act on these
/// resources through the admin endpoints instead.
pub struct RequirePatient(pub Principal);

impl<S> FromRequestParts<S> for RequirePatient
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = principal_from_parts(parts)?;
        authorize_roles(&principal, &[Role::Patient])?;
        Ok(RequirePatient(principal))
    }
}

/// Guard for psychologist-only endpoints (profile management, clinical
/// records).
pub struct RequirePsychologist(pub Principal);

impl<S> FromRequestParts<S> for RequirePsychologist
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = principal_from_parts(parts)?;
        authorize_roles(&principal, &[Role::Psychologist])?;
        Ok(RequirePsychologist(principal))
    }
}

/// Guard for endpoints shared between psychologists and administrators,
/// such as profile updates and appointment state changes.
pub struct RequirePsychologistOrAdmin(pub Principal);

impl<S> FromRequestParts<S> for RequirePsychologistOrAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = principal_from_parts(parts)?;
        authorize_roles(&principal, &[Role::Psychologist, Role::Administrator])?;
        Ok(RequirePsychologistOrAdmin(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{test_principal, with_role};
    use axum::{http::StatusCode, routing::get, Router};
    use axum_test::TestServer;

    async fn admin_only(RequireAdmin(_): RequireAdmin) -> &'static str {
        "ok"
    }

    async fn patient_only(RequirePatient(_): RequirePatient) -> &'static str {
        "ok"
    }

    fn guarded_router() -> Router {
        Router::new()
            .route("/admin", get(admin_only))
            .route("/patient", get(patient_only))
    }

    #[tokio::test]
    async fn test_request_without_principal_is_401() {
        let server = TestServer::new(guarded_router()).unwrap();
        let res = server.get("/admin").await;
        res.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_role_is_403() {
        let server =
            TestServer::new(with_role(guarded_router(), Role::Patient)).unwrap();
        server.get("/patient").await.assert_status_ok();
        server
            .get("/admin")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_is_rejected_from_patient_route() {
        // No hierarchy: the admin role does not satisfy a patient-only guard.
        let server =
            TestServer::new(with_role(guarded_router(), Role::Administrator)).unwrap();
        server.get("/admin").await.assert_status_ok();
        server
            .get("/patient")
            .await
            .assert_status(StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_matching_role_is_allowed() {
        let patient = test_principal(Role::Patient);
        assert!(authorize_roles(&patient, &[Role::Patient]).is_ok());
        assert!(authorize_roles(&patient, &[Role::Patient, Role::Administrator]).is_ok());
    }

    #[test]
    fn test_non_matching_role_is_forbidden() {
        let patient = test_principal(Role::Patient);
        let result = authorize_roles(&patient, &[Role::Psychologist]);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_administrator_is_not_implicitly_allowed() {
        // Flat membership: admin fails any check that does not list it.
        let admin = test_principal(Role::Administrator);
        assert!(matches!(
            authorize_roles(&admin, &[Role::Patient]),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            authorize_roles(&admin, &[Role::Patient, Role::Psychologist]),
            Err(AppError::Forbidden(_))
        ));
        assert!(authorize_roles(&admin, &[Role::Psychologist, Role::Administrator]).is_ok());
    }

    #[test]
    fn test_empty_role_list_allows_any_principal() {
        assert!(authorize_roles(&test_principal(Role::Patient), &[]).is_ok());
        assert!(authorize_roles(&test_principal(Role::Administrator), &[]).is_ok());
    }

    #[test]
    fn test_role_check_is_idempotent() {
        let patient = test_principal(Role::Patient);
        for _ in 0..3 {
            assert!(authorize_roles(&patient, &[Role::Patient]).is_ok());
            assert!(authorize_roles(&patient, &[Role::Psychologist]).is_err());
        }
    }

    #[test]
    fn test_owner_may_access_own_resource() {
        let owner = test_principal(Role::Patient);
        assert!(authorize_ownership(Some(&owner), owner.id).is_ok());
    }

    #[test]
    fn test_administrator_may_access_any_resource() {
        let admin = test_principal(Role::Administrator);
        assert!(authorize_ownership(Some(&admin), Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_non_owner_is_forbidden() {
        let other = test_principal(Role::Psychologist);
        let result = authorize_ownership(Some(&other), Uuid::new_v4());
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_missing_principal_fails_closed() {
        let result = authorize_ownership(None, Uuid::new_v4());
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_ownership_denial_does_not_reveal_the_target() {
        // Same message no matter which resource was asked for.
        let intruder = test_principal(Role::Patient);
        let first = authorize_ownership(Some(&intruder), Uuid::new_v4()).unwrap_err();
        let second = authorize_ownership(Some(&intruder), Uuid::new_v4()).unwrap_err();
        assert_eq!(first.to_string(), second.to_string());
    }
}
