#[cfg(test)]
use crate::features::auth::models::{Principal, Role};

#[cfg(test)]
use axum::{extract::Request, middleware::Next, response::Response, Router};

#[cfg(test)]
use chrono::{Duration, Utc};

#[cfg(test)]
use uuid::Uuid;

#[cfg(test)]
pub fn test_principal(role: Role) -> Principal {
    let now = Utc::now();
    Principal {
        id: Uuid::new_v4(),
        role,
        issued_at: now,
        expires_at: now + Duration::hours(1),
    }
}

#[cfg(test)]
async fn inject_principal(principal: Principal, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(principal);
    next.run(request).await
}

/// Wraps a router so every request carries the given principal, standing in
/// for the real auth middleware in router-level tests.
#[cfg(test)]
pub fn with_principal(router: Router, principal: Principal) -> Router {
    router.layer(axum::middleware::from_fn(move |req, next| {
        inject_principal(principal.clone(), req, next)
    }))
}

#[cfg(test)]
pub fn with_role(router: Router, role: Role) -> Router {
    with_principal(router, test_principal(role))
}
