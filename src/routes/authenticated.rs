use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Every route here receives a verified `AuthUser`: the auth middleware is
/// layered on this router in `create_router`. Ownership checks stay in the
/// handlers, per endpoint.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /job-application?email=...
        // The caller's own applications, enriched with job display fields.
        // 403 unless `email` equals the authenticated identity.
        .route("/job-application", get(handlers::list_my_applications))
}
