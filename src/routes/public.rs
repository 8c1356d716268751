use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Public Router Module
///
/// Endpoints that need no credential.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /
        // Liveness text for load balancers and humans.
        .route("/", get(handlers::root))
        // POST /jwt
        // Issues the signed credential as the HTTP-only `token` cookie.
        .route("/jwt", post(handlers::issue_token))
        // POST /logout
        // Clears the `token` cookie.
        .route("/logout", post(handlers::logout))
        // GET /jobs?email=...  |  POST /jobs
        .route("/jobs", get(handlers::list_jobs).post(handlers::create_job))
        // GET /jobs/{id}
        .route("/jobs/{id}", get(handlers::get_job))
        // POST /job-application
        // Submits an application and bumps the job's applicationCount.
        // (GET on the same path is protected, see `authenticated`.)
        .route("/job-application", post(handlers::create_application))
        // GET /job-application/jobs/{job_id}
        // Applications for one job. Unrestricted; ownership is an open question.
        .route(
            "/job-application/jobs/{job_id}",
            get(handlers::list_applications_by_job),
        )
        // PATCH /job-application/{id}
        // Updates the review status of one application.
        .route(
            "/job-application/{id}",
            patch(handlers::update_application_status),
        )
}
