use crate::{
    AppState,
    auth::{AuthUser, TOKEN_COOKIE},
    config::AppConfig,
    error::{ApiError, ApiResult},
    models::{
        AuthResponse, CreateApplicationRequest, CreateJobRequest, EnrichedApplication,
        IdentityClaim, InsertResult, Job, JobApplication, UpdateResult, UpdateStatusRequest,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// JobFilter
///
/// Query parameters of `GET /jobs`.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct JobFilter {
    /// Only return jobs posted by this owner.
    pub email: Option<String>,
}

/// ApplicantFilter
///
/// Query parameters of `GET /job-application`. `email` must equal the
/// authenticated identity.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct ApplicantFilter {
    pub email: Option<String>,
}

/// Parses a store identifier taken from the path. Malformed input is a client
/// error, never a server fault.
fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidIdentifier(raw.to_string()))
}

/// Builds the credential cookie. Script access is always blocked; `Secure`
/// follows configuration, and cross-site delivery is only allowed when secure.
fn session_cookie(config: &AppConfig, token: String) -> Cookie<'static> {
    let same_site = if config.cookie_secure {
        SameSite::None
    } else {
        SameSite::Lax
    };

    Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .secure(config.cookie_secure)
        .same_site(same_site)
        .path("/")
        .build()
}

// --- Auth Handlers ---

/// issue_token
///
/// [Public Route] Signs a 6-hour credential for the posted identity and sets it
/// as the HTTP-only `token` cookie.
#[utoipa::path(
    post,
    path = "/jwt",
    request_body = IdentityClaim,
    responses((status = 200, description = "Cookie set", body = AuthResponse))
)]
pub async fn issue_token(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(claim): Json<IdentityClaim>,
) -> ApiResult<(CookieJar, Json<AuthResponse>)> {
    let token = state.tokens.issue(&claim.email)?;
    tracing::info!(email = %claim.email, "credential issued");

    let jar = jar.add(session_cookie(&state.config, token));
    Ok((jar, Json(AuthResponse { success: true })))
}

/// logout
///
/// [Public Route] Clears the `token` cookie. The credential itself stays valid
/// until it expires; there is no server-side revocation list.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 200, description = "Cookie cleared", body = AuthResponse))
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<AuthResponse>) {
    // `CookieJar::remove` only emits a removal for cookies the request carried;
    // an explicit expired cookie clears it regardless.
    let mut expired = Cookie::build(TOKEN_COOKIE).path("/").build();
    expired.make_removal();
    (jar.add(expired), Json(AuthResponse { success: true }))
}

// --- Job Handlers ---

/// list_jobs
///
/// [Public Route] All jobs, or only the jobs of one owner when `email` is given.
#[utoipa::path(
    get,
    path = "/jobs",
    params(JobFilter),
    responses((status = 200, description = "Jobs", body = [Job]))
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(filter): Query<JobFilter>,
) -> ApiResult<Json<Vec<Job>>> {
    let jobs = state.repo.list_jobs(filter.email.as_deref()).await?;
    Ok(Json(jobs))
}

/// get_job
///
/// [Public Route] A single job by id.
#[utoipa::path(
    get,
    path = "/jobs/{id}",
    params(("id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Found", body = Job),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Job>> {
    let id = parse_id(&id)?;
    match state.repo.get_job(id).await? {
        Some(job) => Ok(Json(job)),
        None => Err(ApiError::NotFound("job")),
    }
}

/// create_job
///
/// [Public Route] Stores any JSON object as a posting and returns the assigned
/// id. Fields without a column of their own are kept and returned at the top
/// level.
#[utoipa::path(
    post,
    path = "/jobs",
    request_body = CreateJobRequest,
    responses((status = 200, description = "Created", body = InsertResult))
)]
pub async fn create_job(
    State(state): State<AppState>,
    Json(payload): Json<CreateJobRequest>,
) -> ApiResult<Json<InsertResult>> {
    let job = state.repo.create_job(payload).await?;
    tracing::info!(job_id = %job.id, hr_email = ?job.hr_email, "job created");
    Ok(Json(InsertResult::new(job.id)))
}

// --- Application Handlers ---

/// list_my_applications
///
/// [Authenticated Route] The caller's own applications, each carrying the
/// display fields of the job it references.
///
/// *Ownership*: the `email` query parameter must equal the authenticated
/// identity; anything else (including a missing parameter) is a 403.
#[utoipa::path(
    get,
    path = "/job-application",
    params(ApplicantFilter),
    responses(
        (status = 200, description = "My applications", body = [EnrichedApplication]),
        (status = 401, description = "Missing or invalid credential"),
        (status = 403, description = "Not the owner")
    )
)]
pub async fn list_my_applications(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<ApplicantFilter>,
) -> ApiResult<Json<Vec<EnrichedApplication>>> {
    let email = match filter.email {
        Some(email) if email == auth_user.email => email,
        requested => {
            tracing::warn!(
                caller = %auth_user.email,
                requested = ?requested,
                "application listing denied: identity mismatch"
            );
            return Err(ApiError::Forbidden);
        }
    };

    let applications = state.repo.list_applications_by_applicant(&email).await?;
    Ok(Json(applications))
}

/// list_applications_by_job
///
/// [Public Route] Raw applications for one job.
///
/// *Open question*: any caller can enumerate these. It may be meant for an
/// employer dashboard guarded elsewhere; no owner check is applied here.
#[utoipa::path(
    get,
    path = "/job-application/jobs/{job_id}",
    params(("job_id" = String, Path, description = "Job ID")),
    responses((status = 200, description = "Applications", body = [JobApplication]))
)]
pub async fn list_applications_by_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<Vec<JobApplication>>> {
    let applications = state.repo.list_applications_by_job(&job_id).await?;
    Ok(Json(applications))
}

/// create_application
///
/// [Public Route] Stores an application, then bumps the referenced job's
/// `applicationCount`. The bump is best-effort: its failure is logged and never
/// undoes or fails the insert.
#[utoipa::path(
    post,
    path = "/job-application",
    request_body = CreateApplicationRequest,
    responses((status = 200, description = "Submitted", body = InsertResult))
)]
pub async fn create_application(
    State(state): State<AppState>,
    Json(payload): Json<CreateApplicationRequest>,
) -> ApiResult<Json<InsertResult>> {
    let application = state.repo.create_application(payload).await?;
    tracing::info!(
        application_id = %application.id,
        job_id = %application.job_id,
        "application submitted"
    );

    bump_application_count(&state, &application.job_id).await;

    Ok(Json(InsertResult::new(application.id)))
}

async fn bump_application_count(state: &AppState, job_ref: &str) {
    let Ok(job_id) = Uuid::parse_str(job_ref) else {
        tracing::warn!(job_id = %job_ref, "application references a malformed job id, count not updated");
        return;
    };

    match state.repo.increment_application_count(job_id).await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!(%job_id, "application references a missing job, count not updated")
        }
        Err(e) => tracing::error!(%job_id, error = %e, "failed to update application count"),
    }
}

/// update_application_status
///
/// [Public Route] Sets the review status of one application.
#[utoipa::path(
    patch,
    path = "/job-application/{id}",
    params(("id" = String, Path, description = "Application ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated", body = UpdateResult),
        (status = 400, description = "Malformed id"),
        (status = 422, description = "Unknown status")
    )
)]
pub async fn update_application_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> ApiResult<Json<UpdateResult>> {
    let id = parse_id(&id)?;
    let matched = state
        .repo
        .update_application_status(id, payload.status)
        .await?;

    if matched == 0 {
        tracing::debug!(application_id = %id, "status update matched no application");
    }
    Ok(Json(UpdateResult::from_rows(matched)))
}

/// root
///
/// [Public Route] Liveness text.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Server is up", body = String))
)]
pub async fn root() -> &'static str {
    "Job portal server running......"
}
