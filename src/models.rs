use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

/// Keys the store assigns on a job. Clients cannot set them through extra fields.
const JOB_SERVER_FIELDS: [&str; 3] = ["_id", "applicationCount", "created_at"];

/// Keys the store assigns on an application.
const APPLICATION_SERVER_FIELDS: [&str; 2] = ["_id", "created_at"];

/// canonical_job_ref
///
/// The form a job reference is stored and matched in. Anything that parses as
/// a UUID (upper case, simple, braced, urn) becomes its lowercase hyphenated
/// text, which is also how `jobs.id` renders as text. Other strings are kept
/// verbatim.
pub fn canonical_job_ref(raw: &str) -> String {
    match Uuid::parse_str(raw) {
        Ok(id) => id.to_string(),
        Err(_) => raw.to_string(),
    }
}

// --- Persisted Entities (Mapped to Database) ---

/// Job
///
/// A job posting from the `jobs` table. `hr_email` is the owner.
/// `application_count` stays NULL (and is omitted from JSON) until the first
/// application arrives; afterwards it is only ever incremented.
/// Any other submitted field lives in `extra` and is written back at the top
/// level of the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Job {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hr_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "jobType", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,
    #[serde(rename = "applicationCount", default, skip_serializing_if = "Option::is_none")]
    pub application_count: Option<i32>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    /// Top-level fields with no dedicated column, stored as one JSONB object.
    #[serde(flatten)]
    #[sqlx(json)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

/// ApplicationStatus
///
/// Closed set of review states, stored as the Postgres enum `application_status`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, sqlx::Type, Default,
)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Submitted,
    Reviewed,
    Interviewing,
    Accepted,
    Rejected,
}

/// JobApplication
///
/// A row from `job_applications`. `job_id` is a weak reference: it is not
/// constrained by a foreign key, and is stored in `canonical_job_ref` form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct JobApplication {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub job_id: String,
    pub applicant_email: String,
    pub status: ApplicationStatus,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    /// Top-level fields with no dedicated column, stored as one JSONB object.
    #[serde(flatten)]
    #[sqlx(json)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

/// EnrichedApplication
///
/// Read model for the applicant's own listing: the stored application plus the
/// display fields of the referenced job. The job fields are computed at read time
/// (LEFT JOIN) and stay unset when the job no longer exists. A job value wins
/// over an extra field of the same name stored on the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct EnrichedApplication {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub application: JobApplication,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "jobType", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,
}

impl EnrichedApplication {
    /// Copies the display fields of `job` onto `application`.
    pub fn from_parts(application: JobApplication, job: Option<&Job>) -> Self {
        let enriched = match job {
            Some(job) => Self {
                application,
                title: job.title.clone(),
                company: job.company.clone(),
                location: job.location.clone(),
                category: job.category.clone(),
                job_type: job.job_type.clone(),
                company_logo: job.company_logo.clone(),
            },
            None => Self {
                application,
                ..Self::default()
            },
        };
        enriched.without_shadowed_extras()
    }

    /// Drops extra fields that a populated job display field replaces, so the
    /// flattened document never carries the same key twice.
    pub fn without_shadowed_extras(mut self) -> Self {
        let populated = [
            ("title", self.title.is_some()),
            ("company", self.company.is_some()),
            ("location", self.location.is_some()),
            ("category", self.category.is_some()),
            ("jobType", self.job_type.is_some()),
            ("company_logo", self.company_logo.is_some()),
        ];
        for (key, is_set) in populated {
            if is_set {
                self.application.extra.remove(key);
            }
        }
        self
    }
}

// --- Request Payloads (Input Schemas) ---

/// IdentityClaim
///
/// Body of `POST /jwt`. Extra fields sent by the client are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct IdentityClaim {
    #[schema(example = "applicant@example.com")]
    pub email: String,
}

/// CreateJobRequest
///
/// Body of `POST /jobs`. No field is required; any JSON object is stored as
/// submitted, with unknown fields collected into `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateJobRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hr_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "jobType", default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_logo: Option<String>,
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

impl CreateJobRequest {
    /// Removes store-assigned keys from `extra`.
    pub fn normalized(mut self) -> Self {
        self.extra
            .retain(|key, _| !JOB_SERVER_FIELDS.contains(&key.as_str()));
        self
    }
}

/// CreateApplicationRequest
///
/// Body of `POST /job-application`. `status` defaults to `submitted`; unknown
/// fields (resume link, profile URLs...) are collected into `extra`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateApplicationRequest {
    pub job_id: String,
    pub applicant_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ApplicationStatus>,
    #[serde(flatten)]
    #[ts(skip)]
    pub extra: Map<String, Value>,
}

impl CreateApplicationRequest {
    /// Canonicalizes `job_id` and removes store-assigned keys from `extra`.
    pub fn normalized(mut self) -> Self {
        self.job_id = canonical_job_ref(&self.job_id);
        self.extra
            .retain(|key, _| !APPLICATION_SERVER_FIELDS.contains(&key.as_str()));
        self
    }
}

/// UpdateStatusRequest
///
/// Body of `PATCH /job-application/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateStatusRequest {
    pub status: ApplicationStatus,
}

// --- Write Results (Output Schemas) ---

/// InsertResult
///
/// Acknowledgement of a single insert, carrying the store-assigned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: Uuid,
}

impl InsertResult {
    pub fn new(inserted_id: Uuid) -> Self {
        Self {
            acknowledged: true,
            inserted_id,
        }
    }
}

/// UpdateResult
///
/// Acknowledgement of a filter-based update. An unknown id is not an error:
/// it reports `matched_count == 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateResult {
    pub fn from_rows(rows_affected: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count: rows_affected,
            modified_count: rows_affected,
        }
    }
}

/// AuthResponse
///
/// Body of the cookie-issuing and cookie-clearing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    pub success: bool,
}
