use crate::{
    error::{StoreError, StoreResult},
    models::{
        ApplicationStatus, CreateApplicationRequest, CreateJobRequest, EnrichedApplication, Job,
        JobApplication, canonical_job_ref,
    },
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, query_builder::QueryBuilder, types::Json};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Repository Trait
///
/// The store contract shared by the job and application handlers. Handlers only
/// see `Arc<dyn Repository>`, so the Postgres store and the in-memory store are
/// interchangeable.
///
/// Every method surfaces store failures as `StoreError`; none of them retry.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Jobs ---
    /// All jobs, or only those owned by `hr_email`, in insertion order.
    async fn list_jobs(&self, hr_email: Option<&str>) -> StoreResult<Vec<Job>>;
    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>>;
    async fn create_job(&self, req: CreateJobRequest) -> StoreResult<Job>;
    /// Atomically bumps `application_count` (NULL counts as zero).
    /// Returns false when no job has this id.
    async fn increment_application_count(&self, job_id: Uuid) -> StoreResult<bool>;

    // --- Applications ---
    /// Applications of `applicant_email`, each joined with its job's display fields.
    async fn list_applications_by_applicant(
        &self,
        applicant_email: &str,
    ) -> StoreResult<Vec<EnrichedApplication>>;
    /// Raw applications whose weak `job_id` reference equals `job_id`, both
    /// compared in `canonical_job_ref` form.
    async fn list_applications_by_job(&self, job_id: &str) -> StoreResult<Vec<JobApplication>>;
    /// Stores the request in `CreateApplicationRequest::normalized` form.
    async fn create_application(&self, req: CreateApplicationRequest)
    -> StoreResult<JobApplication>;
    /// Returns the number of matched rows (0 or 1).
    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<u64>;
}

/// RepositoryState
///
/// The process-wide store handle carried in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;

const JOB_COLUMNS: &str = "id, hr_email, title, company, location, category, job_type, \
     company_logo, application_count, created_at, extra";

const APPLICATION_COLUMNS: &str = "id, job_id, applicant_email, status, created_at, extra";

/// PostgresRepository
///
/// `Repository` backed by the `jobs` and `job_applications` tables.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// list_jobs
    ///
    /// Uses QueryBuilder so the optional owner filter stays a bound parameter.
    async fn list_jobs(&self, hr_email: Option<&str>) -> StoreResult<Vec<Job>> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {JOB_COLUMNS} FROM jobs"));

        if let Some(email) = hr_email {
            builder.push(" WHERE hr_email = ");
            builder.push_bind(email);
        }

        builder.push(" ORDER BY created_at ASC, id ASC");

        let jobs = builder
            .build_query_as::<Job>()
            .fetch_all(&self.pool)
            .await?;
        Ok(jobs)
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    /// create_job
    ///
    /// The id and `created_at` are assigned by the database defaults.
    async fn create_job(&self, req: CreateJobRequest) -> StoreResult<Job> {
        let req = req.normalized();
        let job = sqlx::query_as::<_, Job>(&format!(
            r#"
            INSERT INTO jobs (hr_email, title, company, location, category, job_type, company_logo, extra)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {JOB_COLUMNS}
            "#
        ))
        .bind(req.hr_email)
        .bind(req.title)
        .bind(req.company)
        .bind(req.location)
        .bind(req.category)
        .bind(req.job_type)
        .bind(req.company_logo)
        .bind(Json(req.extra))
        .fetch_one(&self.pool)
        .await?;
        Ok(job)
    }

    /// increment_application_count
    ///
    /// A single UPDATE, so concurrent submissions to the same job cannot lose
    /// increments.
    async fn increment_application_count(&self, job_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE jobs SET application_count = COALESCE(application_count, 0) + 1 WHERE id = $1",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// list_applications_by_applicant
    ///
    /// One LEFT JOIN instead of a job lookup per application. `job_id` is text,
    /// so the join compares against the job id's text form; references to
    /// missing or malformed ids simply produce NULL display fields.
    async fn list_applications_by_applicant(
        &self,
        applicant_email: &str,
    ) -> StoreResult<Vec<EnrichedApplication>> {
        let query = r#"
            SELECT
                a.id, a.job_id, a.applicant_email, a.status, a.created_at, a.extra,
                j.title, j.company, j.location, j.category, j.job_type, j.company_logo
            FROM job_applications a
            LEFT JOIN jobs j ON j.id::text = a.job_id
            WHERE a.applicant_email = $1
            ORDER BY a.created_at ASC, a.id ASC
        "#;

        let applications = sqlx::query_as::<_, EnrichedApplication>(query)
            .bind(applicant_email)
            .fetch_all(&self.pool)
            .await?;
        Ok(applications
            .into_iter()
            .map(EnrichedApplication::without_shadowed_extras)
            .collect())
    }

    async fn list_applications_by_job(&self, job_id: &str) -> StoreResult<Vec<JobApplication>> {
        let applications = sqlx::query_as::<_, JobApplication>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM job_applications WHERE job_id = $1 \
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(canonical_job_ref(job_id))
        .fetch_all(&self.pool)
        .await?;
        Ok(applications)
    }

    async fn create_application(
        &self,
        req: CreateApplicationRequest,
    ) -> StoreResult<JobApplication> {
        let req = req.normalized();
        let application = sqlx::query_as::<_, JobApplication>(&format!(
            r#"
            INSERT INTO job_applications (job_id, applicant_email, status, extra)
            VALUES ($1, $2, $3, $4)
            RETURNING {APPLICATION_COLUMNS}
            "#
        ))
        .bind(req.job_id)
        .bind(req.applicant_email)
        .bind(req.status.unwrap_or_default())
        .bind(Json(req.extra))
        .fetch_one(&self.pool)
        .await?;
        Ok(application)
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE job_applications SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

// --- In-Memory Implementation (For Tests) ---

#[derive(Default)]
struct Tables {
    jobs: Vec<Job>,
    applications: Vec<JobApplication>,
}

/// MemoryRepository
///
/// `Repository` over in-process vectors. Used by handler and router tests so they
/// run without a database. Each operation holds the table lock for its whole
/// duration, which keeps the application-count increment atomic here too.
#[derive(Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
    /// When true, every operation fails with `StoreError::Unavailable`.
    pub should_fail: bool,
    /// When true, only `increment_application_count` fails.
    pub fail_increment: bool,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn new_failing_increment() -> Self {
        Self {
            fail_increment: true,
            ..Self::default()
        }
    }

    fn check(&self) -> StoreResult<()> {
        if self.should_fail {
            return Err(Self::simulated_failure());
        }
        Ok(())
    }

    fn simulated_failure() -> StoreError {
        StoreError::Unavailable("memory store: simulated failure".to_string())
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn list_jobs(&self, hr_email: Option<&str>) -> StoreResult<Vec<Job>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables
            .jobs
            .iter()
            .filter(|job| {
                hr_email.is_none_or(|email| job.hr_email.as_deref() == Some(email))
            })
            .cloned()
            .collect())
    }

    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables.jobs.iter().find(|job| job.id == id).cloned())
    }

    async fn create_job(&self, req: CreateJobRequest) -> StoreResult<Job> {
        self.check()?;
        let req = req.normalized();
        let job = Job {
            id: Uuid::new_v4(),
            hr_email: req.hr_email,
            title: req.title,
            company: req.company,
            location: req.location,
            category: req.category,
            job_type: req.job_type,
            company_logo: req.company_logo,
            application_count: None,
            created_at: Utc::now(),
            extra: req.extra,
        };
        self.tables.write().await.jobs.push(job.clone());
        Ok(job)
    }

    async fn increment_application_count(&self, job_id: Uuid) -> StoreResult<bool> {
        self.check()?;
        if self.fail_increment {
            return Err(Self::simulated_failure());
        }
        let mut tables = self.tables.write().await;
        match tables.jobs.iter_mut().find(|job| job.id == job_id) {
            Some(job) => {
                job.application_count = Some(job.application_count.unwrap_or(0) + 1);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_applications_by_applicant(
        &self,
        applicant_email: &str,
    ) -> StoreResult<Vec<EnrichedApplication>> {
        self.check()?;
        let tables = self.tables.read().await;
        Ok(tables
            .applications
            .iter()
            .filter(|application| application.applicant_email == applicant_email)
            .map(|application| {
                let job = tables
                    .jobs
                    .iter()
                    .find(|job| job.id.to_string() == application.job_id);
                EnrichedApplication::from_parts(application.clone(), job)
            })
            .collect())
    }

    async fn list_applications_by_job(&self, job_id: &str) -> StoreResult<Vec<JobApplication>> {
        self.check()?;
        let job_id = canonical_job_ref(job_id);
        let tables = self.tables.read().await;
        Ok(tables
            .applications
            .iter()
            .filter(|application| application.job_id == job_id)
            .cloned()
            .collect())
    }

    async fn create_application(
        &self,
        req: CreateApplicationRequest,
    ) -> StoreResult<JobApplication> {
        self.check()?;
        let req = req.normalized();
        let application = JobApplication {
            id: Uuid::new_v4(),
            job_id: req.job_id,
            applicant_email: req.applicant_email,
            status: req.status.unwrap_or_default(),
            created_at: Utc::now(),
            extra: req.extra,
        };
        self.tables
            .write()
            .await
            .applications
            .push(application.clone());
        Ok(application)
    }

    async fn update_application_status(
        &self,
        id: Uuid,
        status: ApplicationStatus,
    ) -> StoreResult<u64> {
        self.check()?;
        let mut tables = self.tables.write().await;
        match tables
            .applications
            .iter_mut()
            .find(|application| application.id == id)
        {
            Some(application) => {
                application.status = status;
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
