//! Runs against a live Postgres. Ignored by default; run with
//! `DATABASE_URL=... cargo test -- --ignored`.

use job_portal::{
    models::{ApplicationStatus, CreateApplicationRequest, CreateJobRequest},
    repository::{PostgresRepository, Repository},
};
use sqlx::PgPool;
use tokio::test;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

/// Unique owner per test so runs never see each other's rows.
fn unique_email(prefix: &str) -> String {
    format!("{}-{}@test.com", prefix, Uuid::new_v4().simple())
}

fn job_request(hr_email: &str, title: &str) -> CreateJobRequest {
    CreateJobRequest {
        hr_email: Some(hr_email.to_string()),
        title: Some(title.to_string()),
        company: Some("Acme".to_string()),
        job_type: Some("Remote".to_string()),
        extra: serde_json::json!({ "description": "Build things" })
            .as_object()
            .cloned()
            .unwrap(),
        ..CreateJobRequest::default()
    }
}

fn application_request(job_id: &str, applicant_email: &str) -> CreateApplicationRequest {
    CreateApplicationRequest {
        job_id: job_id.to_string(),
        applicant_email: applicant_email.to_string(),
        ..CreateApplicationRequest::default()
    }
}

// --- Tests ---

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_and_get_job() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let hr = unique_email("hr");

    let created = repo.create_job(job_request(&hr, "Engineer")).await.unwrap();
    let fetched = repo.get_job(created.id).await.unwrap().unwrap();

    assert_eq!(fetched, created);
    assert_eq!(fetched.application_count, None);
    assert_eq!(fetched.extra["description"], "Build things");
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_list_jobs_by_owner_in_insertion_order() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let hr = unique_email("hr");

    let first = repo.create_job(job_request(&hr, "First")).await.unwrap();
    let second = repo.create_job(job_request(&hr, "Second")).await.unwrap();
    repo.create_job(job_request(&unique_email("other"), "Elsewhere"))
        .await
        .unwrap();

    let owned = repo.list_jobs(Some(&hr)).await.unwrap();

    assert_eq!(
        owned.iter().map(|j| j.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_increment_application_count() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let job = repo
        .create_job(job_request(&unique_email("hr"), "Engineer"))
        .await
        .unwrap();

    assert!(repo.increment_application_count(job.id).await.unwrap());
    assert!(repo.increment_application_count(job.id).await.unwrap());
    assert!(!repo.increment_application_count(Uuid::new_v4()).await.unwrap());

    let job = repo.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(job.application_count, Some(2));
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_increments_are_not_lost() {
    let ctx = DbTestContext::setup().await;
    let repo = std::sync::Arc::new(ctx.repository());
    let job_id = repo
        .create_job(job_request(&unique_email("hr"), "Engineer"))
        .await
        .unwrap()
        .id;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let repo = repo.clone();
        handles.push(tokio::spawn(async move {
            repo.increment_application_count(job_id).await.unwrap()
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap());
    }

    let job = repo.get_job(job_id).await.unwrap().unwrap();
    assert_eq!(job.application_count, Some(10));
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_enriched_listing_joins_job_fields() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let applicant = unique_email("applicant");
    let job = repo
        .create_job(job_request(&unique_email("hr"), "Engineer"))
        .await
        .unwrap();

    repo.create_application(application_request(&job.id.to_string(), &applicant))
        .await
        .unwrap();
    repo.create_application(application_request("not-a-uuid", &applicant))
        .await
        .unwrap();

    // Upper case reference to the same job joins after canonicalization.
    repo.create_application(application_request(
        &job.id.to_string().to_uppercase(),
        &applicant,
    ))
    .await
    .unwrap();

    let listed = repo.list_applications_by_applicant(&applicant).await.unwrap();

    assert_eq!(listed.len(), 3);
    assert_eq!(listed[2].title.as_deref(), Some("Engineer"));
    assert_eq!(listed[0].title.as_deref(), Some("Engineer"));
    assert_eq!(listed[0].job_type.as_deref(), Some("Remote"));
    assert_eq!(listed[1].title, None);
}

#[test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_application_status() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();
    let job_ref = Uuid::new_v4().to_string();
    let application = repo
        .create_application(application_request(&job_ref, &unique_email("applicant")))
        .await
        .unwrap();
    assert_eq!(application.status, ApplicationStatus::Submitted);

    let matched = repo
        .update_application_status(application.id, ApplicationStatus::Reviewed)
        .await
        .unwrap();
    assert_eq!(matched, 1);

    let listed = repo.list_applications_by_job(&job_ref).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, ApplicationStatus::Reviewed);

    let missing = repo
        .update_application_status(Uuid::new_v4(), ApplicationStatus::Rejected)
        .await
        .unwrap();
    assert_eq!(missing, 0);
}
