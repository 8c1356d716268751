use chrono::Utc;
use job_portal::models::{
    ApplicationStatus, CreateApplicationRequest, CreateJobRequest, EnrichedApplication,
    IdentityClaim, InsertResult, Job, JobApplication, UpdateResult, UpdateStatusRequest,
    canonical_job_ref,
};
use serde_json::{Map, json};
use uuid::Uuid;

fn sample_job() -> Job {
    Job {
        id: Uuid::new_v4(),
        hr_email: Some("a@x.com".to_string()),
        title: Some("Engineer".to_string()),
        company: Some("Acme".to_string()),
        location: Some("Dhaka".to_string()),
        category: Some("Engineering".to_string()),
        job_type: Some("Hybrid".to_string()),
        company_logo: Some("logo.png".to_string()),
        application_count: None,
        created_at: Utc::now(),
        extra: Map::new(),
    }
}

fn sample_application(job_id: &str) -> JobApplication {
    JobApplication {
        id: Uuid::new_v4(),
        job_id: job_id.to_string(),
        applicant_email: "b@x.com".to_string(),
        status: ApplicationStatus::Submitted,
        created_at: Utc::now(),
        extra: json!({ "resume": "https://cv.test/b.pdf" })
            .as_object()
            .cloned()
            .unwrap(),
    }
}

#[test]
fn test_job_uses_wire_field_names() {
    let mut job = sample_job();
    job.application_count = Some(3);

    let value = serde_json::to_value(&job).unwrap();

    assert_eq!(value["_id"], job.id.to_string());
    assert_eq!(value["jobType"], "Hybrid");
    assert_eq!(value["applicationCount"], 3);
    assert!(value.get("id").is_none());
    assert!(value.get("job_type").is_none());
}

#[test]
fn test_job_omits_absent_application_count() {
    let value = serde_json::to_value(sample_job()).unwrap();
    assert!(value.get("applicationCount").is_none());
    assert!(value.get("extra").is_none());
}

#[test]
fn test_extra_fields_are_flattened_onto_the_job() {
    let mut job = sample_job();
    job.extra.insert("description".to_string(), json!("Build things"));
    job.extra.insert("salaryRange".to_string(), json!({ "min": 1, "max": 2 }));

    let value = serde_json::to_value(&job).unwrap();

    assert_eq!(value["description"], "Build things");
    assert_eq!(value["salaryRange"]["max"], 2);
    assert!(value.get("extra").is_none());

    let back: Job = serde_json::from_value(value).unwrap();
    assert_eq!(back, job);
}

#[test]
fn test_enriched_application_is_flat() {
    let job = sample_job();
    let application = sample_application(&job.id.to_string());

    let enriched = EnrichedApplication::from_parts(application.clone(), Some(&job));
    let value = serde_json::to_value(&enriched).unwrap();

    assert_eq!(value["_id"], application.id.to_string());
    assert_eq!(value["applicant_email"], "b@x.com");
    assert_eq!(value["status"], "submitted");
    assert_eq!(value["title"], "Engineer");
    assert_eq!(value["company_logo"], "logo.png");
    assert_eq!(value["jobType"], "Hybrid");
    assert_eq!(value["resume"], "https://cv.test/b.pdf");
    assert!(value.get("application").is_none());
}

#[test]
fn test_enriched_application_without_job_has_no_display_fields() {
    let application = sample_application("deleted-job");

    let enriched = EnrichedApplication::from_parts(application, None);
    let value = serde_json::to_value(&enriched).unwrap();

    for field in ["title", "company", "location", "category", "jobType", "company_logo"] {
        assert!(value.get(field).is_none(), "{field} should be unset");
    }
}

#[test]
fn test_status_accepts_only_known_values() {
    let ok: UpdateStatusRequest = serde_json::from_value(json!({ "status": "accepted" })).unwrap();
    assert_eq!(ok.status, ApplicationStatus::Accepted);

    assert!(serde_json::from_value::<UpdateStatusRequest>(json!({ "status": "Accepted" })).is_err());
    assert!(serde_json::from_value::<UpdateStatusRequest>(json!({ "status": "maybe" })).is_err());
}

#[test]
fn test_create_requests_accept_minimal_documents() {
    let job: CreateJobRequest = serde_json::from_value(json!({})).unwrap();
    assert_eq!(job.hr_email, None);
    assert_eq!(job.title, None);

    let application: CreateApplicationRequest =
        serde_json::from_value(json!({ "job_id": "J1", "applicant_email": "b@x.com" })).unwrap();
    assert_eq!(application.status, None);
}

#[test]
fn test_create_requests_collect_unknown_fields() {
    let job: CreateJobRequest = serde_json::from_value(json!({
        "hr_email": "a@x.com",
        "jobType": "Remote",
        "applicationDeadline": "2025-01-01",
        "_id": "forged"
    }))
    .unwrap();
    assert_eq!(job.job_type.as_deref(), Some("Remote"));
    assert_eq!(job.extra["applicationDeadline"], "2025-01-01");

    let job = job.normalized();
    assert!(job.extra.get("_id").is_none());
    assert_eq!(job.extra.len(), 1);

    let application: CreateApplicationRequest = serde_json::from_value(json!({
        "job_id": "J1",
        "applicant_email": "b@x.com",
        "linkedIn": "https://linkedin.test/b"
    }))
    .unwrap();
    assert_eq!(application.extra["linkedIn"], "https://linkedin.test/b");
}

#[test]
fn test_canonical_job_ref() {
    let id = Uuid::new_v4();
    let canonical = id.to_string();

    assert_eq!(canonical_job_ref(&canonical), canonical);
    assert_eq!(canonical_job_ref(&canonical.to_uppercase()), canonical);
    assert_eq!(canonical_job_ref(&id.simple().to_string()), canonical);
    assert_eq!(canonical_job_ref(&format!("{{{}}}", canonical)), canonical);
    assert_eq!(canonical_job_ref("not-a-uuid"), "not-a-uuid");
}

#[test]
fn test_identity_claim_ignores_extra_fields() {
    let claim: IdentityClaim =
        serde_json::from_value(json!({ "email": "b@x.com", "displayName": "B" })).unwrap();
    assert_eq!(claim.email, "b@x.com");
}

#[test]
fn test_write_results_are_camel_case() {
    let id = Uuid::new_v4();
    assert_eq!(
        serde_json::to_value(InsertResult::new(id)).unwrap(),
        json!({ "acknowledged": true, "insertedId": id.to_string() })
    );
    assert_eq!(
        serde_json::to_value(UpdateResult::from_rows(1)).unwrap(),
        json!({ "acknowledged": true, "matchedCount": 1, "modifiedCount": 1 })
    );
}
