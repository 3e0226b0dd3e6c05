mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;

use common::{FakeReviews, Fakes, get, spawn_app};
use compli::gateway::interviews::{InterviewRecord, NOT_SPECIFIED, VARIOUS_POSITIONS};
use compli::query::CompanyQuery;

fn acme_search() -> Value {
    json!({
        "status": true,
        "data": {"employerResults": [{"employer": {"id": 4242, "shortName": "Acme"}}]}
    })
}

fn acme_interviews() -> Value {
    json!({
        "data": {
            "employerInterviews": {
                "interviews": [
                    {
                        "difficulty": "MEDIUM",
                        "experience": "POSITIVE",
                        "jobTitle": {"text": "Software Engineer"},
                        "outcome": "ACCEPTED",
                        "processDescription": "Phone screen. They asked how would you scale our API? Then an onsite.",
                        "userQuestions": [{"question": "Tell me about a hard bug you fixed."}, "N/A"]
                    },
                    {
                        "difficulty": "HARD",
                        "experience": "NEGATIVE",
                        "jobTitle": "Software Engineer",
                        "outcome": "REJECTED",
                        "processDescription": "Two rounds.",
                        "userQuestions": [{"text": "Tell me about a hard bug you fixed."}]
                    },
                    {
                        "difficulty": "HARD",
                        "jobTitle": "Designer",
                        "userQuestions": []
                    }
                ]
            }
        }
    })
}

#[tokio::test]
async fn unknown_company_yields_note_not_error() {
    let app = spawn_app(&Fakes::default()).await;

    let (status, body) = get(&app.router, "/api/questions?company=Acme").await;
    assert_eq!(status, StatusCode::OK);

    let record: InterviewRecord = serde_json::from_value(body).unwrap();
    assert!(!record.has_company_info);
    assert_eq!(record.interview_count, 0);
    assert!(record.questions.is_empty());
    assert_eq!(record.note.as_deref(), Some(r#"No companies found matching "Acme""#));
    assert_eq!(record.difficulty, NOT_SPECIFIED);
    assert_eq!(record.job_title, VARIOUS_POSITIONS);
}

#[tokio::test]
async fn reviews_are_aggregated_from_nested_location() {
    let fakes = Fakes {
        reviews: Arc::new(FakeReviews::new(acme_search(), acme_interviews())),
        ..Fakes::default()
    };
    let app = spawn_app(&fakes).await;

    let (status, body) = get(&app.router, "/api/questions?company=acme").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["employer"], "Acme");
    assert_eq!(body["interviewCount"], 3);
    assert_eq!(body["hasCompanyInfo"], true);
    assert_eq!(body["difficulty"], "HARD");
    assert_eq!(body["experience"], "POSITIVE");
    assert_eq!(body["jobTitle"], "Software Engineer");
    assert_eq!(body["outcome"], "ACCEPTED");
    assert_eq!(
        body["process"],
        "Phone screen. They asked how would you scale our API? Then an onsite."
    );
    assert_eq!(
        body["questions"],
        json!([
            "Tell me about a hard bug you fixed.",
            "They asked how would you scale our API? Then an onsite"
        ])
    );
    assert_eq!(body["questionsFound"], 2);
}

#[tokio::test]
async fn cached_record_short_circuits_provider() {
    let fakes = Fakes {
        reviews: Arc::new(FakeReviews::new(acme_search(), acme_interviews())),
        ..Fakes::default()
    };
    let app = spawn_app(&fakes).await;

    get(&app.router, "/api/questions?company=Acme").await;
    let (_, body) = get(&app.router, "/api/questions?company=%20ACME%20").await;
    assert_eq!(body["interviewCount"], 3);
    assert_eq!(fakes.reviews.search_calls(), 1);

    app.clock.advance(chrono::Duration::hours(25));
    get(&app.router, "/api/questions?company=acme").await;
    assert_eq!(fakes.reviews.search_calls(), 2);
}

#[tokio::test]
async fn empty_results_are_not_cached() {
    let fakes = Fakes::default();
    let app = spawn_app(&fakes).await;

    get(&app.router, "/api/questions?company=Acme").await;
    get(&app.router, "/api/questions?company=Acme").await;
    assert_eq!(fakes.reviews.search_calls(), 2);
}

#[tokio::test]
async fn missing_reviews_fall_back_to_overview() {
    let mut reviews = FakeReviews::new(acme_search(), json!({"data": {"interviews": []}}));
    let fakes = Fakes {
        reviews: Arc::new(FakeReviews::new(acme_search(), json!({"data": {}}))),
        ..Fakes::default()
    };
    let company = CompanyQuery::parse("Acme").unwrap();

    let app = spawn_app(&fakes).await;
    let record = app.gateway.interviews.lookup(&company).await;
    assert!(record.has_company_info);
    assert_eq!(record.interview_count, 0);
    assert!(record.note.is_some());
    assert!(record.error.is_none());

    reviews.overview_ok = false;
    let fakes = Fakes {
        reviews: Arc::new(reviews),
        ..Fakes::default()
    };
    let app = spawn_app(&fakes).await;
    let record = app.gateway.interviews.lookup(&company).await;
    assert_eq!(record.employer, "Acme");
    assert!(record.error.is_some());
}

#[tokio::test]
async fn provider_rejection_degrades_to_record() {
    let fakes = Fakes {
        reviews: Arc::new(FakeReviews::new(
            json!({"status": false, "error": "quota"}),
            json!({}),
        )),
        ..Fakes::default()
    };
    let app = spawn_app(&fakes).await;

    let (status, body) = get(&app.router, "/api/questions?company=Acme").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hasCompanyInfo"], false);
    assert_eq!(body["error"], "API Error: quota");
}

#[tokio::test]
async fn company_search_failure_degrades_to_record() {
    let mut reviews = FakeReviews::new(acme_search(), acme_interviews());
    reviews.search_ok = false;
    let fakes = Fakes {
        reviews: Arc::new(reviews),
        ..Fakes::default()
    };
    let app = spawn_app(&fakes).await;

    let (status, body) = get(&app.router, "/api/questions?company=Acme").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["employer"], "Acme");
    assert_eq!(body["hasCompanyInfo"], false);
    assert_eq!(body["interviewCount"], 0);
    assert_eq!(body["difficulty"], NOT_SPECIFIED);
    assert_eq!(body["questions"], json!([]));
    assert!(body["error"].as_str().unwrap().contains("company search timed out"));
}

#[tokio::test]
async fn employer_without_id_is_reported_as_known_company() {
    let search = json!({
        "status": true,
        "data": {"employerResults": [{"employer": {"name": "Acme Rockets"}}]}
    });
    let fakes = Fakes {
        reviews: Arc::new(FakeReviews::new(search, acme_interviews())),
        ..Fakes::default()
    };
    let app = spawn_app(&fakes).await;

    let (status, body) = get(&app.router, "/api/questions?company=acme").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["employer"], "Acme Rockets");
    assert_eq!(body["hasCompanyInfo"], true);
    assert_eq!(body["interviewCount"], 0);
    assert_eq!(body["jobTitle"], VARIOUS_POSITIONS);
    assert_eq!(body["error"], "Employer ID not found in search results");
}

#[tokio::test]
async fn interviews_failure_after_resolution_degrades_to_record() {
    let mut reviews = FakeReviews::new(acme_search(), acme_interviews());
    reviews.interviews_ok = false;
    let fakes = Fakes {
        reviews: Arc::new(reviews),
        ..Fakes::default()
    };
    let app = spawn_app(&fakes).await;

    let (status, body) = get(&app.router, "/api/questions?company=acme").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["employer"], "Acme");
    assert_eq!(body["hasCompanyInfo"], true);
    assert_eq!(body["interviewCount"], 0);
    assert_eq!(body["outcome"], NOT_SPECIFIED);
    assert!(body["error"].as_str().unwrap().contains("503"));

    get(&app.router, "/api/questions?company=acme").await;
    assert_eq!(fakes.reviews.search_calls(), 2);
}
