use std::io::Write;
use std::time::Duration;

use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use finplan::backend::{BackendClient, GoalRequest, PlanningBackend, RecommendationRequest};
use finplan::chat::{ChatSession, FALLBACK_REPLY};
use finplan::domain::{EventStatus, EventType, RiskProfile};
use finplan::error::PlannerError;
use finplan::selection::GoalSelection;
use finplan::sip::DEFAULT_ANNUAL_RATE_PCT;
use finplan::state::{Applied, Planner, RecommendationContext};

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base: &str) -> BackendClient {
    BackendClient::new(base, "/hello", Duration::from_secs(5)).unwrap()
}

fn statement(suffix: &str, body: &[u8]) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new()
        .prefix("statement")
        .suffix(suffix)
        .tempfile()
        .unwrap();
    f.write_all(body).unwrap();
    f
}

async fn detecting_upload(mut multipart: Multipart) -> Json<Value> {
    let mut file_name = None;
    let mut size = 0;
    while let Some(field) = multipart.next_field().await.unwrap() {
        if field.name() == Some("file") {
            file_name = field.file_name().map(str::to_string);
            size = field.bytes().await.unwrap().len();
        }
    }
    Json(json!({
        "message": "File uploaded and analyzed successfully",
        "filename": file_name,
        "size": size,
        "analysis_result": {
            "event_detection": { "eventName": "jobChange", "reasoning": format!("saw {size} bytes") }
        }
    }))
}

async fn recommend_echo(Json(body): Json<Value>) -> Json<Value> {
    let goals: Vec<Value> = body["goals"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .map(|g| {
            json!({
                "goal_name": g["goal_name"],
                "target_amount": g["target_amount"],
                "target_horizon_years": g["target_years"],
                "recommended_sip": 1234.5,
                "adjusted_allocation": { "equity": 0.5, "debt": 0.3, "gold": 0.1, "liquid": 0.1 },
                "rationale": format!("{} profile", body["risk_profile"].as_str().unwrap_or("?")),
                "base_plan": "Equity Revival"
            })
        })
        .collect();
    Json(json!({ "user_id": body["user_id"], "goals": goals }))
}

#[tokio::test]
async fn upload_reports_detected_event() {
    let base = spawn(Router::new().route("/hello", post(detecting_upload))).await;
    let file = statement(".csv", b"date,amount\n2024-01-01,100\n");

    let detection = client(&base).detect_event(file.path()).await.unwrap().unwrap();
    assert_eq!(detection.event_type, EventType::JobChange);
    assert_eq!(detection.reasoning, "saw 27 bytes");
}

#[tokio::test]
async fn upload_without_detection_is_not_an_error() {
    let app = Router::new().route(
        "/hello",
        post(|| async { Json(json!({ "message": "ok", "analysis_result": {} })) }),
    );
    let base = spawn(app).await;
    let file = statement(".pdf", b"%PDF-1.4");

    assert_eq!(client(&base).detect_event(file.path()).await.unwrap(), None);
}

#[tokio::test]
async fn upload_failure_surfaces_status_code() {
    let app = Router::new().route(
        "/hello",
        post(|| async {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": "Upload failed: disk" })))
        }),
    );
    let base = spawn(app).await;
    let file = statement(".xlsx", b"PK");

    let err = client(&base).detect_event(file.path()).await.unwrap_err();
    assert!(matches!(err, PlannerError::Status { status: 500, detail: None }));
    assert_eq!(err.to_string(), "Server responded with status: 500");
}

#[tokio::test]
async fn unsupported_files_are_refused_locally() {
    // nothing listens here; the check happens before any request
    let file = statement(".docx", b"x");
    let err = client("http://127.0.0.1:9").detect_event(file.path()).await.unwrap_err();
    assert!(matches!(err, PlannerError::UnsupportedFile(_)));
}

#[tokio::test]
async fn recommendation_round_trip() {
    let base = spawn(Router::new().route("/recommendation", post(recommend_echo))).await;
    let req = RecommendationRequest {
        user_id: "user123".into(),
        risk_profile: RiskProfile::Conservative,
        monthly_surplus: Some(50_000),
        goals: vec![GoalRequest {
            goal_name: "Wedding Expenses".into(),
            target_amount: 1_200_000,
            target_years: 1,
        }],
    };

    let rec = client(&base).recommend(&req).await.unwrap();
    assert_eq!(rec.extra.get("user_id"), Some(&json!("user123")));
    let goal = rec.find("WEDDING EXPENSES").unwrap();
    assert_eq!(goal.recommended_sip, 1234.5);
    assert_eq!(goal.target_horizon_years, 1.0);
    assert_eq!(goal.rationale, "conservative profile");
    assert_eq!(goal.adjusted_allocation.equity, 0.5);
}

#[tokio::test]
async fn recommendation_error_uses_server_detail() {
    let app = Router::new().route(
        "/recommendation",
        post(|| async { (StatusCode::BAD_REQUEST, Json(json!({ "detail": "'goals'" }))) }),
    );
    let base = spawn(app).await;
    let req = RecommendationRequest {
        user_id: "u".into(),
        risk_profile: RiskProfile::Moderate,
        monthly_surplus: None,
        goals: Vec::new(),
    };

    let err = client(&base).recommend(&req).await.unwrap_err();
    assert_eq!(err.to_string(), "'goals'");
}

#[tokio::test]
async fn unreachable_host_is_a_connectivity_error() {
    let port = {
        let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let err = client(&format!("http://127.0.0.1:{port}"))
        .recommend(&RecommendationRequest {
            user_id: "u".into(),
            risk_profile: RiskProfile::Moderate,
            monthly_surplus: None,
            goals: Vec::new(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PlannerError::Connectivity(_)), "{err:?}");
}

#[tokio::test]
async fn chat_passthrough_and_fallback() {
    let app = Router::new()
        .route(
            "/chat",
            post(|Json(body): Json<Value>| async move {
                let system = body["chat_history"][0]["role"].as_str().unwrap_or("").to_string();
                Json(json!({ "response": format!("{system}: {}", body["message"].as_str().unwrap_or("")) }))
            }),
        )
        .route("/health", get(|| async { Json(json!({ "status": "healthy" })) }));
    let base = spawn(app).await;

    let backend = client(&base);
    assert_eq!(backend.health().await.unwrap(), "healthy");

    let mut session = ChatSession::default();
    let reply = session.send(&backend, "biggest expense?").await.unwrap();
    assert_eq!(reply.content, "system: biggest expense?");

    let down = client("http://127.0.0.1:9");
    let reply = session.send(&down, "again?").await.unwrap();
    assert_eq!(reply.content, FALLBACK_REPLY);
    assert_eq!(session.messages().len(), 5);
}

#[tokio::test]
async fn statement_to_plan_flow() {
    let app = Router::new()
        .route("/hello", post(detecting_upload))
        .route("/recommendation", post(recommend_echo));
    let base = spawn(app).await;
    let backend = client(&base);
    let today = "2024-03-01".parse().unwrap();

    let mut planner = Planner::seeded();
    let file = statement(".csv", b"abc");
    let ev = match planner.detect_from_statement(&backend, file.path(), today).await.unwrap() {
        Applied::Fresh(Some(ev)) => ev,
        other => panic!("expected a detected event, got {other:?}"),
    };
    assert_eq!(ev.title, "Job Change Detected");

    // the freshly detected event carries the reasoning, so it is shown alone
    let shown: Vec<_> = planner.displayed_events().iter().map(|e| e.id.clone()).collect();
    assert_eq!(shown, [ev.id.clone()]);

    planner.confirm_event(&ev.id);
    assert_eq!(planner.event(&ev.id).unwrap().status, EventStatus::Confirmed);

    let mut selection = GoalSelection::for_event(&ev.event_type, DEFAULT_ANNUAL_RATE_PCT);
    selection.toggle("goal-4").unwrap();
    let ctx = RecommendationContext {
        user_id: "user123".into(),
        risk_profile: RiskProfile::Aggressive,
        monthly_surplus: Some(50_000),
    };
    let applied = planner.submit_goal_selection(&backend, &selection, &ctx).await.unwrap();
    assert_eq!(applied, Applied::Fresh(()));

    let plan = planner.plan();
    assert_eq!(plan.goals().len(), 1);
    let goal = &plan.goals()[0];
    assert!(goal.recommended);
    assert_eq!(goal.goal.name, "Career Sabbatical Fund");
    assert_eq!(goal.goal.monthly_sip, 1235);
    assert_eq!(goal.goal.rationale, "aggressive profile");
    assert_eq!(plan.total_monthly_sip(), 1234.5);
}
