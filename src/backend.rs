use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::{ChatMessage, DetectionResult, EventType, FractionalAllocation, Goal, RiskProfile};
use crate::error::PlannerError;

/// Statement formats the analysis service accepts.
pub const STATEMENT_EXTENSIONS: [&str; 4] = ["pdf", "csv", "xlsx", "xls"];

const NO_REASONING: &str = "No reasoning provided";

/// Remote collaborators of the planner. Implemented over HTTP by
/// [`BackendClient`]; tests substitute their own.
#[async_trait]
pub trait PlanningBackend: Send + Sync {
    /// Uploads a statement. `Ok(None)` means the analysis found no event.
    async fn detect_event(&self, statement: &Path) -> Result<Option<DetectionResult>, PlannerError>;

    async fn recommend(
        &self,
        req: &RecommendationRequest,
    ) -> Result<RecommendationResponse, PlannerError>;

    async fn chat(&self, message: &str, history: &[ChatMessage]) -> Result<String, PlannerError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub user_id: String,
    pub risk_profile: RiskProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_surplus: Option<u64>,
    pub goals: Vec<GoalRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalRequest {
    pub goal_name: String,
    pub target_amount: u64,
    pub target_years: u32,
}

impl From<&Goal> for GoalRequest {
    fn from(goal: &Goal) -> Self {
        Self {
            goal_name: goal.name.clone(),
            target_amount: goal.target_amount,
            target_years: goal.timeframe,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RecommendationResponse {
    #[serde(default)]
    pub goals: Vec<GoalRecommendation>,

    /// Everything else the service returns (`user_id`, ...), kept for the dump.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalRecommendation {
    pub goal_name: String,
    #[serde(default)]
    pub target_amount: f64,
    #[serde(default)]
    pub target_horizon_years: f64,
    #[serde(default)]
    pub recommended_sip: f64,
    /// Fractions in 0..=1, not percentages.
    #[serde(default)]
    pub adjusted_allocation: FractionalAllocation,
    #[serde(default)]
    pub rationale: String,

    /// `base_plan`, `expected_return`, ... are not interpreted.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecommendationResponse {
    /// Case-insensitive exact match on `goal_name`.
    pub fn find(&self, goal_name: &str) -> Option<&GoalRecommendation> {
        let needle = goal_name.to_lowercase();
        self.goals.iter().find(|g| g.goal_name.to_lowercase() == needle)
    }
}

#[derive(Serialize)]
struct ChatPayload<'a> {
    message: &'a str,
    chat_history: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatReply {
    response: String,
}

/// Pulls `analysis_result.event_detection` out of an upload response.
///
/// A missing or oddly shaped section means nothing was detected; it is
/// never an error.
pub fn parse_detection(body: &Value) -> Option<DetectionResult> {
    let detection = body.pointer("/analysis_result/event_detection")?;
    let name = detection
        .get("eventName")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())?;
    let reasoning = detection
        .get("reasoning")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_REASONING);

    Some(DetectionResult { event_type: EventType::from(name), reasoning: reasoning.to_string() })
}

/// Decodes a recommendation body, skipping goal entries that do not parse.
pub fn parse_recommendation(body: Value) -> RecommendationResponse {
    let Value::Object(mut obj) = body else {
        return RecommendationResponse::default();
    };
    let goals = match obj.remove("goals") {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<GoalRecommendation>(item) {
                Ok(goal) => Some(goal),
                Err(err) => {
                    warn!(%err, "backend.recommendation.skip_goal");
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    };
    RecommendationResponse { goals, extra: obj }
}

fn ensure_statement(path: &Path) -> Result<(), PlannerError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext {
        Some(ext) if STATEMENT_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(PlannerError::UnsupportedFile(path.display().to_string())),
    }
}

/// Builds a `Status` error, pulling FastAPI-style `detail` from the body.
async fn status_error(resp: Response) -> PlannerError {
    let status = resp.status().as_u16();
    let detail = resp
        .json::<Value>()
        .await
        .ok()
        .and_then(|body| body.get("detail").cloned())
        .and_then(|d| match d {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        });
    PlannerError::Status { status, detail }
}

#[derive(Clone)]
pub struct BackendClient {
    base_url: String,
    upload_path: String,
    http: Client,
}

impl BackendClient {
    pub fn new(
        base_url: &str,
        upload_path: &str,
        timeout: Duration,
    ) -> Result<Self, PlannerError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            upload_path: format!("/{}", upload_path.trim_start_matches('/')),
            http,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, PlannerError> {
        Self::new(
            &cfg.backend_url,
            &cfg.upload_path,
            Duration::from_secs(cfg.http_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /health`; returns the reported status string.
    pub async fn health(&self) -> Result<String, PlannerError> {
        let url = format!("{}/health", self.base_url);
        let body: Value = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string())
    }
}

#[async_trait]
impl PlanningBackend for BackendClient {
    async fn detect_event(&self, statement: &Path) -> Result<Option<DetectionResult>, PlannerError> {
        ensure_statement(statement)?;

        let bytes = tokio::fs::read(statement).await?;
        let file_name = statement
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "statement".to_string());
        let mime = mime_guess::from_path(statement).first_or_octet_stream();
        info!(file = %file_name, bytes = bytes.len(), mime = %mime, "backend.upload");

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime.essence_str())?;
        let form = Form::new().part("file", part);

        let url = format!("{}{}", self.base_url, self.upload_path);
        let resp = self.http.post(url).multipart(form).send().await?;
        if !resp.status().is_success() {
            // Upload failures surface the bare status code.
            return Err(PlannerError::Status { status: resp.status().as_u16(), detail: None });
        }

        let body: Value = resp.json().await?;
        let detection = parse_detection(&body);
        match &detection {
            Some(d) => info!(event_type = %d.event_type, "backend.upload.detected"),
            None => info!("backend.upload.no_event"),
        }
        Ok(detection)
    }

    async fn recommend(
        &self,
        req: &RecommendationRequest,
    ) -> Result<RecommendationResponse, PlannerError> {
        let url = format!("{}/recommendation", self.base_url);
        debug!(?req, "backend.recommend.request");

        let resp = self.http.post(url).json(req).send().await?;
        if !resp.status().is_success() {
            let err = status_error(resp).await;
            warn!(%err, "backend.recommend.failed");
            return Err(err);
        }

        let body: Value = resp.json().await?;
        let parsed = parse_recommendation(body);
        info!(goals = parsed.goals.len(), "backend.recommend.ok");
        Ok(parsed)
    }

    async fn chat(&self, message: &str, history: &[ChatMessage]) -> Result<String, PlannerError> {
        let url = format!("{}/chat", self.base_url);
        let reply: ChatReply = self
            .http
            .post(url)
            .json(&ChatPayload { message, chat_history: history })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(reply.response)
    }
}
