use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use tracing::{debug, info, warn};

use crate::backend::{GoalRequest, PlanningBackend, RecommendationRequest, RecommendationResponse};
use crate::catalog;
use crate::domain::{DetectionResult, EventStatus, EventType, Goal, LifeEvent, RiskProfile};
use crate::error::PlannerError;
use crate::plan::PortfolioPlan;
use crate::reconcile::reconcile_events;
use crate::selection::GoalSelection;

const DETECTED_CONFIDENCE: u8 = 92;
const DETECTED_EXPLANATION: &str = "Detected from your bank statement.";

/// Fields of the "add event" form.
#[derive(Debug, Clone, Default)]
pub struct ManualEvent {
    pub title: String,
    pub event_type: EventType,
    pub explanation: String,
    pub detailed_explanation: Option<String>,
    /// Defaults to today.
    pub detected_date: Option<NaiveDate>,
}

/// Outcome of a confirm/reject request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    NotFound,
    /// Confirmed and rejected are terminal; the status was left as is.
    AlreadySettled(EventStatus),
}

/// Ties an upload to the detection generation it was started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionToken(u64);

/// Ties a goal submission to the recommendation generation it was started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecommendationToken(u64);

/// Whether a remote response was applied or dropped as outdated.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied<T> {
    Fresh(T),
    Stale,
}

impl<T> Applied<T> {
    pub fn is_stale(&self) -> bool {
        matches!(self, Applied::Stale)
    }
}

/// Profile data sent alongside a goal list.
#[derive(Debug, Clone)]
pub struct RecommendationContext {
    pub user_id: String,
    pub risk_profile: RiskProfile,
    pub monthly_surplus: Option<u64>,
}

/// A validated goal submission waiting on the recommendation service.
#[derive(Debug, Clone)]
pub struct PendingRecommendation {
    pub token: RecommendationToken,
    pub goals: Vec<Goal>,
    pub request: RecommendationRequest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerSnapshot {
    pub version: u32,
    pub next_event_seq: u64,
    pub events: Vec<LifeEvent>,
    pub current_event_id: Option<String>,
    pub detection: Option<DetectionResult>,
    pub active_goals: Vec<Goal>,
    pub recommendation: Option<RecommendationResponse>,
}

/// Owns the event list, the current event, the last detection and the
/// active goal set. All mutation goes through the methods below.
#[derive(Debug, Clone)]
pub struct Planner {
    events: Vec<LifeEvent>,
    next_event_seq: u64,
    current_event_id: Option<String>,
    detection: Option<DetectionResult>,
    active_goals: Vec<Goal>,
    recommendation: Option<RecommendationResponse>,
    detection_gen: u64,
    recommendation_gen: u64,
}

impl Default for Planner {
    fn default() -> Self {
        Self::seeded()
    }
}

fn next_seq_after(events: &[LifeEvent]) -> u64 {
    events
        .iter()
        .filter_map(|e| e.id.strip_prefix("event-")?.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

impl Planner {
    pub fn new(events: Vec<LifeEvent>) -> Self {
        Self {
            next_event_seq: next_seq_after(&events),
            events,
            current_event_id: None,
            detection: None,
            active_goals: Vec::new(),
            recommendation: None,
            detection_gen: 0,
            recommendation_gen: 0,
        }
    }

    /// Planner holding the built-in sample events.
    pub fn seeded() -> Self {
        Self::new(catalog::seed_events())
    }

    pub fn from_snapshot(snapshot: PlannerSnapshot) -> Self {
        let floor = next_seq_after(&snapshot.events);
        Self {
            next_event_seq: snapshot.next_event_seq.max(floor),
            events: snapshot.events,
            current_event_id: snapshot.current_event_id,
            detection: snapshot.detection,
            active_goals: snapshot.active_goals,
            recommendation: snapshot.recommendation,
            detection_gen: 0,
            recommendation_gen: 0,
        }
    }

    pub fn snapshot(&self) -> PlannerSnapshot {
        PlannerSnapshot {
            version: 1,
            next_event_seq: self.next_event_seq,
            events: self.events.clone(),
            current_event_id: self.current_event_id.clone(),
            detection: self.detection.clone(),
            active_goals: self.active_goals.clone(),
            recommendation: self.recommendation.clone(),
        }
    }

    pub fn events(&self) -> &[LifeEvent] {
        &self.events
    }

    pub fn event(&self, id: &str) -> Option<&LifeEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// The list as it should be rendered, given the last detection.
    pub fn displayed_events(&self) -> Vec<&LifeEvent> {
        reconcile_events(&self.events, self.detection.as_ref())
    }

    pub fn detection(&self) -> Option<&DetectionResult> {
        self.detection.as_ref()
    }

    pub fn current_event(&self) -> Option<&LifeEvent> {
        self.current_event_id.as_deref().and_then(|id| self.event(id))
    }

    /// Marks an event as the one the goal step is about.
    pub fn select_event(&mut self, id: &str) -> Option<&LifeEvent> {
        let pos = self.events.iter().position(|e| e.id == id)?;
        self.current_event_id = Some(id.to_string());
        self.events.get(pos)
    }

    pub fn active_goals(&self) -> &[Goal] {
        &self.active_goals
    }

    pub fn recommendation(&self) -> Option<&RecommendationResponse> {
        self.recommendation.as_ref()
    }

    pub fn plan(&self) -> PortfolioPlan {
        PortfolioPlan::new(&self.active_goals, self.recommendation.as_ref())
    }

    fn next_id(&mut self) -> String {
        let id = format!("event-{}", self.next_event_seq);
        self.next_event_seq += 1;
        id
    }

    pub fn add_manual_event(&mut self, form: ManualEvent, today: NaiveDate) -> &LifeEvent {
        let id = self.next_id();
        info!(%id, event_type = %form.event_type, "planner.add_manual");
        self.events.push(LifeEvent {
            id,
            title: form.title,
            event_type: form.event_type,
            explanation: form.explanation,
            detailed_explanation: form.detailed_explanation,
            detected_date: form.detected_date.unwrap_or(today),
            confidence: 0,
            status: EventStatus::Pending,
            is_manually_added: true,
        });
        &self.events[self.events.len() - 1]
    }

    /// Appends an event for a detection result and makes it current.
    /// No de-duplication against existing events of the same type.
    pub fn add_detected_event(&mut self, detection: &DetectionResult, today: NaiveDate) -> &LifeEvent {
        let id = self.next_id();
        info!(%id, event_type = %detection.event_type, "planner.add_detected");
        self.events.push(LifeEvent {
            id: id.clone(),
            title: detection.event_type.detected_title().to_string(),
            event_type: detection.event_type.clone(),
            explanation: DETECTED_EXPLANATION.to_string(),
            detailed_explanation: Some(detection.reasoning.clone()),
            detected_date: today,
            confidence: DETECTED_CONFIDENCE,
            status: EventStatus::Pending,
            is_manually_added: false,
        });
        self.detection = Some(detection.clone());
        self.current_event_id = Some(id);
        &self.events[self.events.len() - 1]
    }

    fn transition(&mut self, id: &str, to: EventStatus) -> Transition {
        let Some(ev) = self.events.iter_mut().find(|e| e.id == id) else {
            debug!(id, %to, "planner.transition.not_found");
            return Transition::NotFound;
        };
        if ev.status.is_terminal() {
            warn!(id, from = %ev.status, %to, "planner.transition.settled");
            return Transition::AlreadySettled(ev.status);
        }
        ev.status = to;
        info!(id, %to, "planner.transition");
        Transition::Applied
    }

    /// pending -> confirmed. Opening the goal step is up to the caller.
    pub fn confirm_event(&mut self, id: &str) -> Transition {
        self.transition(id, EventStatus::Confirmed)
    }

    pub fn reject_event(&mut self, id: &str) -> Transition {
        self.transition(id, EventStatus::Rejected)
    }

    /// Starts an upload. Only the newest upload's result is applied.
    pub fn begin_detection(&mut self) -> DetectionToken {
        self.detection_gen += 1;
        DetectionToken(self.detection_gen)
    }

    fn begin_recommendation(&mut self) -> RecommendationToken {
        self.recommendation_gen += 1;
        RecommendationToken(self.recommendation_gen)
    }

    /// Drops interest in any in-flight call, e.g. when its view closes.
    pub fn invalidate_pending(&mut self) {
        self.detection_gen += 1;
        self.recommendation_gen += 1;
    }

    /// Applies an upload result. `None` (nothing detected) changes nothing.
    pub fn apply_detection(
        &mut self,
        token: DetectionToken,
        detection: Option<DetectionResult>,
        today: NaiveDate,
    ) -> Applied<Option<LifeEvent>> {
        if token.0 != self.detection_gen {
            info!("planner.detection.stale");
            return Applied::Stale;
        }
        Applied::Fresh(detection.map(|d| self.add_detected_event(&d, today).clone()))
    }

    /// Validates a selection and freezes the goal list to submit.
    /// Fails before any network traffic when nothing is selected.
    pub fn prepare_recommendation(
        &mut self,
        selection: &GoalSelection,
        ctx: &RecommendationContext,
    ) -> Result<PendingRecommendation, PlannerError> {
        let goals = selection.build_goals()?;
        let request = RecommendationRequest {
            user_id: ctx.user_id.clone(),
            risk_profile: ctx.risk_profile,
            monthly_surplus: ctx.monthly_surplus,
            goals: goals.iter().map(GoalRequest::from).collect(),
        };
        Ok(PendingRecommendation { token: self.begin_recommendation(), goals, request })
    }

    /// On success the submitted goals become active; on failure nothing
    /// changes and the same selection can be resubmitted.
    pub fn apply_recommendation(
        &mut self,
        pending: PendingRecommendation,
        outcome: Result<RecommendationResponse, PlannerError>,
    ) -> Result<Applied<()>, PlannerError> {
        if pending.token.0 != self.recommendation_gen {
            info!("planner.recommendation.stale");
            return Ok(Applied::Stale);
        }
        let response = outcome?;
        info!(
            goals = pending.goals.len(),
            recommended = response.goals.len(),
            "planner.recommendation.applied"
        );
        self.active_goals = pending.goals;
        self.recommendation = Some(response);
        Ok(Applied::Fresh(()))
    }

    pub async fn submit_goal_selection<B: PlanningBackend + ?Sized>(
        &mut self,
        backend: &B,
        selection: &GoalSelection,
        ctx: &RecommendationContext,
    ) -> Result<Applied<()>, PlannerError> {
        let pending = self.prepare_recommendation(selection, ctx)?;
        let outcome = backend.recommend(&pending.request).await;
        self.apply_recommendation(pending, outcome)
    }

    /// Uploads a statement and records any detected event.
    pub async fn detect_from_statement<B: PlanningBackend + ?Sized>(
        &mut self,
        backend: &B,
        statement: &Path,
        today: NaiveDate,
    ) -> Result<Applied<Option<LifeEvent>>, PlannerError> {
        let token = self.begin_detection();
        let detection = backend.detect_event(statement).await?;
        Ok(self.apply_detection(token, detection, today))
    }
}

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn load(&self) -> Result<Option<PlannerSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let st = serde_json::from_str(&raw)?;
        Ok(Some(st))
    }

    /// Loads the saved planner, or a freshly seeded one.
    pub fn load_planner(&self) -> Result<Planner> {
        Ok(self.load()?.map(Planner::from_snapshot).unwrap_or_default())
    }

    pub fn save(&self, planner: &Planner) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&planner.snapshot())?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}
