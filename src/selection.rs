use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog;
use crate::domain::{Allocation, EventType, Goal};
use crate::error::PlannerError;
use crate::sip::monthly_contribution;

pub const MIN_TIMEFRAME_YEARS: u32 = 1;
pub const MAX_TIMEFRAME_YEARS: u32 = 30;

pub const MIN_CUSTOM_TARGET: u64 = 50_000;
pub const MAX_CUSTOM_TARGET: u64 = 5_000_000;

const CUSTOM_GOAL_TARGET: u64 = 100_000;
const CUSTOM_GOAL_TIMEFRAME: u32 = 3;
const CUSTOM_GOAL_ALLOCATION: Allocation = Allocation::new(60, 30, 5, 5);
const CUSTOM_GOAL_RATIONALE: &str =
    "Personalized allocation based on your risk profile and timeline.";

/// User-chosen target and horizon for a selected catalog goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub target_amount: u64,
    pub timeframe: u32,
}

/// Partial edit of a custom goal; `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct CustomGoalUpdate {
    pub name: Option<String>,
    pub target_amount: Option<u64>,
    pub timeframe: Option<u32>,
    pub rationale: Option<String>,
}

/// Goal-selection step for one confirmed event.
///
/// Tracks which catalog goals are ticked, their adjustments, and any custom
/// goals. Nothing here talks to the network; `build_goals` produces the list
/// handed to the recommendation service.
#[derive(Debug, Clone)]
pub struct GoalSelection {
    event_type: EventType,
    annual_rate_pct: f64,
    available: Vec<Goal>,
    selected: Vec<String>,
    adjustments: HashMap<String, Adjustment>,
    custom: Vec<Goal>,
}

impl GoalSelection {
    pub fn for_event(event_type: &EventType, annual_rate_pct: f64) -> Self {
        Self {
            event_type: event_type.clone(),
            annual_rate_pct,
            available: catalog::goals_for_event(event_type),
            selected: Vec::new(),
            adjustments: HashMap::new(),
            custom: Vec::new(),
        }
    }

    pub fn event_type(&self) -> &EventType {
        &self.event_type
    }

    pub fn available_goals(&self) -> &[Goal] {
        &self.available
    }

    pub fn custom_goals(&self) -> &[Goal] {
        &self.custom
    }

    pub fn is_selected(&self, goal_id: &str) -> bool {
        self.selected.iter().any(|id| id == goal_id)
    }

    pub fn adjustment(&self, goal_id: &str) -> Option<Adjustment> {
        self.adjustments.get(goal_id).copied()
    }

    /// Nothing ticked and no custom goals.
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.custom.is_empty()
    }

    fn available_goal(&self, goal_id: &str) -> Result<&Goal, PlannerError> {
        self.available
            .iter()
            .find(|g| g.id == goal_id)
            .ok_or_else(|| {
                PlannerError::invalid_input(format!(
                    "goal {goal_id} is not offered for {} events",
                    self.event_type
                ))
            })
    }

    /// Flips selection of a catalog goal. Returns whether it is now selected.
    ///
    /// Selecting seeds the adjustment from the goal's own target and
    /// timeframe; deselecting discards it.
    pub fn toggle(&mut self, goal_id: &str) -> Result<bool, PlannerError> {
        let goal = self.available_goal(goal_id)?;
        let seeded = Adjustment { target_amount: goal.target_amount, timeframe: goal.timeframe };

        if self.is_selected(goal_id) {
            self.selected.retain(|id| id != goal_id);
            self.adjustments.remove(goal_id);
            debug!(goal_id, "selection.deselect");
            Ok(false)
        } else {
            self.selected.push(goal_id.to_string());
            self.adjustments.insert(goal_id.to_string(), seeded);
            debug!(goal_id, "selection.select");
            Ok(true)
        }
    }

    /// Sets target and horizon for a selected catalog goal.
    ///
    /// The target is clamped to half..double the catalog amount and the
    /// horizon to 1..=30 years, the same bounds the sliders enforce.
    pub fn adjust(
        &mut self,
        goal_id: &str,
        target_amount: u64,
        timeframe: u32,
    ) -> Result<Adjustment, PlannerError> {
        let goal = self.available_goal(goal_id)?;
        if !self.is_selected(goal_id) {
            return Err(PlannerError::invalid_input(format!(
                "goal {goal_id} must be selected before it can be adjusted"
            )));
        }

        let base = goal.target_amount as f64;
        let min = (base * 0.5).round() as u64;
        let max = (base * 2.0).round() as u64;
        let adj = Adjustment {
            target_amount: target_amount.clamp(min, max),
            timeframe: timeframe.clamp(MIN_TIMEFRAME_YEARS, MAX_TIMEFRAME_YEARS),
        };
        self.adjustments.insert(goal_id.to_string(), adj);
        Ok(adj)
    }

    /// Contribution the selected goal would need with its current adjustment.
    pub fn projected_sip(&self, goal_id: &str) -> Option<u64> {
        let adj = self.adjustments.get(goal_id)?;
        monthly_contribution(adj.target_amount, adj.timeframe, self.annual_rate_pct).ok()
    }

    /// Appends a blank custom goal with default amounts. Returns its index.
    pub fn add_custom_goal(&mut self) -> Result<usize, PlannerError> {
        let monthly_sip =
            monthly_contribution(CUSTOM_GOAL_TARGET, CUSTOM_GOAL_TIMEFRAME, self.annual_rate_pct)?;
        self.custom.push(Goal {
            id: String::new(),
            name: String::new(),
            related_event_types: vec![self.event_type.clone()],
            target_amount: CUSTOM_GOAL_TARGET,
            timeframe: CUSTOM_GOAL_TIMEFRAME,
            monthly_sip,
            allocation: CUSTOM_GOAL_ALLOCATION,
            rationale: CUSTOM_GOAL_RATIONALE.to_string(),
        });
        Ok(self.custom.len() - 1)
    }

    /// Applies an edit; the SIP is recomputed when amount or horizon change.
    /// The target is clamped to 50k..=5M and the horizon to 1..=30 years.
    pub fn update_custom_goal(
        &mut self,
        index: usize,
        update: CustomGoalUpdate,
    ) -> Result<&Goal, PlannerError> {
        let rate = self.annual_rate_pct;
        let goal = self
            .custom
            .get_mut(index)
            .ok_or_else(|| PlannerError::invalid_input(format!("no custom goal at {index}")))?;

        let target_amount = update
            .target_amount
            .unwrap_or(goal.target_amount)
            .clamp(MIN_CUSTOM_TARGET, MAX_CUSTOM_TARGET);
        let timeframe = update
            .timeframe
            .unwrap_or(goal.timeframe)
            .clamp(MIN_TIMEFRAME_YEARS, MAX_TIMEFRAME_YEARS);
        if update.target_amount.is_some() || update.timeframe.is_some() {
            goal.monthly_sip = monthly_contribution(target_amount, timeframe, rate)?;
            goal.target_amount = target_amount;
            goal.timeframe = timeframe;
        }
        if let Some(name) = update.name {
            goal.name = name;
        }
        if let Some(rationale) = update.rationale {
            goal.rationale = rationale;
        }
        Ok(goal)
    }

    pub fn remove_custom_goal(&mut self, index: usize) -> Result<Goal, PlannerError> {
        if index >= self.custom.len() {
            return Err(PlannerError::invalid_input(format!("no custom goal at {index}")));
        }
        Ok(self.custom.remove(index))
    }

    /// Selected catalog goals (catalog order, adjustments applied, SIP
    /// recomputed) followed by custom goals numbered `custom-goal-{i}`.
    pub fn build_goals(&self) -> Result<Vec<Goal>, PlannerError> {
        if self.is_empty() {
            return Err(PlannerError::EmptySelection);
        }

        let mut goals = Vec::with_capacity(self.selected.len() + self.custom.len());
        for goal in self.available.iter().filter(|g| self.is_selected(&g.id)) {
            let mut goal = goal.clone();
            if let Some(adj) = self.adjustments.get(&goal.id) {
                goal.target_amount = adj.target_amount;
                goal.timeframe = adj.timeframe;
                goal.monthly_sip =
                    monthly_contribution(adj.target_amount, adj.timeframe, self.annual_rate_pct)?;
            }
            goals.push(goal);
        }
        for (index, goal) in self.custom.iter().enumerate() {
            let mut goal = goal.clone();
            goal.id = format!("custom-goal-{index}");
            goals.push(goal);
        }
        Ok(goals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sip::DEFAULT_ANNUAL_RATE_PCT;

    fn wedding() -> GoalSelection {
        GoalSelection::for_event(&EventType::Wedding, DEFAULT_ANNUAL_RATE_PCT)
    }

    #[test]
    fn offers_only_related_goals() {
        let sel = wedding();
        let ids: Vec<_> = sel.available_goals().iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["goal-2", "goal-3", "goal-5"]);
    }

    #[test]
    fn empty_selection_is_refused() {
        assert!(matches!(wedding().build_goals(), Err(PlannerError::EmptySelection)));
    }

    #[test]
    fn toggle_seeds_and_clears_adjustment() {
        let mut sel = wedding();
        assert!(sel.toggle("goal-5").unwrap());
        assert_eq!(
            sel.adjustment("goal-5"),
            Some(Adjustment { target_amount: 1_200_000, timeframe: 1 })
        );
        assert!(!sel.toggle("goal-5").unwrap());
        assert_eq!(sel.adjustment("goal-5"), None);
        assert!(sel.is_empty());
    }

    #[test]
    fn goals_outside_the_event_cannot_be_selected() {
        let mut sel = wedding();
        assert!(matches!(sel.toggle("goal-1"), Err(PlannerError::InvalidInput(_))));
    }

    #[test]
    fn adjustments_are_clamped() {
        let mut sel = wedding();
        assert!(sel.adjust("goal-5", 1, 1).is_err());

        sel.toggle("goal-5").unwrap();
        let adj = sel.adjust("goal-5", 10, 99).unwrap();
        assert_eq!(adj, Adjustment { target_amount: 600_000, timeframe: 30 });
        let adj = sel.adjust("goal-5", 9_000_000, 0).unwrap();
        assert_eq!(adj, Adjustment { target_amount: 2_400_000, timeframe: 1 });
    }

    #[test]
    fn build_recomputes_catalog_sip_and_numbers_custom_goals() {
        let mut sel = wedding();
        sel.toggle("goal-5").unwrap();
        sel.toggle("goal-2").unwrap();
        sel.add_custom_goal().unwrap();
        sel.update_custom_goal(
            0,
            CustomGoalUpdate { name: Some("Honeymoon".into()), ..Default::default() },
        )
        .unwrap();

        let goals = sel.build_goals().unwrap();
        let ids: Vec<_> = goals.iter().map(|g| g.id.as_str()).collect();
        // catalog order, not click order
        assert_eq!(ids, ["goal-2", "goal-5", "custom-goal-0"]);
        assert_eq!(goals[1].monthly_sip, 99_010);
        assert_eq!(goals[2].name, "Honeymoon");
        assert_eq!(goals[2].related_event_types, vec![EventType::Wedding]);
    }

    #[test]
    fn custom_goal_sip_tracks_amount_and_timeframe() {
        let mut sel = wedding();
        let idx = sel.add_custom_goal().unwrap();
        let default_sip = monthly_contribution(100_000, 3, DEFAULT_ANNUAL_RATE_PCT).unwrap();
        assert_eq!(sel.custom_goals()[idx].monthly_sip, default_sip);
        assert_eq!(sel.custom_goals()[idx].allocation.total(), 100);

        let goal = sel
            .update_custom_goal(
                idx,
                CustomGoalUpdate { target_amount: Some(1_200_000), timeframe: Some(1), ..Default::default() },
            )
            .unwrap();
        assert_eq!(goal.monthly_sip, 99_010);
    }

    #[test]
    fn custom_goal_edits_are_clamped() {
        let mut sel = wedding();
        let idx = sel.add_custom_goal().unwrap();

        let goal = sel
            .update_custom_goal(
                idx,
                CustomGoalUpdate { target_amount: Some(10), timeframe: Some(0), ..Default::default() },
            )
            .unwrap();
        assert_eq!((goal.target_amount, goal.timeframe), (MIN_CUSTOM_TARGET, MIN_TIMEFRAME_YEARS));

        let goal = sel
            .update_custom_goal(
                idx,
                CustomGoalUpdate {
                    target_amount: Some(90_000_000),
                    timeframe: Some(99),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!((goal.target_amount, goal.timeframe), (MAX_CUSTOM_TARGET, MAX_TIMEFRAME_YEARS));
        assert_eq!(goal.monthly_sip, monthly_contribution(5_000_000, 30, DEFAULT_ANNUAL_RATE_PCT).unwrap());
    }

    #[test]
    fn removing_custom_goals() {
        let mut sel = wedding();
        sel.add_custom_goal().unwrap();
        assert!(sel.remove_custom_goal(3).is_err());
        sel.remove_custom_goal(0).unwrap();
        assert!(sel.is_empty());
    }
}
