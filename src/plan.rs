use crate::backend::RecommendationResponse;
use crate::domain::{Allocation, Goal};

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedGoal {
    pub goal: Goal,
    /// Allocation, SIP and rationale came from the recommendation service.
    pub recommended: bool,
}

/// Active goals with the service's recommendations laid over them.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioPlan {
    goals: Vec<PlannedGoal>,
    total_monthly_sip: f64,
}

impl PortfolioPlan {
    pub fn new(goals: &[Goal], recommendation: Option<&RecommendationResponse>) -> Self {
        let planned: Vec<PlannedGoal> = goals
            .iter()
            .map(|goal| {
                let mut goal = goal.clone();
                match recommendation.and_then(|r| r.find(&goal.name)) {
                    Some(rec) => {
                        goal.allocation = Allocation::from_fractions(&rec.adjusted_allocation);
                        goal.monthly_sip = rec.recommended_sip.max(0.0).round() as u64;
                        goal.rationale = rec.rationale.clone();
                        PlannedGoal { goal, recommended: true }
                    }
                    None => PlannedGoal { goal, recommended: false },
                }
            })
            .collect();

        // The header total follows the service when it answered at all.
        let total_monthly_sip = match recommendation {
            Some(r) => r.goals.iter().map(|g| g.recommended_sip).sum(),
            None => planned.iter().map(|p| p.goal.monthly_sip as f64).sum(),
        };

        Self { goals: planned, total_monthly_sip }
    }

    pub fn goals(&self) -> &[PlannedGoal] {
        &self.goals
    }

    pub fn total_monthly_sip(&self) -> f64 {
        self.total_monthly_sip
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }
}
