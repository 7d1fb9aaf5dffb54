use chrono::NaiveDate;

use crate::domain::{Allocation, EventStatus, EventType, Goal, LifeEvent};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn seed(
    id: &str,
    title: &str,
    event_type: EventType,
    explanation: &str,
    detail: &str,
    detected_date: NaiveDate,
    confidence: u8,
) -> LifeEvent {
    LifeEvent {
        id: id.into(),
        title: title.into(),
        event_type,
        explanation: explanation.into(),
        detailed_explanation: Some(detail.into()),
        detected_date,
        confidence,
        status: EventStatus::Pending,
        is_manually_added: false,
    }
}

/// Events shown before any statement has been analysed.
pub fn seed_events() -> Vec<LifeEvent> {
    vec![
        seed(
            "event-1",
            "New Baby",
            EventType::NewBaby,
            "Spending on baby products increased 3x last month. Multiple purchases from baby stores detected.",
            "Spending at baby stores rose sharply over the past 45 days, alongside repeated \
             purchases of infant essentials. The pattern points to a recent or upcoming arrival.",
            date(2023, 11, 15),
            85,
        ),
        seed(
            "event-2",
            "Job Change",
            EventType::JobChange,
            "Salary deposit pattern changed. New employer name detected in transactions.",
            "The regular salary credit from the previous employer stopped in October and a \
             deposit from a new employer appeared in November, together with spending on work \
             equipment. This indicates a recent job change.",
            date(2023, 12, 1),
            92,
        ),
        seed(
            "event-3",
            "Wedding Planning",
            EventType::Wedding,
            "Multiple payments to wedding venues and services detected in the last 2 months.",
            "Payments to venues, caterers and jewellers over the past 60 days suggest a wedding \
             is being planned in the near future.",
            date(2023, 10, 22),
            78,
        ),
        seed(
            "event-4",
            "Home Purchase",
            EventType::HomePurchase,
            "Large down payment transaction detected. Recurring mortgage payments started.",
            "A large outflow to a property developer was followed by the start of monthly \
             home loan EMI debits. This indicates a recent home purchase.",
            date(2023, 9, 5),
            95,
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn catalog_goal(
    id: &str,
    name: &str,
    related: &[EventType],
    target_amount: u64,
    timeframe: u32,
    monthly_sip: u64,
    allocation: Allocation,
    rationale: &str,
) -> Goal {
    Goal {
        id: id.into(),
        name: name.into(),
        related_event_types: related.to_vec(),
        target_amount,
        timeframe,
        monthly_sip,
        allocation,
        rationale: rationale.into(),
    }
}

/// Fixed catalog of goals offered once an event is confirmed.
pub fn goal_catalog() -> Vec<Goal> {
    use EventType::*;
    vec![
        catalog_goal(
            "goal-1",
            "Child Education Fund",
            &[NewBaby],
            2_000_000,
            15,
            5_500,
            Allocation::new(70, 20, 5, 5),
            "A 15-year horizon leaves room for equity-led growth, with debt and gold for stability.",
        ),
        catalog_goal(
            "goal-2",
            "Emergency Fund for Family",
            &[NewBaby, Wedding, HomePurchase],
            600_000,
            2,
            24_000,
            Allocation::new(20, 40, 10, 30),
            "A 2-year emergency reserve favours debt and liquid funds while keeping some growth.",
        ),
        catalog_goal(
            "goal-3",
            "Home Down Payment",
            &[Wedding, JobChange],
            1_500_000,
            3,
            38_000,
            Allocation::new(40, 40, 10, 10),
            "Over 3 years, equal equity and debt weights balance growth against stability.",
        ),
        catalog_goal(
            "goal-4",
            "Career Sabbatical Fund",
            &[JobChange],
            800_000,
            2,
            32_000,
            Allocation::new(30, 40, 10, 20),
            "A 2-year sabbatical fund prioritises debt and liquid holdings so cash is on hand.",
        ),
        catalog_goal(
            "goal-5",
            "Wedding Expenses",
            &[Wedding],
            1_200_000,
            1,
            95_000,
            Allocation::new(10, 50, 10, 30),
            "With a 1-year horizon the focus is capital preservation through debt and liquid funds.",
        ),
        catalog_goal(
            "goal-6",
            "Home Renovation",
            &[HomePurchase],
            500_000,
            1,
            40_000,
            Allocation::new(15, 45, 10, 30),
            "A 1-year renovation budget is kept mostly in debt and liquid funds.",
        ),
    ]
}

/// Catalog goals relevant to `event_type`, in catalog order.
pub fn goals_for_event(event_type: &EventType) -> Vec<Goal> {
    goal_catalog()
        .into_iter()
        .filter(|g| g.related_event_types.contains(event_type))
        .collect()
}
