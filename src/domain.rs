use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Life event categories understood by the goal catalog.
///
/// Serialized as the camelCase labels the analysis service emits
/// (`newBaby`, `jobChange`, ...). Unknown labels are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum EventType {
    NewBaby,
    #[default]
    JobChange,
    Wedding,
    HomePurchase,
    Other(String),
}

impl EventType {
    pub fn label(&self) -> &str {
        match self {
            EventType::NewBaby => "newBaby",
            EventType::JobChange => "jobChange",
            EventType::Wedding => "wedding",
            EventType::HomePurchase => "homePurchase",
            EventType::Other(label) => label,
        }
    }

    /// Card title used for events synthesized from a detection result.
    pub fn detected_title(&self) -> &'static str {
        match self {
            EventType::NewBaby => "New Baby Detected",
            EventType::JobChange => "Job Change Detected",
            EventType::Wedding => "Wedding Planning Detected",
            EventType::HomePurchase => "Home Purchase Detected",
            EventType::Other(_) => "Event Detected",
        }
    }
}

impl From<&str> for EventType {
    fn from(label: &str) -> Self {
        match label {
            "newBaby" => EventType::NewBaby,
            "jobChange" => EventType::JobChange,
            "wedding" => EventType::Wedding,
            "homePurchase" => EventType::HomePurchase,
            other => EventType::Other(other.to_string()),
        }
    }
}

/// Strict parse for user input: only the four known labels are accepted.
impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match EventType::from(s.trim()) {
            EventType::Other(label) => Err(format!(
                "unknown event type: {label} (expected newBaby, jobChange, wedding or homePurchase)"
            )),
            known => Ok(known),
        }
    }
}

impl From<String> for EventType {
    fn from(label: String) -> Self {
        match EventType::from(label.as_str()) {
            EventType::Other(_) => EventType::Other(label),
            known => known,
        }
    }
}

impl From<EventType> for String {
    fn from(value: EventType) -> Self {
        match value {
            EventType::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// `pending -> confirmed | rejected`; both outcomes are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
}

impl EventStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, EventStatus::Pending)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventStatus::Pending => "pending",
            EventStatus::Confirmed => "confirmed",
            EventStatus::Rejected => "rejected",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeEvent {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_explanation: Option<String>,
    pub detected_date: NaiveDate,
    /// 0-100. Only meaningful for auto-detected events.
    pub confidence: u8,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub is_manually_added: bool,
}

impl LifeEvent {
    /// Confidence as shown to the user; hidden for manual entries.
    pub fn displayed_confidence(&self) -> Option<u8> {
        if self.is_manually_added {
            None
        } else {
            Some(self.confidence)
        }
    }
}

/// Integer percentages across the four asset buckets. Expected to sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Allocation {
    pub equity: u8,
    pub debt: u8,
    pub gold: u8,
    pub liquid: u8,
}

impl Allocation {
    pub const fn new(equity: u8, debt: u8, gold: u8, liquid: u8) -> Self {
        Self { equity, debt, gold, liquid }
    }

    pub fn total(&self) -> u16 {
        u16::from(self.equity) + u16::from(self.debt) + u16::from(self.gold) + u16::from(self.liquid)
    }

    /// Converts a 0-1 fractional split (as returned by the recommendation
    /// service) into rounded percentages.
    pub fn from_fractions(fractions: &FractionalAllocation) -> Self {
        fn pct(x: f64) -> u8 {
            (x * 100.0).round().clamp(0.0, 100.0) as u8
        }
        Self {
            equity: pct(fractions.equity),
            debt: pct(fractions.debt),
            gold: pct(fractions.gold),
            liquid: pct(fractions.liquid),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FractionalAllocation {
    #[serde(default)]
    pub equity: f64,
    #[serde(default)]
    pub debt: f64,
    #[serde(default)]
    pub gold: f64,
    #[serde(default)]
    pub liquid: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    pub name: String,
    pub related_event_types: Vec<EventType>,
    pub target_amount: u64,
    /// Years, at least 1.
    pub timeframe: u32,
    #[serde(rename = "monthlySIP")]
    pub monthly_sip: u64,
    pub allocation: Allocation,
    pub rationale: String,
}

/// Output of the bank-statement analysis: which event it thinks happened and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionResult {
    #[serde(rename = "eventName")]
    pub event_type: EventType,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskProfile {
    Aggressive,
    #[default]
    Moderate,
    Conservative,
}

impl RiskProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskProfile::Aggressive => "aggressive",
            RiskProfile::Moderate => "moderate",
            RiskProfile::Conservative => "conservative",
        }
    }
}

impl FromStr for RiskProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "aggressive" => Ok(RiskProfile::Aggressive),
            "moderate" => Ok(RiskProfile::Moderate),
            "conservative" => Ok(RiskProfile::Conservative),
            other => Err(format!("unknown risk profile: {other}")),
        }
    }
}

impl fmt::Display for RiskProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}
