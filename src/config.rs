use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::domain::RiskProfile;
use crate::sip::DEFAULT_ANNUAL_RATE_PCT;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Backend
    pub backend_url: String,
    pub upload_path: String,
    pub http_timeout_secs: u64,

    // Profile
    pub user_id: String,
    pub risk_profile: RiskProfile,
    pub monthly_surplus: Option<u64>,
    pub annual_rate_pct: f64,

    // Runtime
    pub tz: String,
    pub log_json: bool,

    // Persistence
    pub state_path: String,
    pub prediction_path: String,
    pub dump_predictions: bool,
}

fn env_bool(var: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match var(key).map(|s| s.trim().to_lowercase()) {
        None => default,
        Some(v) if v.is_empty() => default,
        Some(v) if v == "1" || v == "true" || v == "yes" || v == "y" || v == "on" => true,
        Some(v) if v == "0" || v == "false" || v == "no" || v == "n" || v == "off" => false,
        Some(_) => default,
    }
}

/// Unset or blank is `None`; anything else must parse.
fn env_parse<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match var(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("invalid {key}: {raw}")),
        _ => Ok(None),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: "http://localhost:3000".to_string(),
            upload_path: "/hello".to_string(),
            http_timeout_secs: 30,
            user_id: "user123".to_string(),
            risk_profile: RiskProfile::Moderate,
            monthly_surplus: Some(50_000),
            annual_rate_pct: DEFAULT_ANNUAL_RATE_PCT,
            tz: "Asia/Kolkata".to_string(),
            log_json: false,
            state_path: "./finplan-state.json".to_string(),
            prediction_path: "./data/prediction.json".to_string(),
            dump_predictions: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let d = Self::default();

        // Backend
        let backend_url = var("FINPLAN_BACKEND_URL").unwrap_or(d.backend_url);
        let upload_path = var("FINPLAN_UPLOAD_PATH").unwrap_or(d.upload_path);
        let http_timeout_secs =
            env_parse::<u64>(&var, "FINPLAN_HTTP_TIMEOUT_SECS")?.unwrap_or(d.http_timeout_secs);
        if http_timeout_secs == 0 {
            return Err(anyhow!("FINPLAN_HTTP_TIMEOUT_SECS must be greater than 0"));
        }

        // Profile
        let user_id = var("FINPLAN_USER_ID").unwrap_or(d.user_id);
        let risk_profile = match var("FINPLAN_RISK_PROFILE") {
            Some(raw) => raw.parse::<RiskProfile>().map_err(|e| anyhow!(e))?,
            None => d.risk_profile,
        };
        // set but blank means "no surplus"
        let monthly_surplus = match var("FINPLAN_MONTHLY_SURPLUS") {
            Some(_) => env_parse::<u64>(&var, "FINPLAN_MONTHLY_SURPLUS")?,
            None => d.monthly_surplus,
        };
        let annual_rate_pct =
            env_parse::<f64>(&var, "FINPLAN_ANNUAL_RATE_PCT")?.unwrap_or(d.annual_rate_pct);
        if !annual_rate_pct.is_finite() || annual_rate_pct < 0.0 {
            return Err(anyhow!("FINPLAN_ANNUAL_RATE_PCT must be a non-negative number"));
        }

        // Runtime
        let tz = var("FINPLAN_TZ").unwrap_or(d.tz);
        let log_json = env_bool(&var, "FINPLAN_LOG_JSON", d.log_json);

        // Persistence
        let state_path = var("FINPLAN_STATE_PATH").unwrap_or(d.state_path);
        let prediction_path = var("FINPLAN_PREDICTION_PATH").unwrap_or(d.prediction_path);
        let dump_predictions = env_bool(&var, "FINPLAN_DUMP_PREDICTIONS", d.dump_predictions);

        Ok(Self {
            backend_url,
            upload_path,
            http_timeout_secs,
            user_id,
            risk_profile,
            monthly_surplus,
            annual_rate_pct,
            tz,
            log_json,
            state_path,
            prediction_path,
            dump_predictions,
        })
    }
}
