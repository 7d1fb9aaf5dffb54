use anyhow::{anyhow, Result};
use chrono::NaiveDate;

/// Today's calendar date in the configured timezone.
pub fn today(tz: &str) -> Result<NaiveDate> {
    let tz: chrono_tz::Tz = tz.parse().map_err(|_| anyhow!("invalid tz: {tz}"))?;
    Ok(chrono::Utc::now().with_timezone(&tz).date_naive())
}
