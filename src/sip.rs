use crate::error::PlannerError;

/// Annual return assumed when sizing contributions locally.
pub const DEFAULT_ANNUAL_RATE_PCT: f64 = 12.0;

/// Monthly contribution needed to reach `target_amount` in `timeframe_years`.
///
/// `round(target / (months * (1 + monthly_rate)))`. This is a flat
/// approximation, not the future-value-of-annuity inversion; displayed
/// figures depend on it staying exactly this.
pub fn monthly_contribution(
    target_amount: u64,
    timeframe_years: u32,
    annual_rate_pct: f64,
) -> Result<u64, PlannerError> {
    if timeframe_years == 0 {
        return Err(PlannerError::invalid_input("timeframe must be at least 1 year"));
    }
    if !annual_rate_pct.is_finite() || annual_rate_pct < 0.0 {
        return Err(PlannerError::invalid_input(format!(
            "annual rate must be a non-negative number, got {annual_rate_pct}"
        )));
    }

    let monthly_rate = annual_rate_pct / 100.0 / 12.0;
    let months = f64::from(timeframe_years) * 12.0;
    let sip = target_amount as f64 / (months * (1.0 + monthly_rate));
    Ok(sip.round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_year_at_twelve_percent() {
        // 1_200_000 / (12 * 1.01) = 99009.9
        assert_eq!(monthly_contribution(1_200_000, 1, 12.0).unwrap(), 99_010);
    }

    #[test]
    fn fifteen_years_at_twelve_percent() {
        // 2_000_000 / (180 * 1.01) = 2_000_000 / 181.8 = 11001.1
        assert_eq!(monthly_contribution(2_000_000, 15, 12.0).unwrap(), 11_001);
    }

    #[test]
    fn zero_rate_is_plain_division() {
        assert_eq!(monthly_contribution(120_000, 1, 0.0).unwrap(), 10_000);
        assert_eq!(monthly_contribution(0, 5, DEFAULT_ANNUAL_RATE_PCT).unwrap(), 0);
    }

    #[test]
    fn zero_timeframe_is_rejected() {
        assert!(matches!(
            monthly_contribution(100_000, 0, 12.0),
            Err(PlannerError::InvalidInput(_))
        ));
        assert!(monthly_contribution(100_000, 1, f64::NAN).is_err());
    }

    #[test]
    fn non_decreasing_in_target_amount() {
        for years in [1u32, 2, 3, 7, 15, 30] {
            let mut prev = 0;
            for target in (0..=2_000_000u64).step_by(37_321) {
                let sip = monthly_contribution(target, years, DEFAULT_ANNUAL_RATE_PCT).unwrap();
                assert!(sip >= prev, "target={target} years={years}");
                prev = sip;
            }
        }
    }
}
