#[cfg(test)]
mod tests {
    use crate::domain::analytics::forecast::{forecast_mrr, ForecastParams};
    use crate::domain::foundation::{CurrencyCode, Money};

    fn usd(cents: i64) -> Money {
        Money::from_cents(cents, CurrencyCode::USD)
    }

    #[test]
    fn ten_percent_growth_compounds_per_period() {
        let forecast =
            forecast_mrr(usd(100_000), usd(110_000), 3, ForecastParams::default()).unwrap();

        assert_eq!(forecast.growth_permille, 100);
        assert_eq!(forecast.projected, vec![usd(121_000), usd(133_100), usd(146_410)]);
    }

    #[test]
    fn runaway_growth_is_clamped() {
        // 10x growth observed; clamp holds projection to +50% per period.
        let forecast =
            forecast_mrr(usd(10_000), usd(100_000), 2, ForecastParams::default()).unwrap();

        assert_eq!(forecast.growth_permille, 500);
        assert_eq!(forecast.projected, vec![usd(150_000), usd(225_000)]);
    }

    #[test]
    fn decline_is_clamped_symmetrically() {
        let forecast =
            forecast_mrr(usd(100_000), usd(10_000), 1, ForecastParams::default()).unwrap();

        assert_eq!(forecast.growth_permille, -500);
        assert_eq!(forecast.projected, vec![usd(5_000)]);
    }

    #[test]
    fn zero_previous_period_projects_flat() {
        let forecast = forecast_mrr(usd(0), usd(50_000), 2, ForecastParams::default()).unwrap();

        assert_eq!(forecast.growth_permille, 0);
        assert_eq!(forecast.projected, vec![usd(50_000), usd(50_000)]);
    }

    #[test]
    fn zero_periods_ahead_projects_nothing() {
        let forecast =
            forecast_mrr(usd(100_000), usd(110_000), 0, ForecastParams::default()).unwrap();
        assert!(forecast.projected.is_empty());
    }

    #[test]
    fn reruns_are_byte_identical() {
        let a = forecast_mrr(usd(100_000), usd(107_000), 6, ForecastParams::default()).unwrap();
        let b = forecast_mrr(usd(100_000), usd(107_000), 6, ForecastParams::default()).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn currency_mismatch_is_rejected() {
        let eur = Money::from_cents(1, CurrencyCode::new("EUR").unwrap());
        assert!(forecast_mrr(usd(100), eur, 1, ForecastParams::default()).is_err());
    }
}
