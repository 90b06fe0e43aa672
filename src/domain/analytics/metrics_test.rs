#[cfg(test)]
mod tests {
    use crate::domain::analytics::metrics::{compute_metrics, ReportingPeriod};
    use crate::domain::foundation::{
        CurrencyCode, CustomerId, Money, RevenueEventId, TenantId, Timestamp,
    };
    use crate::domain::revenue::{EventSource, RevenueEvent, RevenueEventType, RevenueStream};

    fn usd(cents: i64) -> Money {
        Money::from_cents(cents, CurrencyCode::USD)
    }

    fn event(
        id: &str,
        event_type: RevenueEventType,
        cents: i64,
        customer: Option<CustomerId>,
        stream: RevenueStream,
        at: Timestamp,
    ) -> RevenueEvent {
        let mut e = RevenueEvent::new(
            RevenueEventId::new(id).unwrap(),
            TenantId::new(),
            event_type,
            usd(cents),
            at,
            EventSource::Internal,
        )
        .unwrap()
        .with_stream(stream);
        if let Some(c) = customer {
            e = e.with_customer(c);
        }
        e
    }

    fn month_of(now: Timestamp) -> ReportingPeriod {
        ReportingPeriod::trailing_days(now, 30)
    }

    #[test]
    fn totals_recurring_and_streams_reduce_correctly() {
        let now = Timestamp::now();
        let in_window = now.minus_days(5);
        let customer = CustomerId::new();

        let events = vec![
            event(
                "created-1",
                RevenueEventType::SubscriptionCreated,
                150_000,
                Some(customer),
                RevenueStream::WhiteLabel,
                in_window,
            ),
            event(
                "setup-1",
                RevenueEventType::SetupFee,
                100_000,
                Some(customer),
                RevenueStream::WhiteLabel,
                in_window,
            ),
            event(
                "usage-1",
                RevenueEventType::UsageCharge,
                500,
                Some(customer),
                RevenueStream::Api,
                in_window,
            ),
        ];

        let metrics = compute_metrics(&events, month_of(now), CurrencyCode::USD).unwrap();

        assert_eq!(metrics.total_revenue, usd(250_500));
        assert_eq!(metrics.recurring_revenue, usd(150_000));
        assert_eq!(metrics.customer_count, 1);
        assert_eq!(metrics.arpu, usd(250_500));
        assert_eq!(metrics.by_stream.white_label, usd(250_000));
        assert_eq!(metrics.by_stream.api, usd(500));
        assert_eq!(metrics.by_stream.consumer, usd(0));
    }

    #[test]
    fn events_outside_window_are_ignored() {
        let now = Timestamp::now();
        let events = vec![event(
            "old-1",
            RevenueEventType::SubscriptionRenewed,
            150_000,
            Some(CustomerId::new()),
            RevenueStream::Consumer,
            now.minus_days(45),
        )];

        let metrics = compute_metrics(&events, month_of(now), CurrencyCode::USD).unwrap();
        assert!(metrics.total_revenue.is_zero());
        assert_eq!(metrics.customer_count, 0);
        assert!(metrics.arpu.is_zero());
    }

    #[test]
    fn refunds_subtract_from_totals() {
        let now = Timestamp::now();
        let customer = CustomerId::new();
        let mut refund = RevenueEvent::new(
            RevenueEventId::new("refund-1").unwrap(),
            TenantId::new(),
            RevenueEventType::Refund,
            usd(-50_000),
            now.minus_days(2),
            EventSource::PaymentProcessor,
        )
        .unwrap();
        refund = refund.with_customer(customer);

        let events = vec![
            event(
                "renewal-1",
                RevenueEventType::SubscriptionRenewed,
                150_000,
                Some(customer),
                RevenueStream::Consumer,
                now.minus_days(3),
            ),
            refund,
        ];

        let metrics = compute_metrics(&events, month_of(now), CurrencyCode::USD).unwrap();
        assert_eq!(metrics.total_revenue, usd(100_000));
        assert_eq!(metrics.recurring_revenue, usd(150_000));
    }

    #[test]
    fn duplicate_ids_count_once() {
        let now = Timestamp::now();
        let customer = CustomerId::new();
        let e = event(
            "renewal-1",
            RevenueEventType::SubscriptionRenewed,
            150_000,
            Some(customer),
            RevenueStream::Consumer,
            now.minus_days(3),
        );

        let once = compute_metrics(&[e.clone()], month_of(now), CurrencyCode::USD).unwrap();
        let twice =
            compute_metrics(&[e.clone(), e], month_of(now), CurrencyCode::USD).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn permuted_event_order_produces_identical_metrics() {
        let now = Timestamp::now();
        let customer_a = CustomerId::new();
        let customer_b = CustomerId::new();

        let events = vec![
            event(
                "renewal-a",
                RevenueEventType::SubscriptionRenewed,
                150_000,
                Some(customer_a),
                RevenueStream::Consumer,
                now.minus_days(9),
            ),
            event(
                "renewal-b",
                RevenueEventType::SubscriptionRenewed,
                50_000,
                Some(customer_b),
                RevenueStream::WhiteLabel,
                now.minus_days(4),
            ),
            event(
                "usage-b",
                RevenueEventType::UsageCharge,
                777,
                Some(customer_b),
                RevenueStream::Api,
                now.minus_days(1),
            ),
        ];

        let forward = compute_metrics(&events, month_of(now), CurrencyCode::USD).unwrap();
        let mut reversed = events.clone();
        reversed.reverse();
        let backward = compute_metrics(&reversed, month_of(now), CurrencyCode::USD).unwrap();

        assert_eq!(forward, backward);
    }

    #[test]
    fn arpu_divides_half_even_across_customers() {
        let now = Timestamp::now();
        let events = vec![
            event(
                "renewal-a",
                RevenueEventType::SubscriptionRenewed,
                101,
                Some(CustomerId::new()),
                RevenueStream::Consumer,
                now.minus_days(1),
            ),
            event(
                "renewal-b",
                RevenueEventType::SubscriptionRenewed,
                0,
                Some(CustomerId::new()),
                RevenueStream::Consumer,
                now.minus_days(1),
            ),
        ];

        let metrics = compute_metrics(&events, month_of(now), CurrencyCode::USD).unwrap();
        // 101 / 2 = 50.5 -> 50 (half to even).
        assert_eq!(metrics.arpu, usd(50));
    }

    #[test]
    fn other_currencies_are_excluded() {
        let now = Timestamp::now();
        let eur = CurrencyCode::new("EUR").unwrap();
        let foreign = RevenueEvent::new(
            RevenueEventId::new("renewal-eur").unwrap(),
            TenantId::new(),
            RevenueEventType::SubscriptionRenewed,
            Money::from_cents(90_000, eur),
            now.minus_days(2),
            EventSource::Internal,
        )
        .unwrap();

        let metrics = compute_metrics(&[foreign], month_of(now), CurrencyCode::USD).unwrap();
        assert!(metrics.total_revenue.is_zero());
    }
}
