//! Property-based tests for the spot price recommender
//!
//! Histories are generated as a handful of zones, each with up to a few
//! dozen observations at minute offsets inside a two-day window.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use spotctl::pricing::stats::{mean, percentile};
use spotctl::pricing::{
    recency_weights, recommend, zone_risk, PriceHistory, PriceObservation, ZoneSeries,
};

fn window_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
}

fn zone_series(points: &[(u32, f64)]) -> ZoneSeries {
    points
        .iter()
        .map(|(minute, price)| {
            PriceObservation::new(*price, window_start() + Duration::minutes(i64::from(*minute)))
        })
        .collect()
}

fn arb_points() -> impl Strategy<Value = Vec<(u32, f64)>> {
    prop::collection::vec((0u32..2880, 0.001f64..5.0), 1..40)
}

fn arb_history() -> impl Strategy<Value = PriceHistory> {
    prop::collection::btree_map(
        prop::sample::select(vec![
            "us-east-1a",
            "us-east-1b",
            "us-east-1c",
            "us-east-1d",
            "us-east-1e",
            "us-east-1f",
        ]),
        arb_points(),
        1..6,
    )
    .prop_map(|zones| {
        zones
            .into_iter()
            .map(|(zone, points)| (zone.to_string(), zone_series(&points)))
            .collect()
    })
}

proptest! {
    #[test]
    fn test_recommend_is_deterministic(history in arb_history()) {
        let first = recommend(&history).unwrap();
        let second = recommend(&history).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_recommended_price_was_observed_in_zone(history in arb_history()) {
        let rec = recommend(&history).unwrap();
        let collapsed = history[&rec.zone].collapse();
        prop_assert!(
            collapsed.prices().contains(&rec.price),
            "price {} not among {:?}", rec.price, collapsed.prices()
        );
    }

    #[test]
    fn test_recommended_zone_has_lowest_risk(history in arb_history()) {
        let rec = recommend(&history).unwrap();
        let chosen = zone_risk(&history[&rec.zone].collapse().prices()).unwrap();
        for (zone, series) in &history {
            let risk = zone_risk(&series.collapse().prices()).unwrap();
            prop_assert!(chosen <= risk, "{} risk {} beats chosen {} risk {}", zone, risk, rec.zone, chosen);
            if risk == chosen {
                // ties go to the first zone by name
                prop_assert!(rec.zone.as_str() <= zone.as_str());
            }
        }
    }

    #[test]
    fn test_risk_bounds_mean_and_p99(prices in prop::collection::vec(0.001f64..5.0, 1..60)) {
        let risk = zone_risk(&prices).unwrap();
        prop_assert!(risk >= mean(&prices).unwrap() - 1e-12);
        prop_assert!(risk >= percentile(&prices, 99.0).unwrap());
    }

    #[test]
    fn test_raising_high_price_never_lowers_risk(
        prices in prop::collection::vec(0.001f64..5.0, 2..60),
        pick in any::<prop::sample::Index>(),
        raise in 0.01f64..2.0,
    ) {
        let avg = mean(&prices).unwrap();
        let high: Vec<usize> = (0..prices.len()).filter(|i| prices[*i] >= avg - 1e-12).collect();
        let k = high[pick.index(high.len())];

        let mut raised = prices.clone();
        raised[k] += raise;
        prop_assert!(zone_risk(&raised).unwrap() >= zone_risk(&prices).unwrap() - 1e-12);
    }

    #[test]
    fn test_later_spike_bids_at_least_as_high(
        n in 3usize..100,
        base in 0.01f64..1.0,
        factor in 1.01f64..5.0,
        early in any::<prop::sample::Index>(),
        late in any::<prop::sample::Index>(),
    ) {
        let (i, j) = (early.index(n), late.index(n));
        prop_assume!(i < j);

        let spiked_at = |pos: usize| -> PriceHistory {
            let points: Vec<(u32, f64)> = (0..n)
                .map(|t| (t as u32, if t == pos { base * factor } else { base }))
                .collect();
            [("us-east-1a".to_string(), zone_series(&points))].into_iter().collect()
        };

        let early_bid = recommend(&spiked_at(i)).unwrap().price;
        let late_bid = recommend(&spiked_at(j)).unwrap().price;
        prop_assert!(late_bid >= early_bid, "late {} < early {}", late_bid, early_bid);
    }

    #[test]
    fn test_lower_duplicates_do_not_change_result(
        history in arb_history(),
        discount in 0.1f64..0.9,
    ) {
        let before = recommend(&history).unwrap();

        // Re-report every observation at the same instant with a lower price;
        // collapsing keeps the maximum so nothing should change.
        let padded: PriceHistory = history
            .iter()
            .map(|(zone, series)| {
                let mut series = series.clone();
                for obs in history[zone].observations.clone() {
                    series.push(PriceObservation::new(obs.price * discount, obs.timestamp));
                }
                (zone.clone(), series)
            })
            .collect();

        prop_assert_eq!(recommend(&padded).unwrap(), before);
    }

    #[test]
    fn test_recency_weights_shape(n in 1usize..500) {
        let weights = recency_weights(n);
        prop_assert_eq!(weights.len(), n);
        let total: f64 = weights.iter().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        prop_assert!(weights.iter().all(|w| *w > 0.0));
        prop_assert!(weights.windows(2).all(|w| w[0] <= w[1] + 1e-15));
    }
}

#[test]
fn test_recent_spike_raises_bid() {
    // A modest spike early in the window is outweighed by recent flat prices;
    // the same spike near the end sets the bid.
    let flat = [0.10; 20];
    let mut early = flat;
    early[1] = 0.15;
    let mut late = flat;
    late[18] = 0.15;

    let to_history = |prices: &[f64]| -> PriceHistory {
        let points: Vec<(u32, f64)> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| (i as u32 * 60, *p))
            .collect();
        [("us-east-1a".to_string(), zone_series(&points))].into_iter().collect()
    };

    let early_bid = recommend(&to_history(&early)).unwrap().price;
    let late_bid = recommend(&to_history(&late)).unwrap().price;
    assert!((early_bid - 0.10).abs() < 1e-12, "early spike bid {}", early_bid);
    assert!((late_bid - 0.15).abs() < 1e-12, "late spike bid {}", late_bid);
}
