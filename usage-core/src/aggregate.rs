//! Pure aggregation over reading sets: totals, daily averages, date/type
//! filtering and chart series. No I/O, no shared state; every function
//! operates only on its arguments so callers can recompute views on each
//! filter change.

use std::collections::BTreeMap;

use crate::domain::{ChartDataPoint, DateRange, Reading, Statistics, UtilityFilter, UtilityType};

/// Inclusive day count of a range: `|end - start| + 1`, so a degenerate
/// range (`start == end`) spans one day and a reversed range stays positive.
pub fn period_days(range: &DateRange) -> i64 {
    let r = range.normalized();
    (r.end - r.start).whole_days() + 1
}

/// Sum of `usage` over readings of the requested utility; 0 when none match.
/// Readings of other or unrecognized types are silently excluded.
pub fn total_usage(readings: &[Reading], utility: UtilityType) -> f64 {
    readings
        .iter()
        .filter(|r| r.utility_type == utility)
        .map(|r| r.usage)
        .sum()
}

/// Average daily usage over an externally supplied period length.
///
/// `period_days()` can never return 0, but callers may pass a period from
/// elsewhere, so a zero period yields 0 rather than dividing by it.
pub fn average_daily_usage(readings: &[Reading], utility: UtilityType, period_days: i64) -> f64 {
    if period_days == 0 {
        return 0.0;
    }
    total_usage(readings, utility) / period_days as f64
}

/// Totals and daily averages for all three utilities over one range. The
/// period is computed once; the result does not depend on input ordering.
pub fn statistics(readings: &[Reading], range: &DateRange) -> Statistics {
    let period_days = period_days(range);

    Statistics {
        total_electricity: total_usage(readings, UtilityType::Electricity),
        total_gas: total_usage(readings, UtilityType::Gas),
        total_water: total_usage(readings, UtilityType::Water),
        avg_electricity: average_daily_usage(readings, UtilityType::Electricity, period_days),
        avg_gas: average_daily_usage(readings, UtilityType::Gas, period_days),
        avg_water: average_daily_usage(readings, UtilityType::Water, period_days),
        period_days,
    }
}

/// Readings whose date falls in the closed interval of the (normalized)
/// range. Idempotent: re-filtering by the same range is a no-op.
pub fn filter_by_date_range(readings: &[Reading], range: &DateRange) -> Vec<Reading> {
    readings
        .iter()
        .filter(|r| range.contains(r.date))
        .cloned()
        .collect()
}

/// Identity for `UtilityFilter::All`, exact-match filter otherwise.
pub fn filter_by_utility(readings: &[Reading], filter: UtilityFilter) -> Vec<Reading> {
    match filter {
        UtilityFilter::All => readings.to_vec(),
        UtilityFilter::Only(utility) => readings
            .iter()
            .filter(|r| r.utility_type == utility)
            .cloned()
            .collect(),
    }
}

/// Chart series grouped by date, sorted ascending, one point per distinct
/// date. For duplicate `(date, type)` pairs the later reading in iteration
/// order wins; duplicates are overwritten, not summed, which can disagree
/// with `total_usage` over the same input. Unrecognized types are dropped.
pub fn chart_data(readings: &[Reading]) -> Vec<ChartDataPoint> {
    let mut grouped: BTreeMap<_, ChartDataPoint> = BTreeMap::new();

    for reading in readings {
        let slot = match reading.utility_type {
            UtilityType::Unknown => continue,
            known => known,
        };

        let point = grouped
            .entry(reading.date)
            .or_insert_with(|| ChartDataPoint::empty(reading.date));

        match slot {
            UtilityType::Electricity => point.electricity = Some(reading.usage),
            UtilityType::Gas => point.gas = Some(reading.usage),
            UtilityType::Water => point.water = Some(reading.usage),
            UtilityType::Unknown => unreachable!("filtered above"),
        }
    }

    grouped.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use time::{Date, OffsetDateTime};
    use uuid::Uuid;

    fn reading(date: Date, utility_type: UtilityType, usage: f64) -> Reading {
        Reading {
            id: Uuid::new_v4(),
            owner_id: Uuid::nil(),
            date,
            utility_type,
            usage,
            notes: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn sample() -> Vec<Reading> {
        vec![
            reading(date!(2024 - 01 - 01), UtilityType::Electricity, 10.0),
            reading(date!(2024 - 01 - 01), UtilityType::Gas, 5.0),
            reading(date!(2024 - 01 - 02), UtilityType::Electricity, 12.0),
        ]
    }

    #[test]
    fn degenerate_range_spans_one_day() {
        let d = date!(2024 - 03 - 15);
        assert_eq!(period_days(&DateRange::new(d, d)), 1);
    }

    #[test]
    fn reversed_range_yields_the_same_positive_period() {
        let fwd = DateRange::new(date!(2024 - 01 - 01), date!(2024 - 01 - 31));
        let rev = DateRange::new(date!(2024 - 01 - 31), date!(2024 - 01 - 01));
        assert_eq!(period_days(&fwd), 31);
        assert_eq!(period_days(&rev), 31);
    }

    #[test]
    fn total_usage_sums_only_the_requested_type() {
        let readings = sample();
        assert_eq!(total_usage(&readings, UtilityType::Electricity), 22.0);
        assert_eq!(total_usage(&readings, UtilityType::Gas), 5.0);
        assert_eq!(total_usage(&readings, UtilityType::Water), 0.0);
        assert_eq!(total_usage(&[], UtilityType::Gas), 0.0);
    }

    #[test]
    fn unknown_types_contribute_to_no_bucket() {
        let mut readings = sample();
        readings.push(reading(date!(2024 - 01 - 01), UtilityType::Unknown, 99.0));

        assert_eq!(total_usage(&readings, UtilityType::Electricity), 22.0);
        assert_eq!(total_usage(&readings, UtilityType::Gas), 5.0);
        assert_eq!(total_usage(&readings, UtilityType::Water), 0.0);
    }

    #[test]
    fn zero_period_guards_division() {
        let readings = sample();
        assert_eq!(
            average_daily_usage(&readings, UtilityType::Electricity, 0),
            0.0
        );
    }

    #[test]
    fn statistics_match_the_reference_scenario() {
        let readings = sample();
        let range = DateRange::new(date!(2024 - 01 - 01), date!(2024 - 01 - 02));

        let stats = statistics(&readings, &range);
        assert_eq!(stats.period_days, 2);
        assert_eq!(stats.total_electricity, 22.0);
        assert_eq!(stats.total_gas, 5.0);
        assert_eq!(stats.total_water, 0.0);
        assert_eq!(stats.avg_electricity, 11.0);
        assert_eq!(stats.avg_gas, 2.5);
        assert_eq!(stats.avg_water, 0.0);
    }

    #[test]
    fn date_filter_keeps_the_closed_interval_and_is_idempotent() {
        let mut readings = sample();
        readings.push(reading(date!(2023 - 12 - 31), UtilityType::Water, 3.0));
        let range = DateRange::new(date!(2024 - 01 - 01), date!(2024 - 01 - 02));

        let once = filter_by_date_range(&readings, &range);
        assert_eq!(once.len(), 3);
        assert!(once.iter().all(|r| r.date >= range.start));

        let twice = filter_by_date_range(&once, &range);
        assert_eq!(
            twice.iter().map(|r| r.id).collect::<Vec<_>>(),
            once.iter().map(|r| r.id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn reversed_range_filters_the_swapped_interval() {
        let readings = sample();
        let rev = DateRange::new(date!(2024 - 01 - 02), date!(2024 - 01 - 01));
        assert_eq!(filter_by_date_range(&readings, &rev).len(), 3);
    }

    #[test]
    fn utility_filter_all_is_identity() {
        let readings = sample();
        assert_eq!(filter_by_utility(&readings, UtilityFilter::All).len(), 3);

        let gas_only = filter_by_utility(&readings, UtilityFilter::Only(UtilityType::Gas));
        assert_eq!(gas_only.len(), 1);
        assert_eq!(gas_only[0].usage, 5.0);
    }

    #[test]
    fn chart_data_groups_by_date_and_sorts_ascending() {
        // Deliberately out of order on input.
        let readings = vec![
            reading(date!(2024 - 01 - 02), UtilityType::Electricity, 12.0),
            reading(date!(2024 - 01 - 01), UtilityType::Gas, 5.0),
            reading(date!(2024 - 01 - 01), UtilityType::Electricity, 10.0),
        ];

        let points = chart_data(&readings);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, date!(2024 - 01 - 01));
        assert_eq!(points[0].electricity, Some(10.0));
        assert_eq!(points[0].gas, Some(5.0));
        assert_eq!(points[0].water, None);
        assert_eq!(points[1].date, date!(2024 - 01 - 02));
        assert_eq!(points[1].electricity, Some(12.0));
    }

    #[test]
    fn chart_data_duplicate_date_type_pairs_are_last_write_wins() {
        let readings = vec![
            reading(date!(2024 - 01 - 01), UtilityType::Water, 2.0),
            reading(date!(2024 - 01 - 01), UtilityType::Water, 7.0),
        ];

        let points = chart_data(&readings);
        assert_eq!(points.len(), 1);
        // Overwritten, not summed; totals over the same input do sum.
        assert_eq!(points[0].water, Some(7.0));
        assert_eq!(total_usage(&readings, UtilityType::Water), 9.0);
    }
}
