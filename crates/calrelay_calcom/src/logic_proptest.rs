#[cfg(test)]
mod tests {
    use crate::logic::{filter_by_min_duration, reshape_availability};
    use crate::test_support::event_type;
    use crate::client::SlotMap;
    use proptest::prelude::*;

    // Event types with lengths between 5 minutes and 4 hours
    fn event_types_strategy() -> impl Strategy<Value = Vec<(String, i64)>> {
        prop::collection::vec(("[a-z]{1,8}", 5..240i64), 0..12)
    }

    proptest! {
        // Every kept event type meets the minimum and none meeting it is dropped
        #[test]
        fn test_filter_keeps_exactly_long_enough_types(
            raw in event_types_strategy(),
            min_duration in -30.0..300.0f64,
        ) {
            let all: Vec<_> = raw.iter().map(|(slug, len)| event_type(slug, *len)).collect();
            let kept = filter_by_min_duration(all.clone(), min_duration);

            for event in &kept {
                prop_assert!(event.length_in_minutes as f64 >= min_duration);
            }
            let expected: Vec<_> = all
                .into_iter()
                .filter(|e| e.length_in_minutes as f64 >= min_duration)
                .collect();
            prop_assert_eq!(kept, expected);
        }

        // A zero minimum keeps everything, in order
        #[test]
        fn test_zero_minimum_keeps_all(raw in event_types_strategy()) {
            let all: Vec<_> = raw.iter().map(|(slug, len)| event_type(slug, *len)).collect();
            prop_assert_eq!(filter_by_min_duration(all.clone(), 0.0), all);
        }

        // Reshaping loses no start time and keeps each day's order
        #[test]
        fn test_reshape_preserves_every_start_time(
            days in prop::collection::btree_map(
                "2025-0[1-9]-[12][0-9]",
                prop::collection::vec("T[0-9]{2}:[0-5]0", 0..6),
                0..8,
            )
        ) {
            let slots: SlotMap = days.clone();
            let reshaped = reshape_availability(slots);

            prop_assert_eq!(reshaped.len(), days.len());
            for (day, (date, times)) in reshaped.iter().zip(days.iter()) {
                prop_assert_eq!(&day.date, date);
                prop_assert_eq!(&day.availability, times);
            }
        }
    }
}
