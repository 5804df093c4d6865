// libs/scheduling-cell/src/services/conflict.rs
//
// Pure overlap testing. No I/O, no locking; safe to call from anywhere.

use crate::time::TimeRange;

/// True when the candidate strictly overlaps any of the existing
/// intervals. Half-open semantics throughout: `[09:00, 09:30)` and
/// `[09:30, 10:00)` never conflict. Short-circuits on the first hit.
pub fn has_conflict(candidate: &TimeRange, existing: &[TimeRange]) -> bool {
    existing.iter().any(|range| candidate.overlaps(range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::{TimeOfDay, TimeRange};

    fn range(start: &str, end: &str) -> TimeRange {
        TimeRange::new(start.parse::<TimeOfDay>().unwrap(), end.parse().unwrap()).unwrap()
    }

    #[test]
    fn empty_set_never_conflicts() {
        assert!(!has_conflict(&range("09:00", "09:30"), &[]));
    }

    #[test]
    fn detects_partial_overlap() {
        let existing = vec![range("09:00", "09:30")];
        assert!(has_conflict(&range("09:15", "09:45"), &existing));
    }

    #[test]
    fn detects_containment_both_directions() {
        let existing = vec![range("09:00", "10:00")];
        assert!(has_conflict(&range("09:15", "09:45"), &existing));

        let existing = vec![range("09:15", "09:45")];
        assert!(has_conflict(&range("09:00", "10:00"), &existing));
    }

    #[test]
    fn adjacency_is_not_a_conflict() {
        let existing = vec![range("09:00", "09:30"), range("10:00", "10:30")];
        assert!(!has_conflict(&range("09:30", "10:00"), &existing));
    }

    #[test]
    fn identical_interval_conflicts() {
        let existing = vec![range("09:00", "09:30")];
        assert!(has_conflict(&range("09:00", "09:30"), &existing));
    }
}
