// libs/scheduling-cell/tests/time_overlap_test.rs

use chrono::NaiveTime;
use proptest::prelude::*;

use scheduling_cell::services::overlap::{contains, overlaps};
use scheduling_cell::services::time::TimeValidator;

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

// ==============================================================================
// TIME VALIDATION
// ==============================================================================

#[test]
fn test_valid_times() {
    for value in ["00:00", "09:05", "9:05", "12:30", "23:59"] {
        assert!(TimeValidator::is_valid_time(value), "{} should be valid", value);
    }
}

#[test]
fn test_invalid_times() {
    for value in ["25:00", "24:00", "9:5", "12:60", "1200", "12:00:00", "", "ab:cd", "-1:00"] {
        assert!(!TimeValidator::is_valid_time(value), "{} should be invalid", value);
    }
}

#[test]
fn test_range_requires_strictly_increasing_times() {
    assert!(TimeValidator::is_valid_range("09:00", "17:00"));
    assert!(TimeValidator::is_valid_range("9:00", "09:01"));
    assert!(!TimeValidator::is_valid_range("10:00", "10:00"));
    assert!(!TimeValidator::is_valid_range("17:00", "09:00"));
    assert!(!TimeValidator::is_valid_range("09:00", "25:00"));
}

proptest! {
    #[test]
    fn prop_range_matches_time_ordering(
        h1 in 0u32..24, m1 in 0u32..60, h2 in 0u32..24, m2 in 0u32..60
    ) {
        let start = format!("{:02}:{:02}", h1, m1);
        let end = format!("{:02}:{:02}", h2, m2);
        prop_assert!(TimeValidator::is_valid_time(&start));
        prop_assert_eq!(
            TimeValidator::is_valid_range(&start, &end),
            (h1, m1) < (h2, m2)
        );
    }

    #[test]
    fn prop_out_of_range_hours_are_invalid(h in 24u32..100, m in 0u32..60) {
        let value = format!("{}:{:02}", h, m);
        prop_assert!(!TimeValidator::is_valid_time(&value));
    }
}

// ==============================================================================
// INTERVAL OVERLAP
// ==============================================================================

#[test]
fn test_touching_intervals_do_not_overlap() {
    assert!(!overlaps(hm(9, 0), hm(10, 0), hm(10, 0), hm(11, 0)));
    assert!(!overlaps(hm(10, 0), hm(11, 0), hm(9, 0), hm(10, 0)));
}

#[test]
fn test_contained_and_partial_intervals_overlap() {
    assert!(overlaps(hm(9, 0), hm(12, 0), hm(10, 0), hm(11, 0)));
    assert!(overlaps(hm(9, 0), hm(12, 0), hm(11, 0), hm(13, 0)));
    assert!(overlaps(hm(9, 0), hm(10, 0), hm(9, 0), hm(10, 0)));
}

#[test]
fn test_containment_is_closed_at_both_ends() {
    assert!(contains(hm(9, 0), hm(9, 0), hm(12, 0)));
    assert!(contains(hm(12, 0), hm(9, 0), hm(12, 0)));
    assert!(!contains(hm(12, 1), hm(9, 0), hm(12, 0)));
    assert!(!contains(hm(8, 59), hm(9, 0), hm(12, 0)));
}

proptest! {
    #[test]
    fn prop_overlap_is_symmetric(a in 0u32..1440, b in 0u32..1440, c in 0u32..1440, d in 0u32..1440) {
        prop_assert_eq!(overlaps(a, b, c, d), overlaps(c, d, a, b));
    }

    #[test]
    fn prop_adjacent_intervals_never_overlap(start in 0u32..1000, len_a in 1u32..200, len_b in 1u32..200) {
        let mid = start + len_a;
        prop_assert!(!overlaps(start, mid, mid, mid + len_b));
    }
}
