// libs/scheduling-cell/src/services/overlap.rs
//
// Slot-vs-slot conflicts use half-open intervals, so back-to-back slots
// (one ends at 10:00, the next starts at 10:00) never conflict. Appointment
// times are matched against slots with a closed interval, so a booking exactly
// at a slot's start or end is still inside it.

/// Half-open overlap of `[a_start, a_end)` and `[b_start, b_end)`.
pub fn overlaps<T: PartialOrd>(a_start: T, a_end: T, b_start: T, b_end: T) -> bool {
    a_start < b_end && b_start < a_end
}

/// Closed containment of `point` in `[start, end]`.
pub fn contains<T: PartialOrd>(point: T, start: T, end: T) -> bool {
    start <= point && point <= end
}
