//! Splits the image rows into contiguous, disjoint ranges, one per
//! requested task.  The ranges must exactly tile `0..height`; rounding
//! never drops or duplicates a row because the cut points
//! `round(k * height/tasks)` are monotone and pinned at both ends.

use std::ops::Range;

/// The half-open row ranges for `num_tasks` tasks over `height` rows,
/// in task order.
pub fn row_ranges(height: usize, num_tasks: usize) -> Vec<Range<usize>> {
    let rows_per_task = height as f64 / num_tasks as f64;
    (0..num_tasks)
        .map(|task| {
            let start = (task as f64 * rows_per_task).round() as usize;
            let end = ((task + 1) as f64 * rows_per_task).round() as usize;
            start..end
        })
        .collect()
}
