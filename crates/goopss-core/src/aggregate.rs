//! Task aggregation: per-category counts for one owner.
//!
//! Tasks are filtered to the selected owner, then (optionally) to a
//! completion-date window with exclusive bounds, then counted per display
//! category. The uncategorized sentinel `"undefined"` (and a missing
//! category, which upstream serializes as that sentinel) is reported as
//! `"Other"`. Categories appear in order of first occurrence.

use std::collections::HashMap;

use crate::models::{CategoryCount, DateRange, TaskRecord};

/// Raw category value that marks an uncategorized task.
pub const UNDEFINED_CATEGORY: &str = "undefined";

/// Display label for uncategorized tasks.
pub const OTHER_CATEGORY: &str = "Other";

/// Map a raw category to the label it is grouped and displayed under.
pub fn display_category(raw: Option<&str>) -> &str {
    match raw {
        None | Some(UNDEFINED_CATEGORY) => OTHER_CATEGORY,
        Some(other) => other,
    }
}

/// Tasks belonging to `owner` and, when a range is given, completed inside it.
///
/// Tasks without a completion date never pass an active range.
pub fn filter_tasks<'a>(
    tasks: &'a [TaskRecord],
    owner: &'a str,
    range: Option<&'a DateRange>,
) -> impl Iterator<Item = &'a TaskRecord> + 'a {
    tasks
        .iter()
        .filter(move |t| t.customer_id == owner)
        .filter(move |t| match range {
            Some(r) => t.date_completed.is_some_and(|at| r.contains(at)),
            None => true,
        })
}

/// Count `owner`'s tasks per display category.
///
/// Returns an empty list when no owner is selected. Never fails.
pub fn aggregate(
    tasks: &[TaskRecord],
    owner: Option<&str>,
    range: Option<&DateRange>,
) -> Vec<CategoryCount> {
    let Some(owner) = owner else {
        return Vec::new();
    };

    let mut counts: Vec<CategoryCount> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();

    for task in filter_tasks(tasks, owner, range) {
        let category = display_category(task.category.as_deref());
        match position.get(category) {
            Some(&i) => counts[i].count += 1,
            None => {
                position.insert(category, counts.len());
                counts.push(CategoryCount {
                    category: category.to_string(),
                    count: 1,
                });
            }
        }
    }

    counts
}
