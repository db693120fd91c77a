//! Task category summary for one owner.
//!
//! Used by both the `goopss tasks` CLI command and the
//! `GET /owners/{owner}/tasks/summary` HTTP endpoint.
//!
//! # Usage
//!
//! ```bash
//! goopss tasks c1
//! goopss tasks c1 --since 2024-01-06 --until 2024-01-31 --json
//! ```
//!
//! Both bounds are exclusive and must be given together.

use anyhow::{bail, Result};

use goopss_core::{load_task_view, DateRange, TaskView};

use crate::sources::DataSources;

/// Build a range from optional CLI/query bounds.
///
/// Neither bound → no range. Exactly one bound → error.
pub fn resolve_range(since: Option<&str>, until: Option<&str>) -> Result<Option<DateRange>> {
    match (since, until) {
        (None, None) => Ok(None),
        (Some(start), Some(end)) => Ok(Some(DateRange::parse(start, end)?)),
        (Some(_), None) => bail!("invalid range: 'since' given without 'until'"),
        (None, Some(_)) => bail!("invalid range: 'until' given without 'since'"),
    }
}

/// Load tasks and summarize `owner`'s by category.
pub async fn get_task_view(
    sources: &DataSources,
    owner: &str,
    range: Option<DateRange>,
) -> Result<TaskView> {
    load_task_view(&*sources.tasks, Some(owner), range).await
}

/// CLI entry point for `goopss tasks <owner>`.
pub async fn run_tasks(
    sources: &DataSources,
    owner: &str,
    since: Option<&str>,
    until: Option<&str>,
    json: bool,
) -> Result<()> {
    let range = resolve_range(since, until)?;
    let view = get_task_view(sources, owner, range).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    match view.range {
        Some(r) => println!(
            "Tasks for {} completed between {} and {} (exclusive)",
            owner,
            r.start.format("%Y-%m-%d %H:%M"),
            r.end.format("%Y-%m-%d %H:%M")
        ),
        None => println!("Tasks for {}", owner),
    }
    println!();

    if view.categories.is_empty() {
        println!("No tasks.");
        return Ok(());
    }

    println!("{:<32} {:>6}", "CATEGORY", "COUNT");
    for c in &view.categories {
        println!("{:<32} {:>6}", c.category, c.count);
    }
    println!("{:<32} {:>6}", "TOTAL", view.total);

    Ok(())
}
