//! Reconciled listing view for one owner.
//!
//! Used by both the `goopss listings` CLI command and the
//! `GET /owners/{owner}/listings` HTTP endpoint.
//!
//! # Usage
//!
//! ```bash
//! goopss listings shop-123
//! goopss listings shop-123 --only-optimized --json
//! ```

use anyhow::Result;

use goopss_core::{load_listing_view, ListingView, ReconciledListing};

use crate::sources::DataSources;

/// Load and reconcile `owner`'s listings.
pub async fn get_listing_view(sources: &DataSources, owner: &str) -> Result<ListingView> {
    load_listing_view(&*sources.listings, &*sources.optimizations, owner).await
}

/// CLI entry point for `goopss listings <owner>`.
///
/// `only_optimized` filters what is printed; the stats always describe
/// the full reconciliation.
pub async fn run_listings(
    sources: &DataSources,
    owner: &str,
    only_optimized: bool,
    json: bool,
) -> Result<()> {
    let mut view = get_listing_view(sources, owner).await?;
    if only_optimized {
        view.listings.retain(|l| l.is_optimized);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!(
        "Listings for {}: {} total, {} optimized ({} complete)",
        view.owner, view.stats.total, view.stats.optimized, view.stats.completed
    );
    if view.stats.orphaned_records > 0 {
        println!(
            "  {} optimization record(s) reference listings not in this shop",
            view.stats.orphaned_records
        );
    }
    println!();

    if view.listings.is_empty() {
        println!("No listings.");
        return Ok(());
    }

    println!(
        "{:<14} {:<10} {:<10} TITLE",
        "LISTING ID", "OPTIMIZED", "STATUS"
    );
    for l in &view.listings {
        println!(
            "{:<14} {:<10} {:<10} {}",
            l.listing.listing_id,
            if l.is_optimized { "yes" } else { "no" },
            status_label(l),
            display_title(l)
        );
    }

    Ok(())
}

fn status_label(l: &ReconciledListing) -> &'static str {
    match (l.is_optimized, l.optimization_status) {
        (false, _) => "-",
        (true, true) => "complete",
        (true, false) => "pending",
    }
}

/// Optimized title when there is one, else the marketplace title.
fn display_title(l: &ReconciledListing) -> String {
    let title = if l.optimized_title.is_empty() {
        &l.listing.title
    } else {
        &l.optimized_title
    };
    truncate(title, 60)
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goopss_core::reconcile::reconcile_one;
    use goopss_core::{MarketplaceListing, OptimizationRecord};

    #[test]
    fn test_status_and_title() {
        let listing = MarketplaceListing::new(1, "Plain title");
        let plain = reconcile_one(&listing, None);
        assert_eq!(status_label(&plain), "-");
        assert_eq!(display_title(&plain), "Plain title");

        let mut rec = OptimizationRecord::new("x", 1);
        rec.optimized_title = Some("Better title".into());
        let opt = reconcile_one(&listing, Some(&rec));
        assert_eq!(status_label(&opt), "pending");
        assert_eq!(display_title(&opt), "Better title");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("héllo", 10), "héllo");
        assert_eq!(truncate("héllo wörld", 6), "héllo…");
    }
}
