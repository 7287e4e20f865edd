use crate::models::{ScrapeResult, VendorTally};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRank {
    pub name: String,
    pub count: u64,
}

impl ProductRank {
    fn from_result(result: &ScrapeResult) -> Option<Self> {
        result.total_count.map(|count| ProductRank {
            name: result.product_name.clone(),
            count,
        })
    }
}

/// Read-only view over one run's results, built once after scanning finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedReport {
    /// Successful scans, highest count first, ties in catalog order.
    pub ranked: Vec<ScrapeResult>,
    /// Failed scans in catalog order.
    pub failed: Vec<ScrapeResult>,
    /// Cross-product dealer totals, highest first, ties in the order dealers
    /// first appear when walking the catalog.
    pub vendor_ranking: Vec<(String, u64)>,
    pub success_count: usize,
    pub catalog_count: usize,
    pub available_count: usize,
    pub total_occurrences: u64,
    /// Highest-ranked product with at least one occurrence.
    pub best: Option<ProductRank>,
    /// Lowest-ranked product with at least one occurrence. Zero-count scans never qualify.
    pub lowest_available: Option<ProductRank>,
}

impl AggregatedReport {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn all_failed(&self) -> bool {
        self.success_count == 0
    }

    pub fn vendor_count(&self) -> usize {
        self.vendor_ranking.len()
    }

    /// Ranked scans that found at least one dealer.
    pub fn available(&self) -> impl Iterator<Item = &ScrapeResult> {
        self.ranked.iter().filter(|r| r.is_available())
    }
}

/// Stable sort by count descending; failed scans (`None`) sort after every count.
pub fn rank_products(results: &[ScrapeResult]) -> Vec<ScrapeResult> {
    let mut ranked = results.to_vec();
    ranked.sort_by(|a, b| b.total_count.cmp(&a.total_count));
    ranked
}

pub fn aggregate(results: &[ScrapeResult]) -> AggregatedReport {
    let ranked: Vec<ScrapeResult> = rank_products(results)
        .into_iter()
        .filter(ScrapeResult::is_success)
        .collect();
    let failed: Vec<ScrapeResult> = results
        .iter()
        .filter(|r| !r.is_success())
        .cloned()
        .collect();

    // catalog order, so vendor ties keep the order dealers were first seen in
    let mut tally = VendorTally::new();
    for result in results.iter().filter(|r| r.is_success()) {
        tally.merge(&result.vendor_counts);
    }

    let total_occurrences: u64 = ranked.iter().filter_map(|r| r.total_count).sum();
    let available_count = ranked.iter().filter(|r| r.is_available()).count();
    let best = ranked
        .iter()
        .find(|r| r.is_available())
        .and_then(ProductRank::from_result);
    let lowest_available = ranked
        .iter()
        .rev()
        .find(|r| r.is_available())
        .and_then(ProductRank::from_result);

    AggregatedReport {
        success_count: ranked.len(),
        catalog_count: results.len(),
        available_count,
        total_occurrences,
        best,
        lowest_available,
        vendor_ranking: tally.ranked(),
        ranked,
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(name: &str, vendors: &[(&str, u64)]) -> ScrapeResult {
        let tally = vendors
            .iter()
            .map(|(n, c)| (n.to_string(), *c))
            .collect();
        ScrapeResult::success(name, &format!("https://www.gold.de/{}", name), tally)
    }

    fn failed(name: &str) -> ScrapeResult {
        ScrapeResult::failed(name, &format!("https://www.gold.de/{}", name), "bad status 503")
    }

    fn names(results: &[ScrapeResult]) -> Vec<&str> {
        results.iter().map(|r| r.product_name.as_str()).collect()
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let results = vec![
            ok("A", &[("X", 5)]),
            ok("B", &[("Y", 5)]),
            ok("C", &[("X", 2)]),
        ];
        let report = aggregate(&results);
        assert_eq!(names(&report.ranked), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_failed_sort_last() {
        let results = vec![failed("F"), ok("Z", &[]), ok("A", &[("X", 1)])];
        let ranked = rank_products(&results);
        assert_eq!(names(&ranked), vec!["A", "Z", "F"]);
    }

    #[test]
    fn test_splits_failed_from_ranked() {
        let results = vec![ok("P1", &[("Foo", 3), ("Bar", 1)]), failed("P2")];
        let report = aggregate(&results);

        assert_eq!(report.success_count, 1);
        assert_eq!(report.catalog_count, 2);
        assert_eq!(report.failed_count(), 1);
        assert_eq!(names(&report.ranked), vec!["P1"]);
        assert_eq!(names(&report.failed), vec!["P2"]);
        assert_eq!(report.total_occurrences, 4);
    }

    #[test]
    fn test_vendor_ranking_sums_across_products() {
        let results = vec![
            ok("A", &[("Degussa", 1), ("Philoro", 2)]),
            ok("B", &[("Philoro", 1), ("Heubach", 3), ("Degussa", 2)]),
        ];
        let report = aggregate(&results);

        assert_eq!(
            report.vendor_ranking,
            vec![
                ("Degussa".to_string(), 3),
                ("Philoro".to_string(), 3),
                ("Heubach".to_string(), 3),
            ]
        );
        assert_eq!(report.vendor_count(), 3);
    }

    #[test]
    fn test_zero_count_excluded_from_lowest_available() {
        let results = vec![
            ok("Big", &[("X", 7)]),
            ok("Small", &[("X", 2)]),
            ok("Empty", &[]),
        ];
        let report = aggregate(&results);

        assert_eq!(report.success_count, 3);
        assert_eq!(report.available_count, 2);
        assert_eq!(
            report.best,
            Some(ProductRank {
                name: "Big".to_string(),
                count: 7
            })
        );
        assert_eq!(
            report.lowest_available,
            Some(ProductRank {
                name: "Small".to_string(),
                count: 2
            })
        );
    }

    #[test]
    fn test_vendor_ties_follow_catalog_not_rank() {
        // B outranks A, but A's dealers were seen first
        let results = vec![
            ok("A", &[("Degussa", 2)]),
            ok("B", &[("Philoro", 2), ("Heubach", 1)]),
            ok("C", &[("Heubach", 1)]),
        ];
        let report = aggregate(&results);

        assert_eq!(names(&report.ranked), vec!["B", "A", "C"]);
        assert_eq!(
            report.vendor_ranking,
            vec![
                ("Degussa".to_string(), 2),
                ("Philoro".to_string(), 2),
                ("Heubach".to_string(), 2),
            ]
        );
    }

    #[test]
    fn test_all_failed() {
        let report = aggregate(&[failed("A"), failed("B")]);

        assert!(report.all_failed());
        assert!(report.ranked.is_empty());
        assert!(report.vendor_ranking.is_empty());
        assert_eq!(report.best, None);
        assert_eq!(report.lowest_available, None);
        assert_eq!(report.total_occurrences, 0);
    }

    #[test]
    fn test_empty_input() {
        let report = aggregate(&[]);
        assert_eq!(report.catalog_count, 0);
        assert!(report.all_failed());
    }
}
