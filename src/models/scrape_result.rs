use crate::models::VendorTally;

/// Outcome of scanning one product page. `total_count == None` marks a failed fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeResult {
    pub product_name: String,
    pub url: String,
    pub total_count: Option<u64>,
    pub vendor_counts: VendorTally,
    pub error: Option<String>,
}

impl ScrapeResult {
    pub fn success(product_name: &str, url: &str, vendor_counts: VendorTally) -> Self {
        Self {
            product_name: product_name.to_string(),
            url: url.to_string(),
            total_count: Some(vendor_counts.total()),
            vendor_counts,
            error: None,
        }
    }

    pub fn failed(product_name: &str, url: &str, error: impl ToString) -> Self {
        Self {
            product_name: product_name.to_string(),
            url: url.to_string(),
            total_count: None,
            vendor_counts: VendorTally::new(),
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.total_count.is_some()
    }

    /// At least one recognised dealer occurrence.
    pub fn is_available(&self) -> bool {
        self.total_count.is_some_and(|count| count > 0)
    }
}
