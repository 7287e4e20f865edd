use serde::{Deserialize, Serialize};
use url::Url;

use crate::models::Category;
use crate::utils::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductEntry {
    pub name: String,
    pub url: String,
    pub category: Category,
}

impl ProductEntry {
    pub fn new(name: impl Into<String>, url: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            category,
        }
    }
}

/// Static list of listing pages scanned each run, in report order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<ProductEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<ProductEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[ProductEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose category is active, catalog order preserved.
    pub fn select(&self, active: &[Category]) -> Vec<&ProductEntry> {
        self.entries
            .iter()
            .filter(|entry| active.contains(&entry.category))
            .collect()
    }

    /// Every URL must parse, point at an allowed host and (optionally) use https.
    pub fn validate(&self, allowed_hosts: &[String], require_https: bool) -> Result<()> {
        for entry in &self.entries {
            let url = Url::parse(&entry.url).map_err(|e| {
                AppError::Validation(format!("Invalid URL for {}: {}", entry.name, e))
            })?;

            if require_https && url.scheme() != "https" {
                return Err(AppError::Validation(format!(
                    "URL for {} must use https: {}",
                    entry.name, entry.url
                )));
            }

            let host = url.host_str().unwrap_or_default();
            if !allowed_hosts.iter().any(|allowed| allowed.eq_ignore_ascii_case(host)) {
                return Err(AppError::Validation(format!(
                    "Host {} for {} is not an allowed catalog host",
                    host, entry.name
                )));
            }
        }
        Ok(())
    }

    pub fn gold_de() -> Self {
        use Category::*;

        let entries: &[(&str, &str, Category)] = &[
            ("Krügerrand 1oz Gold", "https://www.gold.de/kaufen/goldmuenzen/kruegerrand/", Priority),
            ("Maple Leaf 1oz Gold", "https://www.gold.de/kaufen/goldmuenzen/maple-leaf/", Priority),
            ("Wiener Philharmoniker 1oz Gold", "https://www.gold.de/kaufen/goldmuenzen/philharmoniker/", Coins),
            ("American Eagle 1oz Gold", "https://www.gold.de/kaufen/goldmuenzen/american-eagle/", Coins),
            ("Gold-Euro 1/2oz", "https://www.gold.de/kaufen/goldmuenzen/euro-goldmuenzen/", Coins),
            ("Krügerrand 1oz Silber", "https://www.gold.de/kaufen/silbermuenzen/kruegerrand-silber/", Coins),
            ("Maple Leaf 1oz Silber", "https://www.gold.de/kaufen/silbermuenzen/maple-leaf/", Coins),
            ("Wiener Philharmoniker 1oz Silber", "https://www.gold.de/kaufen/silbermuenzen/philharmoniker/", Coins),
            ("Arche Noah 10oz Silber", "https://www.gold.de/kaufen/silbermuenzen/arche-noah/", Coins),
            ("1g Goldbarren", "https://www.gold.de/kaufen/goldbarren/1-gramm/", Bars),
            ("5g Goldbarren", "https://www.gold.de/kaufen/goldbarren/5-gramm/", Bars),
            ("1oz Goldbarren", "https://www.gold.de/kaufen/goldbarren/1-unze/", Bars),
            ("1oz Silberbarren", "https://www.gold.de/kaufen/silberbarren/1-unze/", Bars),
            ("50g Silberbarren", "https://www.gold.de/kaufen/silberbarren/50-gramm/", Bars),
            ("100g Silberbarren", "https://www.gold.de/kaufen/silberbarren/100-gramm/", Bars),
        ];

        Self::new(
            entries
                .iter()
                .map(|(name, url, category)| ProductEntry::new(*name, *url, *category))
                .collect(),
        )
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::gold_de()
    }
}
