use scraper::{Html, Selector};
use std::sync::LazyLock;

use crate::config::CountingConfig;
use crate::models::{VendorTable, VendorTally};

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrences {
    pub vendor_counts: VendorTally,
    pub total: u64,
}

/// Counts dealer mentions in fetched page markup.
///
/// Tokens are plain text, never patterns: `a.b` only matches a literal dot.
/// Body and tokens are lowercased with Unicode (locale-independent) rules.
pub struct OccurrenceCounter {
    // (lowercased token, display name), table order
    patterns: Vec<(String, String)>,
    policy: CountingConfig,
}

impl OccurrenceCounter {
    pub fn new(table: &VendorTable, policy: CountingConfig) -> Self {
        let patterns = table
            .patterns()
            .iter()
            .filter(|p| !p.token.is_empty())
            .map(|p| (p.token.to_lowercase(), p.display_name.clone()))
            .collect();

        Self { patterns, policy }
    }

    pub fn count(&self, body: &str) -> Occurrences {
        let mut vendor_counts = VendorTally::new();
        if body.is_empty() {
            return Occurrences {
                vendor_counts,
                total: 0,
            };
        }

        let text = body.to_lowercase();
        for (token, name) in &self.patterns {
            let mut hits = text.matches(token.as_str()).count() as u64;
            if let Some(cap) = self.policy.max_per_token {
                hits = hits.min(cap);
            }
            vendor_counts.add(name, hits);
        }

        if self.policy.match_links {
            for href in extract_links(body) {
                if let Some((_, name)) = self
                    .patterns
                    .iter()
                    .find(|(token, _)| href.contains(token.as_str()))
                {
                    vendor_counts.add(name, 1);
                }
            }
        }

        let total = vendor_counts.total();
        Occurrences {
            vendor_counts,
            total,
        }
    }
}

/// Absolute hyperlink targets, lowercased.
fn extract_links(body: &str) -> Vec<String> {
    let document = Html::parse_document(body);
    document
        .select(&LINK_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_lowercase)
        .filter(|href| href.starts_with("http://") || href.starts_with("https://"))
        .collect()
}
