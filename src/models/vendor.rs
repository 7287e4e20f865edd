use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A search token (domain fragment or free-text dealer name) and the dealer it stands for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VendorPattern {
    pub token: String,
    pub display_name: String,
}

impl VendorPattern {
    pub fn new(token: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            display_name: display_name.into(),
        }
    }
}

/// Ordered, immutable pattern table. Several tokens may share one display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorTable {
    patterns: Vec<VendorPattern>,
}

impl VendorTable {
    pub fn new(patterns: Vec<VendorPattern>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[VendorPattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Dealers listed on gold.de, domain tokens first, then free-text names.
    pub fn gold_de() -> Self {
        let entries: &[(&str, &str)] = &[
            ("goldsilbershop.de", "GoldSilberShop"),
            ("anlagegold24.de", "Anlagegold24"),
            ("stonexbullion.com", "StoneX Bullion"),
            ("proaurum.de", "Pro Aurum"),
            ("degussa.de", "Degussa"),
            ("heubach.de", "Heubach Edelmetalle"),
            ("esesg.de", "ESG Edelmetall-Service"),
            ("philoro.de", "Philoro"),
            ("aurargentum.de", "Aurargentum"),
            ("shop.gold.de", "Gold.de Shop"),
            ("classic.gold.de", "Gold.de Classic"),
            ("cash.gold.de", "Gold.de Cash"),
            ("göbel", "GÖBEL Münzen"),
            ("scheidestätte", "Rheinische Scheidestätte"),
            ("bellmann", "Bellmann Münzen"),
            ("silverbroker", "Silverbroker.de"),
            ("wasserthal", "Wasserthal RareCoin"),
            ("mp edelmetalle", "MP Edelmetalle"),
            ("muenze österreich", "Münze Österreich"),
            ("muenze-oesterreich", "Münze Österreich"),
            ("rheinmetall", "Rheinmetall"),
            ("scheideanstalt", "Scheideanstalt"),
            ("coinsinvest", "CoinsInvest"),
            ("bullionvault", "BullionVault"),
            ("aurinum", "Aurinum"),
        ];

        Self::new(
            entries
                .iter()
                .map(|(token, name)| VendorPattern::new(*token, *name))
                .collect(),
        )
    }
}

impl Default for VendorTable {
    fn default() -> Self {
        Self::gold_de()
    }
}

/// Per-dealer occurrence counts, kept in first-seen order.
///
/// Names that were never incremented are absent rather than present with zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VendorTally {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl VendorTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get-or-zero, then add. Adding zero never creates an entry.
    pub fn add(&mut self, name: &str, count: u64) {
        if count == 0 {
            return;
        }
        match self.index.get(name) {
            Some(&pos) => self.entries[pos].1 += count,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push((name.to_string(), count));
            }
        }
    }

    pub fn merge(&mut self, other: &VendorTally) {
        for (name, count) in other.iter() {
            self.add(name, count);
        }
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.index.get(name).map(|&pos| self.entries[pos].1)
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Descending by count; ties keep first-seen order.
    pub fn ranked(&self) -> Vec<(String, u64)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

impl FromIterator<(String, u64)> for VendorTally {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut tally = VendorTally::new();
        for (name, count) in iter {
            tally.add(&name, count);
        }
        tally
    }
}
