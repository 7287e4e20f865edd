use serde::{Deserialize, Serialize};
use std::fmt;

pub mod catalog;
pub mod scrape_result;
pub mod vendor;

// Re-exports for convenience
pub use catalog::*;
pub use scrape_result::*;
pub use vendor::*;

// Common enums used across models
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Priority,
    Coins,
    Bars,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Priority, Category::Coins, Category::Bars];

    pub fn label(&self) -> &'static str {
        match self {
            Category::Priority => "PRIORITY",
            Category::Coins => "COINS",
            Category::Bars => "BARS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
