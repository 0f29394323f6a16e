//! Merged-table row types and field normalization.

use serde::{Deserialize, Serialize};

/// A row as scraped, price still free-form text.
///
/// Unknown columns are ignored and missing columns default to empty, so
/// artifacts from different sources share one decode path.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub image: String,
}

impl RawRecord {
    /// Coerce the price field and freeze the row.
    pub(crate) fn normalize(self) -> CleanRecord {
        CleanRecord {
            brand: self.brand,
            name: self.name,
            price: normalize_price(&self.price),
            event: self.event,
            image: self.image,
        }
    }
}

/// A cleaned row: price is always a non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CleanRecord {
    pub brand: String,
    pub name: String,
    pub price: u64,
    pub event: String,
    pub image: String,
}

impl CleanRecord {
    /// Rows missing any of brand/name/event carry too little to keep.
    pub(crate) fn is_complete(&self) -> bool {
        !self.brand.is_empty() && !self.name.is_empty() && !self.event.is_empty()
    }
}

/// Strip every non-digit character and parse what remains.
///
/// Rows with no digits at all (or an unparseable remainder) coerce to 0.
pub fn normalize_price(raw: &str) -> u64 {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}
