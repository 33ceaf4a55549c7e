//! Postal address value object.

use serde::{Deserialize, Serialize};

/// A postal address snapshot.
///
/// Orders and shipments copy the address at creation time; later edits to a
/// customer's directory entry never reach back into committed records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    /// ISO country code (e.g. "SE", "US").
    pub country: String,
}

impl Address {
    /// Creates an address with no second line.
    pub fn new(
        line1: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        postal_code: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            line1: line1.into(),
            line2: None,
            city: city.into(),
            state: state.into(),
            postal_code: postal_code.into(),
            country: country.into(),
        }
    }

    /// Returns the names of required fields that are blank.
    ///
    /// `line2` and `state` are optional; everything else must be present for
    /// an address to be usable on an order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.line1.trim().is_empty() {
            missing.push("line1");
        }
        if self.city.trim().is_empty() {
            missing.push("city");
        }
        if self.postal_code.trim().is_empty() {
            missing.push("postal_code");
        }
        if self.country.trim().is_empty() {
            missing.push("country");
        }
        missing
    }

    /// Returns true if all required fields are present.
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Returns the uppercased country code used for jurisdiction lookups.
    pub fn country_code(&self) -> String {
        self.country.trim().to_uppercase()
    }
}
