//! Record lookup result.

use serde::{Deserialize, Serialize};

/// Display name recorded when the service does not know a VIN.
pub const NOT_FOUND_NAME: &str = "not found";

/// What the record service reported for one candidate VIN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResult {
    pub name: String,
    pub carfax_records: i32,
    pub autocheck_records: i32,
}

impl LookupResult {
    /// The service answered but has no vehicle for this VIN.
    pub fn not_found() -> Self {
        Self {
            name: NOT_FOUND_NAME.to_string(),
            carfax_records: -1,
            autocheck_records: -1,
        }
    }

    /// A hit: at least one history record exists.
    pub fn success(&self) -> bool {
        self.carfax_records > 0 || self.autocheck_records > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_needs_a_positive_count() {
        assert!(!LookupResult::not_found().success());

        let zero = LookupResult {
            name: "2021 FORD MUSTANG".to_string(),
            carfax_records: 0,
            autocheck_records: 0,
        };
        assert!(!zero.success());

        let autocheck_only = LookupResult {
            autocheck_records: 3,
            ..zero
        };
        assert!(autocheck_only.success());
    }
}
