//! Search targets loaded from a TOML file.
//!
//! A target is one family of VINs to hunt: which queue table and item type
//! to pull sequence numbers from, and which prefixes to try on each.
//!
//! ```toml
//! [defaults]
//! table = "vins"
//! max_delay_secs = 60
//!
//! [targets.2021]
//! type = "2021"
//! prefixes = ["1FA6P8R00M5", "1FA6P8T00M5"]
//! ```
//!
//! Keys under `[defaults]` apply to every target unless the target sets them.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::Path;

use serde::Deserialize;

use crate::db::is_valid_identifier;
use crate::error::{Error, Result};
use crate::vin::check_prefix;

const DEFAULT_MIN_DELAY_SECS: u64 = 1;
const DEFAULT_MAX_DELAY_SECS: u64 = 60;

/// Top-level TOML wrapper.
#[derive(Debug, Deserialize)]
struct TargetsFile {
    #[serde(default)]
    defaults: TargetSettings,
    #[serde(default)]
    targets: BTreeMap<String, TargetSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetSettings {
    table: Option<String>,
    #[serde(rename = "type")]
    item_type: Option<String>,
    prefixes: Option<Vec<String>>,
    min_delay_secs: Option<u64>,
    max_delay_secs: Option<u64>,
}

impl TargetSettings {
    fn or(self, defaults: &TargetSettings) -> Self {
        Self {
            table: self.table.or_else(|| defaults.table.clone()),
            item_type: self.item_type.or_else(|| defaults.item_type.clone()),
            prefixes: self.prefixes.or_else(|| defaults.prefixes.clone()),
            min_delay_secs: self.min_delay_secs.or(defaults.min_delay_secs),
            max_delay_secs: self.max_delay_secs.or(defaults.max_delay_secs),
        }
    }
}

/// A fully resolved search target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub table: String,
    /// Item type filter; defaults to the target name.
    pub item_type: String,
    /// Prefixes in their initial search order.
    pub prefixes: Vec<String>,
    /// Politeness pause between lookups, in whole seconds, inclusive.
    pub delay_secs: RangeInclusive<u64>,
}

impl Target {
    /// Load target `name` from a TOML file.
    pub fn load(path: &Path, name: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read targets file {}: {e}", path.display()))
        })?;
        Self::parse(&content, name)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Resolve target `name` from TOML text.
    pub fn parse(content: &str, name: &str) -> Result<Self> {
        let file: TargetsFile = toml::from_str(content)
            .map_err(|e| Error::Config(format!("bad targets file: {e}")))?;

        let settings = file
            .targets
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Config(format!("unknown target: {name}")))?
            .or(&file.defaults);

        let table = settings
            .table
            .ok_or_else(|| Error::Config(format!("target {name} has no table")))?;
        if !is_valid_identifier(&table) {
            return Err(Error::Config(format!(
                "target {name} has an invalid table name: {table:?}"
            )));
        }

        let prefixes = settings.prefixes.unwrap_or_default();
        if prefixes.is_empty() {
            return Err(Error::Config(format!("target {name} has no prefixes")));
        }
        for prefix in &prefixes {
            check_prefix(prefix).map_err(|e| {
                Error::Config(format!("target {name} has a bad prefix {prefix:?}: {e}"))
            })?;
        }

        let min = settings.min_delay_secs.unwrap_or(DEFAULT_MIN_DELAY_SECS);
        let max = settings.max_delay_secs.unwrap_or(DEFAULT_MAX_DELAY_SECS);
        if min > max {
            return Err(Error::Config(format!(
                "target {name}: min_delay_secs {min} exceeds max_delay_secs {max}"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            table,
            item_type: settings.item_type.unwrap_or_else(|| name.to_string()),
            prefixes,
            delay_secs: min..=max,
        })
    }
}
