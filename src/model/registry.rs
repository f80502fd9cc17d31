//! Building registry
//!
//! A building names the model subdirectory holding its trained artifacts and
//! the source tables its power and occupancy series come from.

use serde::{Deserialize, Serialize};

/// A building the forecasting service knows how to serve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    name: String,
    model_subdir: String,
    power_table: String,
    occupancy_table: String,
}

impl Building {
    /// Register a building by name. The model subdirectory and source-table
    /// bindings follow the campus naming scheme.
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        let upper = name.to_uppercase();
        Self {
            model_subdir: name.to_lowercase(),
            power_table: format!("CEVAC_{upper}_SPOWER_HIST"),
            occupancy_table: format!("CEVAC_{upper}_WAP_FLOOR_SUMS_HIST"),
            name,
        }
    }

    /// Watt Family Innovation Center
    pub fn watt() -> Self {
        Self::named("Watt")
    }

    /// Cooper Library
    pub fn cooper() -> Self {
        Self::named("Cooper")
    }

    /// Academic Success Center
    pub fn asc() -> Self {
        Self::named("ASC")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model_subdir(&self) -> &str {
        &self.model_subdir
    }

    pub fn power_table(&self) -> &str {
        &self.power_table
    }

    pub fn occupancy_table(&self) -> &str {
        &self.occupancy_table
    }
}
