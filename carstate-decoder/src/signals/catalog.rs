//! Enum catalog backed by DBC value tables

use crate::enums::EnumCatalog;
use crate::registry::VehicleVariant;
use crate::signals::database::SignalDatabase;
use crate::signals::dbc;
use crate::types::Result;
use std::collections::HashMap;
use std::path::Path;

/// `VAL_` tables of one variant's DBC, keyed by (group, field)
#[derive(Debug, Clone)]
pub struct DbcCatalog {
    variant: VehicleVariant,
    tables: HashMap<(String, String), HashMap<i64, String>>,
}

impl DbcCatalog {
    /// Empty catalog for a variant
    pub fn new(variant: VehicleVariant) -> Self {
        Self {
            variant,
            tables: HashMap::new(),
        }
    }

    /// Copy every value table out of an already parsed database
    pub fn from_database(variant: VehicleVariant, database: &SignalDatabase) -> Self {
        let mut catalog = Self::new(variant);
        for (group, field, table) in database.value_tables() {
            catalog.insert_table(group, field, table.clone());
        }
        log::info!("Enum catalog for {} holds {} tables", variant, catalog.tables.len());
        catalog
    }

    pub fn from_dbc_file(variant: VehicleVariant, path: &Path) -> Result<Self> {
        let database = dbc::parse_dbc_file(path)?;
        Ok(Self::from_database(variant, &database))
    }

    pub fn from_dbc_str(variant: VehicleVariant, content: &str) -> Result<Self> {
        let database = dbc::parse_dbc_str(content)?;
        Ok(Self::from_database(variant, &database))
    }

    pub fn insert_table(&mut self, group: &str, field: &str, table: HashMap<i64, String>) {
        self.tables.insert((group.to_string(), field.to_string()), table);
    }

    pub fn variant(&self) -> VehicleVariant {
        self.variant
    }
}

impl EnumCatalog for DbcCatalog {
    fn table(&self, variant: VehicleVariant, group: &str, field: &str) -> Option<&HashMap<i64, String>> {
        if variant != self.variant {
            log::warn!("Catalog for {} queried for {}", self.variant, variant);
            return None;
        }
        self.tables.get(&(group.to_string(), field.to_string()))
    }
}
