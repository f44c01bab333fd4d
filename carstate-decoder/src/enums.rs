//! Gear and HUD enumeration resolution
//!
//! Integer-coded fields (gear selector, HUD follow distance) are translated
//! through typed tables built once from an [`EnumCatalog`]. A code the table
//! does not know resolves to [`Resolution::Unknown`]; that is an expected
//! outcome, not an error.

use crate::registry::{groups, VehicleVariant};
use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Source of code -> label tables, loaded per vehicle variant
pub trait EnumCatalog {
    /// Complete table for one enumerated field, if the catalog has it
    fn table(&self, variant: VehicleVariant, group: &str, field: &str) -> Option<&HashMap<i64, String>>;

    /// Look up a single code
    fn resolve(&self, variant: VehicleVariant, group: &str, field: &str, code: i64) -> Option<&str> {
        self.table(variant, group, field)
            .and_then(|table| table.get(&code))
            .map(String::as_str)
    }
}

/// A closed set of labels one enumerated field can take
pub trait EnumLabel: Sized + Copy {
    /// Signal group carrying the field
    const GROUP: &'static str;
    /// Field name within the group
    const FIELD: &'static str;

    /// Parse a catalog label; `None` for labels outside the closed set
    fn from_label(label: &str) -> Option<Self>;
}

/// Outcome of resolving an integer code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution<L> {
    Known(L),
    Unknown,
}

impl<L> Default for Resolution<L> {
    fn default() -> Self {
        Resolution::Unknown
    }
}

impl<L> Resolution<L> {
    pub fn known(self) -> Option<L> {
        match self {
            Resolution::Known(label) => Some(label),
            Resolution::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Resolution::Unknown)
    }

    /// The resolved label, or `default` for an unmapped code
    pub fn unwrap_or(self, default: L) -> L {
        self.known().unwrap_or(default)
    }
}

impl<L: Default> Resolution<L> {
    pub fn unwrap_or_default(self) -> L {
        self.known().unwrap_or_default()
    }
}

/// Typed code -> label mapping for one field
#[derive(Debug, Clone, PartialEq)]
pub struct EnumTable<L> {
    entries: HashMap<i64, L>,
}

impl<L: EnumLabel> EnumTable<L> {
    /// Build from raw catalog labels
    ///
    /// Labels that do not parse into `L` are dropped, so their codes resolve
    /// to [`Resolution::Unknown`].
    pub fn from_labels<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = (i64, &'a str)>,
    {
        let mut entries = HashMap::new();
        for (code, label) in labels {
            match L::from_label(label) {
                Some(parsed) => {
                    entries.insert(code, parsed);
                }
                None => log::warn!(
                    "Ignoring unrecognized {}.{} label {:?} for code {}",
                    L::GROUP,
                    L::FIELD,
                    label,
                    code
                ),
            }
        }
        Self { entries }
    }

    /// Load the table for `L` from a catalog
    pub fn load<C: EnumCatalog + ?Sized>(catalog: &C, variant: VehicleVariant) -> Result<Self> {
        let table = catalog.table(variant, L::GROUP, L::FIELD).ok_or_else(|| {
            DecoderError::MissingEnumTable {
                group: L::GROUP.to_string(),
                field: L::FIELD.to_string(),
            }
        })?;
        Ok(Self::from_labels(
            table.iter().map(|(code, label)| (*code, label.as_str())),
        ))
    }

    pub fn resolve(&self, code: i64) -> Resolution<L> {
        match self.entries.get(&code) {
            Some(label) => Resolution::Known(*label),
            None => Resolution::Unknown,
        }
    }

    /// Number of codes with a recognised label
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no catalog label could be mapped, so every code resolves to `Unknown`
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Canonical gear selector position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GearShifter {
    /// Selector position could not be determined; never treated as drivable
    #[default]
    Unknown,
    Park,
    Drive,
    Neutral,
    Reverse,
    Sport,
    Low,
    Brake,
    Eco,
    Manumatic,
}

impl GearShifter {
    /// Collapse a resolution to a gear, falling back to [`GearShifter::Unknown`]
    pub fn from_resolution(resolution: Resolution<GearShifter>) -> Self {
        resolution.unwrap_or_default()
    }
}

impl EnumLabel for GearShifter {
    const GROUP: &'static str = groups::DRIVE_STATE;
    const FIELD: &'static str = "GEAR";

    fn from_label(label: &str) -> Option<Self> {
        let gear = match label.trim().to_ascii_uppercase().as_str() {
            "P" | "PARK" => GearShifter::Park,
            "R" | "REVERSE" => GearShifter::Reverse,
            "N" | "NEUTRAL" => GearShifter::Neutral,
            "E" | "ECO" => GearShifter::Eco,
            "T" | "MANUAL" => GearShifter::Manumatic,
            "D" | "DRIVE" => GearShifter::Drive,
            "S" | "SPORT" => GearShifter::Sport,
            "L" | "LOW" => GearShifter::Low,
            "B" | "BRAKE" => GearShifter::Brake,
            _ => return None,
        };
        Some(gear)
    }
}

impl fmt::Display for GearShifter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GearShifter::Unknown => "unknown",
            GearShifter::Park => "park",
            GearShifter::Drive => "drive",
            GearShifter::Neutral => "neutral",
            GearShifter::Reverse => "reverse",
            GearShifter::Sport => "sport",
            GearShifter::Low => "low",
            GearShifter::Brake => "brake",
            GearShifter::Eco => "eco",
            GearShifter::Manumatic => "manumatic",
        };
        f.write_str(name)
    }
}

/// ACC follow distance shown on the HUD, in bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FollowDistance {
    One,
    Two,
    Three,
    Four,
}

impl EnumLabel for FollowDistance {
    const GROUP: &'static str = groups::ACC_HUD_ADAS;
    const FIELD: &'static str = "SET_DISTANCE";

    fn from_label(label: &str) -> Option<Self> {
        // Labels carry the bar count somewhere in the text ("2", "2 bars", "DIST_2")
        match label.chars().find(|c| c.is_ascii_digit())? {
            '1' => Some(FollowDistance::One),
            '2' => Some(FollowDistance::Two),
            '3' => Some(FollowDistance::Three),
            '4' => Some(FollowDistance::Four),
            _ => None,
        }
    }
}

/// All enumeration tables the decoder needs, loaded once at startup
#[derive(Debug, Clone)]
pub struct EnumResolver {
    gear: EnumTable<GearShifter>,
    set_distance: EnumTable<FollowDistance>,
}

impl EnumResolver {
    pub fn load<C: EnumCatalog + ?Sized>(catalog: &C, variant: VehicleVariant) -> Result<Self> {
        let gear = EnumTable::load(catalog, variant)?;
        let set_distance = EnumTable::load(catalog, variant)?;
        log::info!(
            "Loaded enum tables for {}: {} gear codes, {} set-distance codes",
            variant,
            gear.len(),
            set_distance.len()
        );
        Ok(Self { gear, set_distance })
    }

    pub fn gear(&self, code: i64) -> Resolution<GearShifter> {
        self.gear.resolve(code)
    }

    pub fn set_distance(&self, code: i64) -> Resolution<FollowDistance> {
        self.set_distance.resolve(code)
    }
}
