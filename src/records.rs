//! Plain records exchanged with persistence and presentation collaborators
//!
//! Every field is optional so a record can describe exactly what a user or a
//! saved file supplied; the ledger and comparator decide what is required.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Activity, SpeedupCategory};

pub const RECORD_VERSION: u32 = 1;

/// Field values for a ledger entry, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_per_power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub troops_per_batch: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_per_troop: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reduction_bonus_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speedup_minutes_spent: Option<f64>,
}

impl EntryFields {
    pub fn power_entry(
        description: impl Into<String>,
        power: f64,
        points_per_power: f64,
        speedup_minutes_spent: f64,
    ) -> Self {
        Self {
            description: Some(description.into()),
            power: Some(power),
            points_per_power: Some(points_per_power),
            speedup_minutes_spent: Some(speedup_minutes_spent),
            ..Self::default()
        }
    }
}

/// A stored ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub id: u64,
    pub activity: Activity,
    #[serde(flatten)]
    pub fields: EntryFields,
}

/// A stored pack purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackRecord {
    pub id: u64,
    pub name: String,
    pub price: f64,
    pub count_60min: u32,
    pub count_5min: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchased_on: Option<String>,
}

/// Full session state as handed to the persistence writer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerRecord {
    pub version: u32,
    pub inventory: BTreeMap<SpeedupCategory, f64>,
    pub entries: Vec<EntryRecord>,
    pub packs: Vec<PackRecord>,
    /// Id counters, so ids freed by removals are not reissued after a reload.
    pub next_entry_id: u64,
    pub next_pack_id: u64,
}

impl Default for PlannerRecord {
    fn default() -> Self {
        Self {
            version: RECORD_VERSION,
            inventory: BTreeMap::new(),
            entries: Vec::new(),
            packs: Vec::new(),
            next_entry_id: 1,
            next_pack_id: 1,
        }
    }
}
