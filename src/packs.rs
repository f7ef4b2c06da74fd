//! Pack value comparison by cost per speed-up minute

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::error::{FieldErrors, PlannerError, Result};
use crate::models::PackId;
use crate::records::PackRecord;

pub const MINUTES_PER_HOUR_ITEM: u64 = 60;
pub const MINUTES_PER_FIVE_MINUTE_ITEM: u64 = 5;

static PURCHASE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").expect("purchase date pattern is a valid regex")
});

/// A purchased pack and the speed-up items it contained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackEntry {
    pub id: PackId,
    pub name: String,
    pub price: f64,
    pub count_60min: u32,
    pub count_5min: u32,
    /// Caller-supplied `YYYY-MM-DD` purchase date, if known.
    pub purchased_on: Option<String>,
}

impl PackEntry {
    pub fn total_minutes(&self) -> u64 {
        total_minutes(self.count_60min, self.count_5min)
    }

    /// Always defined: packs without speed-up minutes are never accepted.
    pub fn cost_per_minute(&self) -> f64 {
        self.price / self.total_minutes() as f64
    }

    pub fn to_record(&self) -> PackRecord {
        PackRecord {
            id: self.id.0,
            name: self.name.clone(),
            price: self.price,
            count_60min: self.count_60min,
            count_5min: self.count_5min,
            purchased_on: self.purchased_on.clone(),
        }
    }
}

pub fn total_minutes(count_60min: u32, count_5min: u32) -> u64 {
    u64::from(count_60min) * MINUTES_PER_HOUR_ITEM + u64::from(count_5min) * MINUTES_PER_FIVE_MINUTE_ITEM
}

/// Totals across every recorded pack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PackTotals {
    pub pack_count: usize,
    pub total_price: f64,
    pub total_minutes: u64,
    /// Total price over total minutes; 0 with no packs.
    pub blended_cost_per_minute: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PackValueComparator {
    packs: Vec<PackEntry>,
    next_id: u64,
}

impl Default for PackValueComparator {
    fn default() -> Self {
        Self {
            packs: Vec::new(),
            next_id: 1,
        }
    }
}

impl PackValueComparator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from stored records; `next_id` is the stored id counter.
    pub fn from_records(records: &[PackRecord], next_id: u64) -> Result<Self> {
        let mut comparator = Self {
            packs: Vec::new(),
            next_id: next_id.max(1),
        };
        for record in records {
            let id = PackId(record.id);
            if comparator.get(id).is_some() {
                return Err(PlannerError::invalid("id", format!("duplicate pack id {}", id)));
            }
            let pack = build_pack(
                id,
                &record.name,
                record.price,
                record.count_60min,
                record.count_5min,
                record.purchased_on.as_deref(),
            )?;
            comparator.next_id = comparator.next_id.max(record.id.saturating_add(1));
            comparator.packs.push(pack);
        }
        Ok(comparator)
    }

    pub fn to_records(&self) -> Vec<PackRecord> {
        self.packs.iter().map(PackEntry::to_record).collect()
    }

    pub fn next_id(&self) -> PackId {
        PackId(self.next_id)
    }

    pub fn add_pack(&mut self, name: &str, price: f64, count_60min: u32, count_5min: u32) -> Result<PackId> {
        self.insert(name, price, count_60min, count_5min, None)
    }

    /// Same as `add_pack`, with the date the pack was bought.
    pub fn add_dated_pack(
        &mut self,
        name: &str,
        price: f64,
        count_60min: u32,
        count_5min: u32,
        purchased_on: &str,
    ) -> Result<PackId> {
        self.insert(name, price, count_60min, count_5min, Some(purchased_on))
    }

    fn insert(
        &mut self,
        name: &str,
        price: f64,
        count_60min: u32,
        count_5min: u32,
        purchased_on: Option<&str>,
    ) -> Result<PackId> {
        let id = PackId(self.next_id);
        let pack = build_pack(id, name, price, count_60min, count_5min, purchased_on)?;
        info!(
            %id,
            name = %pack.name,
            cost_per_minute = pack.cost_per_minute(),
            "pack added"
        );
        self.packs.push(pack);
        self.next_id += 1;
        Ok(id)
    }

    /// Packs from best to worst value. Equal costs keep insertion order.
    pub fn rank(&self) -> Vec<&PackEntry> {
        let mut ranked: Vec<&PackEntry> = self.packs.iter().collect();
        // Stable sort, so ties stay in insertion order.
        ranked.sort_by(|a, b| a.cost_per_minute().total_cmp(&b.cost_per_minute()));
        ranked
    }

    /// Returns whether a pack was removed; unknown ids are ignored.
    pub fn remove(&mut self, id: PackId) -> bool {
        let before = self.packs.len();
        self.packs.retain(|pack| pack.id != id);
        let removed = self.packs.len() != before;
        if removed {
            info!(%id, "pack removed");
        }
        removed
    }

    pub fn remove_all(&mut self) -> usize {
        let removed = self.packs.len();
        self.packs.clear();
        info!(removed, "packs cleared");
        removed
    }

    pub fn get(&self, id: PackId) -> Option<&PackEntry> {
        self.packs.iter().find(|pack| pack.id == id)
    }

    pub fn packs(&self) -> &[PackEntry] {
        &self.packs
    }

    pub fn len(&self) -> usize {
        self.packs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packs.is_empty()
    }

    pub fn totals(&self) -> PackTotals {
        let total_price: f64 = self.packs.iter().map(|pack| pack.price).sum();
        let total_minutes: u64 = self.packs.iter().map(PackEntry::total_minutes).sum();
        let blended_cost_per_minute = if total_minutes > 0 {
            total_price / total_minutes as f64
        } else {
            0.0
        };
        PackTotals {
            pack_count: self.packs.len(),
            total_price,
            total_minutes,
            blended_cost_per_minute,
        }
    }
}

fn build_pack(
    id: PackId,
    name: &str,
    price: f64,
    count_60min: u32,
    count_5min: u32,
    purchased_on: Option<&str>,
) -> Result<PackEntry> {
    let mut errors = FieldErrors::new();
    let name = name.trim();
    if name.is_empty() {
        errors.missing("name");
    }
    if !price.is_finite() || price <= 0.0 {
        errors.push("price", "price must be greater than 0");
    }
    if total_minutes(count_60min, count_5min) == 0 {
        errors.push_many(
            &["count_60min", "count_5min"],
            "a pack needs at least one 60-minute or 5-minute speed-up",
        );
    }
    let purchased_on = purchased_on.map(str::trim);
    if purchased_on.is_some_and(|date| !PURCHASE_DATE.is_match(date)) {
        errors.push("purchased_on", "purchased_on must be a YYYY-MM-DD date");
    }
    errors.finish()?;

    Ok(PackEntry {
        id,
        name: name.to_string(),
        price,
        count_60min,
        count_5min,
        purchased_on: purchased_on.map(str::to_string),
    })
}
