//! Hall of Chiefs efficiency ledger
//!
//! Holds construction, research and training entries in insertion order and
//! reports the points each earns per speed-up minute spent. Entries keep a
//! snapshot of the minutes spent when they were recorded; they never look at
//! the live inventory.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{FieldErrors, PlannerError, Result};
use crate::models::{Activity, Duration, EntryId};
use crate::records::{EntryFields, EntryRecord};
use crate::training::{self, TrainingInput};

/// Activity-specific inputs of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntryDetails {
    Power {
        power: f64,
        points_per_power: f64,
    },
    Training {
        base_duration: Duration,
        troops_per_batch: u32,
        points_per_troop: f64,
        reduction_bonus_percent: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub activity: Activity,
    pub description: Option<String>,
    pub details: EntryDetails,
    pub speedup_minutes_spent: f64,
    points: f64,
    efficiency: f64,
}

impl LedgerEntry {
    pub fn points(&self) -> f64 {
        self.points
    }

    /// Points per speed-up minute; 0 when nothing was spent.
    pub fn efficiency(&self) -> f64 {
        self.efficiency
    }

    /// Plain record with exactly the fields this entry's activity uses.
    pub fn to_record(&self) -> EntryRecord {
        let mut fields = EntryFields {
            description: self.description.clone(),
            speedup_minutes_spent: Some(self.speedup_minutes_spent),
            ..EntryFields::default()
        };
        match self.details {
            EntryDetails::Power {
                power,
                points_per_power,
            } => {
                fields.power = Some(power);
                fields.points_per_power = Some(points_per_power);
            }
            EntryDetails::Training {
                base_duration,
                troops_per_batch,
                points_per_troop,
                reduction_bonus_percent,
            } => {
                fields.days = Some(i64::from(base_duration.days()));
                fields.hours = Some(i64::from(base_duration.hours()));
                fields.minutes = Some(i64::from(base_duration.minutes()));
                fields.seconds = Some(i64::from(base_duration.seconds()));
                fields.troops_per_batch = Some(i64::from(troops_per_batch));
                fields.points_per_troop = Some(points_per_troop);
                fields.reduction_bonus_percent = Some(reduction_bonus_percent);
            }
        }
        EntryRecord {
            id: self.id.0,
            activity: self.activity,
            fields,
        }
    }
}

/// Points = power x points per power.
pub fn power_points(power: f64, points_per_power: f64) -> f64 {
    power * points_per_power
}

/// Points earned per minute spent, defined as 0 for a zero spend.
pub fn efficiency(points: f64, speedup_minutes_spent: f64) -> f64 {
    if speedup_minutes_spent > 0.0 {
        points / speedup_minutes_spent
    } else {
        0.0
    }
}

/// Aggregate figures for one activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub activity: Activity,
    pub entry_count: usize,
    pub total_points: f64,
    pub total_speedup_minutes: f64,
    pub average_efficiency: f64,
}

/// Per-activity summaries plus totals across all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSummary {
    pub categories: Vec<CategorySummary>,
    pub entry_count: usize,
    pub total_points: f64,
    pub total_speedup_minutes: f64,
    pub overall_efficiency: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EfficiencyLedger {
    entries: Vec<LedgerEntry>,
    next_id: u64,
}

impl Default for EfficiencyLedger {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl EfficiencyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from stored records, keeping their ids and order.
    ///
    /// `next_id` is the stored id counter. It is raised past every stored id, so
    /// ids removed before saving are still never handed out again.
    pub fn from_records(records: &[EntryRecord], next_id: u64) -> Result<Self> {
        let mut ledger = Self {
            entries: Vec::new(),
            next_id: next_id.max(1),
        };
        for record in records {
            let id = EntryId(record.id);
            if ledger.get(id).is_some() {
                return Err(PlannerError::invalid("id", format!("duplicate entry id {}", id)));
            }
            let entry = build_entry(id, record.activity, &record.fields)?;
            ledger.next_id = ledger.next_id.max(record.id.saturating_add(1));
            ledger.entries.push(entry);
        }
        Ok(ledger)
    }

    pub fn to_records(&self) -> Vec<EntryRecord> {
        self.entries.iter().map(LedgerEntry::to_record).collect()
    }

    /// Id the next added entry will receive.
    pub fn next_id(&self) -> EntryId {
        EntryId(self.next_id)
    }

    /// Validate `fields` for `activity` and append the entry.
    pub fn add_entry(&mut self, activity: Activity, fields: &EntryFields) -> Result<EntryId> {
        let id = EntryId(self.next_id);
        let entry = build_entry(id, activity, fields)?;
        info!(%id, %activity, points = entry.points, "ledger entry added");
        self.entries.push(entry);
        self.next_id += 1;
        Ok(id)
    }

    /// Replace an entry's fields in place. Its id, activity and position are kept.
    pub fn update_entry(&mut self, id: EntryId, fields: &EntryFields) -> Result<()> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| PlannerError::invalid("id", format!("no ledger entry with id {}", id)))?;
        let activity = self.entries[position].activity;
        let entry = build_entry(id, activity, fields)?;
        info!(%id, %activity, points = entry.points, "ledger entry updated");
        self.entries[position] = entry;
        Ok(())
    }

    /// Remove an entry. Unknown ids are ignored; returns whether anything was removed.
    pub fn remove_entry(&mut self, id: EntryId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        let removed = self.entries.len() != before;
        if removed {
            info!(%id, "ledger entry removed");
        }
        removed
    }

    /// Remove every entry of `activity`, or all entries when `None`.
    pub fn remove_all(&mut self, activity: Option<Activity>) -> usize {
        let before = self.entries.len();
        match activity {
            Some(activity) => self.entries.retain(|entry| entry.activity != activity),
            None => self.entries.clear(),
        }
        let removed = before - self.entries.len();
        info!(removed, "ledger entries cleared");
        removed
    }

    pub fn get(&self, id: EntryId) -> Option<&LedgerEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn entries_for(&self, activity: Activity) -> impl Iterator<Item = &LedgerEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.activity == activity)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn category_summary(&self, activity: Activity) -> CategorySummary {
        let mut entry_count = 0;
        let mut total_points = 0.0;
        let mut total_speedup_minutes = 0.0;
        for entry in self.entries_for(activity) {
            entry_count += 1;
            total_points += entry.points;
            total_speedup_minutes += entry.speedup_minutes_spent;
        }
        CategorySummary {
            activity,
            entry_count,
            total_points,
            total_speedup_minutes,
            average_efficiency: efficiency(total_points, total_speedup_minutes),
        }
    }

    pub fn summary(&self) -> LedgerSummary {
        let categories: Vec<_> = Activity::ALL
            .into_iter()
            .map(|activity| self.category_summary(activity))
            .collect();
        let total_points = categories.iter().map(|c| c.total_points).sum();
        let total_speedup_minutes = categories.iter().map(|c| c.total_speedup_minutes).sum();

        LedgerSummary {
            entry_count: self.entries.len(),
            total_points,
            total_speedup_minutes,
            overall_efficiency: efficiency(total_points, total_speedup_minutes),
            categories,
        }
    }
}

/// Check `fields` for `activity` and build the entry with its metrics.
///
/// Every missing or invalid field is reported in a single error.
pub(crate) fn build_entry(id: EntryId, activity: Activity, fields: &EntryFields) -> Result<LedgerEntry> {
    let mut errors = FieldErrors::new();

    let description = fields
        .description
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);
    if activity.is_power_based() && description.is_none() {
        errors.missing("description");
    }

    let speedup_minutes_spent = match fields.speedup_minutes_spent {
        None => {
            errors.missing("speedup_minutes_spent");
            0.0
        }
        Some(value) if !value.is_finite() || value < 0.0 => {
            errors.push(
                "speedup_minutes_spent",
                "speedup_minutes_spent must be a non-negative number",
            );
            0.0
        }
        Some(value) => value,
    };

    let details = if activity.is_power_based() {
        power_details(fields, &mut errors)
    } else {
        training_details(fields, &mut errors)
    };

    errors.finish()?;
    let details = details.ok_or_else(|| PlannerError::State {
        detail: format!("entry {} validated without details", id),
    })?;

    let points = match details {
        EntryDetails::Power {
            power,
            points_per_power,
        } => power_points(power, points_per_power),
        EntryDetails::Training {
            base_duration,
            troops_per_batch,
            points_per_troop,
            reduction_bonus_percent,
        } => {
            let input = TrainingInput::new(
                base_duration,
                troops_per_batch,
                reduction_bonus_percent,
                points_per_troop,
                speedup_minutes_spent,
            );
            training::compute(&input)?.total_points
        }
    };
    let efficiency = efficiency(points, speedup_minutes_spent);
    debug!(%id, %activity, points, efficiency, "entry metrics");

    Ok(LedgerEntry {
        id,
        activity,
        description,
        details,
        speedup_minutes_spent,
        points,
        efficiency,
    })
}

fn power_details(fields: &EntryFields, errors: &mut FieldErrors) -> Option<EntryDetails> {
    let power = match fields.power {
        None => {
            errors.missing("power");
            None
        }
        Some(value) if !value.is_finite() || value < 0.0 => {
            errors.push("power", "power must be a non-negative number");
            None
        }
        Some(value) => Some(value),
    };
    let points_per_power = match fields.points_per_power {
        None => {
            errors.missing("points_per_power");
            None
        }
        Some(value) if !value.is_finite() || value <= 0.0 => {
            errors.push("points_per_power", "points_per_power must be greater than 0");
            None
        }
        Some(value) => Some(value),
    };
    Some(EntryDetails::Power {
        power: power?,
        points_per_power: points_per_power?,
    })
}

fn training_details(fields: &EntryFields, errors: &mut FieldErrors) -> Option<EntryDetails> {
    let mut time_component = |name: &str, value: Option<i64>| -> Option<u32> {
        match value {
            None => Some(0),
            Some(v) => match u32::try_from(v) {
                Ok(v) => Some(v),
                Err(_) => {
                    errors.push(name, format!("{} must be a non-negative whole number", name));
                    None
                }
            },
        }
    };
    let days = time_component("days", fields.days);
    let hours = time_component("hours", fields.hours);
    let minutes = time_component("minutes", fields.minutes);
    let seconds = time_component("seconds", fields.seconds);

    let base_duration = match (days, hours, minutes, seconds) {
        (Some(d), Some(h), Some(m), Some(s)) => {
            let duration = Duration::new(d, h, m, s);
            if duration.total_minutes() <= 0.0 {
                errors.push("base_duration", "base training time must be greater than 0");
                None
            } else {
                Some(duration)
            }
        }
        _ => None,
    };

    let troops_per_batch = match fields.troops_per_batch {
        None => {
            errors.missing("troops_per_batch");
            None
        }
        Some(value) => match u32::try_from(value) {
            Ok(v) if v > 0 => Some(v),
            _ => {
                errors.push("troops_per_batch", "troops_per_batch must be a whole number greater than 0");
                None
            }
        },
    };

    let points_per_troop = match fields.points_per_troop {
        None => {
            errors.missing("points_per_troop");
            None
        }
        Some(value) if !value.is_finite() || value < 0.0 => {
            errors.push("points_per_troop", "points_per_troop must be a non-negative number");
            None
        }
        Some(value) => Some(value),
    };

    let reduction_bonus_percent = match fields.reduction_bonus_percent {
        None => Some(0.0),
        Some(value) if value.is_finite() && (0.0..100.0).contains(&value) => Some(value),
        Some(_) => {
            errors.push(
                "reduction_bonus_percent",
                "reduction_bonus_percent must be at least 0 and below 100",
            );
            None
        }
    };

    Some(EntryDetails::Training {
        base_duration: base_duration?,
        troops_per_batch: troops_per_batch?,
        points_per_troop: points_per_troop?,
        reduction_bonus_percent: reduction_bonus_percent?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training_fields(spent: f64) -> EntryFields {
        EntryFields {
            hours: Some(1),
            troops_per_batch: Some(100),
            points_per_troop: Some(10.0),
            reduction_bonus_percent: Some(50.0),
            speedup_minutes_spent: Some(spent),
            ..EntryFields::default()
        }
    }

    #[test]
    fn construction_points_and_efficiency() {
        let mut ledger = EfficiencyLedger::new();
        let id = ledger
            .add_entry(
                Activity::Construction,
                &EntryFields::power_entry("Furnace 25", 500.0, 45.0, 100.0),
            )
            .unwrap();

        let entry = ledger.get(id).unwrap();
        assert_eq!(entry.points(), 22500.0);
        assert_eq!(entry.efficiency(), 225.0);
    }

    #[test]
    fn zero_spend_reports_zero_efficiency() {
        let mut ledger = EfficiencyLedger::new();
        let id = ledger
            .add_entry(Activity::Research, &EntryFields::power_entry("Free", 80.0, 30.0, 0.0))
            .unwrap();
        let entry = ledger.get(id).unwrap();
        assert_eq!(entry.points(), 2400.0);
        assert_eq!(entry.efficiency(), 0.0);
    }

    #[test]
    fn any_positive_points_per_power_is_accepted() {
        let mut ledger = EfficiencyLedger::new();
        let id = ledger
            .add_entry(Activity::Research, &EntryFields::power_entry("Event", 10.0, 37.5, 5.0))
            .unwrap();
        assert_eq!(ledger.get(id).unwrap().points(), 375.0);
    }

    #[test]
    fn training_entries_use_the_calculator() {
        let mut ledger = EfficiencyLedger::new();
        let id = ledger.add_entry(Activity::Training, &training_fields(90.0)).unwrap();

        let entry = ledger.get(id).unwrap();
        assert_eq!(entry.points(), 3000.0);
        assert!((entry.efficiency() - 3000.0 / 90.0).abs() < 1e-9);
        assert_eq!(entry.description, None);
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let mut ledger = EfficiencyLedger::new();
        let err = ledger
            .add_entry(Activity::Construction, &EntryFields::default())
            .unwrap_err();
        assert_eq!(
            err.fields(),
            ["description", "speedup_minutes_spent", "power", "points_per_power"]
        );

        let err = ledger
            .add_entry(
                Activity::Training,
                &EntryFields {
                    hours: Some(-1),
                    troops_per_batch: Some(0),
                    speedup_minutes_spent: Some(10.0),
                    ..EntryFields::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.fields(), ["hours", "troops_per_batch", "points_per_troop"]);
        assert!(ledger.is_empty());
    }

    #[test]
    fn zero_training_time_is_invalid() {
        let mut fields = training_fields(30.0);
        fields.hours = None;
        let err = EfficiencyLedger::new()
            .add_entry(Activity::Training, &fields)
            .unwrap_err();
        assert_eq!(err.fields(), ["base_duration"]);
    }

    #[test]
    fn ids_survive_removal_and_are_not_reused() {
        let mut ledger = EfficiencyLedger::new();
        let a = ledger
            .add_entry(Activity::Construction, &EntryFields::power_entry("A", 1.0, 30.0, 1.0))
            .unwrap();
        let b = ledger
            .add_entry(Activity::Research, &EntryFields::power_entry("B", 2.0, 30.0, 1.0))
            .unwrap();

        assert!(ledger.remove_entry(a));
        assert!(!ledger.remove_entry(a));
        let c = ledger
            .add_entry(Activity::Construction, &EntryFields::power_entry("C", 3.0, 30.0, 1.0))
            .unwrap();

        assert_eq!(ledger.get(b).unwrap().id, EntryId(2));
        assert_eq!(c, EntryId(3));
        let order: Vec<_> = ledger.entries().iter().map(|e| e.id).collect();
        assert_eq!(order, [b, c]);
    }

    #[test]
    fn update_revalidates_and_keeps_position() {
        let mut ledger = EfficiencyLedger::new();
        let a = ledger
            .add_entry(Activity::Construction, &EntryFields::power_entry("A", 100.0, 30.0, 10.0))
            .unwrap();
        ledger
            .add_entry(Activity::Construction, &EntryFields::power_entry("B", 1.0, 30.0, 1.0))
            .unwrap();

        ledger
            .update_entry(a, &EntryFields::power_entry("A2", 200.0, 45.0, 10.0))
            .unwrap();
        assert_eq!(ledger.entries()[0].points(), 9000.0);
        assert_eq!(ledger.entries()[0].description.as_deref(), Some("A2"));

        let before = ledger.clone();
        assert!(ledger.update_entry(a, &EntryFields::default()).is_err());
        assert!(ledger.update_entry(EntryId(99), &EntryFields::power_entry("X", 1.0, 30.0, 1.0)).is_err());
        assert_eq!(ledger, before);
    }

    #[test]
    fn remove_all_is_scoped_and_idempotent() {
        let mut ledger = EfficiencyLedger::new();
        ledger
            .add_entry(Activity::Construction, &EntryFields::power_entry("A", 1.0, 30.0, 1.0))
            .unwrap();
        ledger.add_entry(Activity::Training, &training_fields(30.0)).unwrap();

        assert_eq!(ledger.remove_all(Some(Activity::Construction)), 1);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.remove_all(None), 1);
        assert_eq!(ledger.remove_all(None), 0);
        assert!(ledger.is_empty());
    }

    #[test]
    fn summaries_aggregate_per_category() {
        let mut ledger = EfficiencyLedger::new();
        ledger
            .add_entry(Activity::Construction, &EntryFields::power_entry("A", 500.0, 45.0, 100.0))
            .unwrap();
        ledger
            .add_entry(Activity::Construction, &EntryFields::power_entry("B", 100.0, 30.0, 0.0))
            .unwrap();
        ledger.add_entry(Activity::Training, &training_fields(90.0)).unwrap();

        let construction = ledger.category_summary(Activity::Construction);
        assert_eq!(construction.entry_count, 2);
        assert_eq!(construction.total_points, 25500.0);
        assert_eq!(construction.total_speedup_minutes, 100.0);
        assert_eq!(construction.average_efficiency, 255.0);

        let research = ledger.category_summary(Activity::Research);
        assert_eq!(research.entry_count, 0);
        assert_eq!(research.average_efficiency, 0.0);

        let summary = ledger.summary();
        assert_eq!(summary.entry_count, 3);
        assert_eq!(summary.total_points, 28500.0);
        assert_eq!(summary.total_speedup_minutes, 190.0);
        assert_eq!(summary.overall_efficiency, 150.0);
    }

    #[test]
    fn records_round_trip_with_ids() {
        let mut ledger = EfficiencyLedger::new();
        ledger
            .add_entry(Activity::Research, &EntryFields::power_entry("A", 10.0, 30.0, 3.0))
            .unwrap();
        let b = ledger.add_entry(Activity::Training, &training_fields(60.0)).unwrap();
        ledger.remove_entry(EntryId(1));

        let restored = EfficiencyLedger::from_records(&ledger.to_records(), ledger.next_id().0).unwrap();
        assert_eq!(restored, ledger);
        assert_eq!(restored.summary(), ledger.summary());

        let mut restored = restored;
        let next = restored
            .add_entry(Activity::Research, &EntryFields::power_entry("C", 1.0, 30.0, 1.0))
            .unwrap();
        assert!(next > b);
    }

    #[test]
    fn removed_tail_id_is_not_reissued_after_reload() {
        let mut ledger = EfficiencyLedger::new();
        ledger
            .add_entry(Activity::Research, &EntryFields::power_entry("A", 10.0, 30.0, 3.0))
            .unwrap();
        let last = ledger
            .add_entry(Activity::Research, &EntryFields::power_entry("B", 10.0, 30.0, 3.0))
            .unwrap();
        ledger.remove_entry(last);

        let mut restored = EfficiencyLedger::from_records(&ledger.to_records(), ledger.next_id().0).unwrap();
        assert_eq!(restored, ledger);
        let next = restored
            .add_entry(Activity::Research, &EntryFields::power_entry("C", 1.0, 30.0, 1.0))
            .unwrap();
        assert!(next > last);
    }

    #[test]
    fn stale_counter_is_raised_past_stored_ids() {
        let record = EntryRecord {
            id: 7,
            activity: Activity::Construction,
            fields: EntryFields::power_entry("A", 1.0, 30.0, 1.0),
        };
        let ledger = EfficiencyLedger::from_records(&[record], 0).unwrap();
        assert_eq!(ledger.next_id(), EntryId(8));
    }

    #[test]
    fn duplicate_record_ids_are_rejected() {
        let record = EntryRecord {
            id: 7,
            activity: Activity::Construction,
            fields: EntryFields::power_entry("A", 1.0, 30.0, 1.0),
        };
        assert!(EfficiencyLedger::from_records(&[record.clone(), record], 1).is_err());
    }
}
