//! Session state: one inventory, one ledger and one pack comparator
//!
//! The planner is the only place where allocation feeds the ledger. Inputs are
//! validated before any minutes are drawn, so a rejected request never
//! changes the inventory.

use serde::Serialize;
use tracing::info;

use crate::error::{PlannerError, Result};
use crate::inventory::{AllocationResult, SpeedupInventory};
use crate::ledger::{self, EfficiencyLedger};
use crate::models::{Activity, Duration, EntryId, SpeedupCategory};
use crate::packs::PackValueComparator;
use crate::records::{EntryFields, PlannerRecord, RECORD_VERSION};
use crate::training::{self, TrainingInput, TrainingResult};

/// A ledger entry created from a fresh allocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecordedEntry {
    pub id: EntryId,
    pub allocation: AllocationResult,
}

/// Training outcome for minutes drawn from the Training pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrainingPlan {
    pub allocation: AllocationResult,
    pub result: TrainingResult,
}

/// Training parameters without the minutes, which come from the inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSpec {
    pub description: Option<String>,
    pub base_duration: Duration,
    pub troops_per_batch: u32,
    pub points_per_troop: f64,
    pub reduction_bonus_percent: f64,
}

impl TrainingSpec {
    /// Ledger fields for this training run with the given spend.
    pub fn to_fields(&self, speedup_minutes_spent: f64) -> EntryFields {
        EntryFields {
            description: self.description.clone(),
            days: Some(i64::from(self.base_duration.days())),
            hours: Some(i64::from(self.base_duration.hours())),
            minutes: Some(i64::from(self.base_duration.minutes())),
            seconds: Some(i64::from(self.base_duration.seconds())),
            troops_per_batch: Some(i64::from(self.troops_per_batch)),
            points_per_troop: Some(self.points_per_troop),
            reduction_bonus_percent: Some(self.reduction_bonus_percent),
            speedup_minutes_spent: Some(speedup_minutes_spent),
            ..EntryFields::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Planner {
    inventory: SpeedupInventory,
    ledger: EfficiencyLedger,
    packs: PackValueComparator,
}

impl Planner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inventory(&self) -> &SpeedupInventory {
        &self.inventory
    }

    pub fn inventory_mut(&mut self) -> &mut SpeedupInventory {
        &mut self.inventory
    }

    pub fn ledger(&self) -> &EfficiencyLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut EfficiencyLedger {
        &mut self.ledger
    }

    pub fn packs(&self) -> &PackValueComparator {
        &self.packs
    }

    pub fn packs_mut(&mut self) -> &mut PackValueComparator {
        &mut self.packs
    }

    /// Draw minutes for a construction or research entry and record it with
    /// the minutes actually allocated.
    pub fn record_power_entry(
        &mut self,
        activity: Activity,
        description: &str,
        power: f64,
        points_per_power: f64,
        requested_minutes: f64,
    ) -> Result<RecordedEntry> {
        if !activity.is_power_based() {
            return Err(PlannerError::invalid(
                "activity",
                format!("{} entries are not scored by power", activity),
            ));
        }
        let fields = EntryFields::power_entry(description, power, points_per_power, requested_minutes);
        ledger::build_entry(EntryId(0), activity, &fields)?;

        let allocation = self
            .inventory
            .allocate(activity.speedup_category(), requested_minutes)?;
        let fields = EntryFields {
            speedup_minutes_spent: Some(allocation.total_allocated),
            ..fields
        };
        let id = self.ledger.add_entry(activity, &fields)?;
        Ok(RecordedEntry { id, allocation })
    }

    /// Draw Training minutes and record a training entry for them.
    pub fn record_training_entry(&mut self, spec: &TrainingSpec, requested_minutes: f64) -> Result<RecordedEntry> {
        ledger::build_entry(EntryId(0), Activity::Training, &spec.to_fields(requested_minutes))?;

        let allocation = self
            .inventory
            .allocate(SpeedupCategory::Training, requested_minutes)?;
        let id = self
            .ledger
            .add_entry(Activity::Training, &spec.to_fields(allocation.total_allocated))?;
        Ok(RecordedEntry { id, allocation })
    }

    /// Draw Training minutes and run the calculator on what was allocated.
    ///
    /// `input.allocated_minutes` is replaced by the allocation's total.
    pub fn plan_training(&mut self, input: &TrainingInput, requested_minutes: f64) -> Result<TrainingPlan> {
        let mut input = *input;
        input.allocated_minutes = requested_minutes;
        training::compute(&input)?;

        let allocation = self
            .inventory
            .allocate(SpeedupCategory::Training, requested_minutes)?;
        input.allocated_minutes = allocation.total_allocated;
        let result = training::compute(&input)?;
        info!(
            batches = result.batches,
            total_points = result.total_points,
            shortfall = allocation.shortfall,
            "training planned"
        );
        Ok(TrainingPlan { allocation, result })
    }

    pub fn to_record(&self) -> PlannerRecord {
        PlannerRecord {
            version: RECORD_VERSION,
            inventory: self.inventory.balances().collect(),
            entries: self.ledger.to_records(),
            packs: self.packs.to_records(),
            next_entry_id: self.ledger.next_id().0,
            next_pack_id: self.packs.next_id().0,
        }
    }

    /// Rebuild a planner from a stored record, re-validating every entry.
    pub fn from_record(record: &PlannerRecord) -> Result<Self> {
        if record.version > RECORD_VERSION {
            return Err(PlannerError::invalid(
                "version",
                format!(
                    "record version {} is newer than supported version {}",
                    record.version, RECORD_VERSION
                ),
            ));
        }
        Ok(Self {
            inventory: SpeedupInventory::from_balances(record.inventory.iter().map(|(c, m)| (*c, *m)))?,
            ledger: EfficiencyLedger::from_records(&record.entries, record.next_entry_id)?,
            packs: PackValueComparator::from_records(&record.packs, record.next_pack_id)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stocked() -> Planner {
        let mut planner = Planner::new();
        let inventory = planner.inventory_mut();
        inventory.set(SpeedupCategory::General, 500.0).unwrap();
        inventory.set(SpeedupCategory::Construction, 100.0).unwrap();
        inventory.set(SpeedupCategory::Training, 60.0).unwrap();
        planner
    }

    fn barracks() -> TrainingSpec {
        TrainingSpec {
            description: None,
            base_duration: Duration::new(0, 1, 0, 0),
            troops_per_batch: 100,
            points_per_troop: 10.0,
            reduction_bonus_percent: 50.0,
        }
    }

    #[test]
    fn power_entry_records_allocated_minutes() {
        let mut planner = stocked();
        let recorded = planner
            .record_power_entry(Activity::Construction, "Embassy", 500.0, 45.0, 150.0)
            .unwrap();

        assert_eq!(recorded.allocation.allocated_from_category, 100.0);
        assert_eq!(recorded.allocation.allocated_from_general, 50.0);
        let entry = planner.ledger().get(recorded.id).unwrap();
        assert_eq!(entry.speedup_minutes_spent, 150.0);
        assert_eq!(entry.efficiency(), 150.0);
        assert_eq!(planner.inventory().available(SpeedupCategory::General), 450.0);
    }

    #[test]
    fn shortfall_is_reflected_in_the_snapshot() {
        let mut planner = stocked();
        let recorded = planner
            .record_power_entry(Activity::Research, "Ward Expansion", 100.0, 30.0, 800.0)
            .unwrap();

        assert_eq!(recorded.allocation.shortfall, 300.0);
        assert_eq!(planner.ledger().get(recorded.id).unwrap().speedup_minutes_spent, 500.0);
    }

    #[test]
    fn invalid_entries_do_not_spend_minutes() {
        let mut planner = stocked();
        let before = planner.inventory().clone();

        assert!(planner
            .record_power_entry(Activity::Construction, "", 500.0, 45.0, 50.0)
            .is_err());
        assert!(planner
            .record_power_entry(Activity::Training, "Camp", 500.0, 45.0, 50.0)
            .is_err());
        let mut spec = barracks();
        spec.troops_per_batch = 0;
        assert!(planner.record_training_entry(&spec, 30.0).is_err());

        assert_eq!(planner.inventory(), &before);
        assert!(planner.ledger().is_empty());
    }

    #[test]
    fn training_plan_uses_training_then_general() {
        let mut planner = stocked();
        let input = TrainingInput::new(Duration::new(0, 1, 0, 0), 100, 50.0, 10.0, 0.0);
        let plan = planner.plan_training(&input, 90.0).unwrap();

        assert_eq!(plan.allocation.allocated_from_category, 60.0);
        assert_eq!(plan.allocation.allocated_from_general, 30.0);
        assert_eq!(plan.result.batches, 3);
        assert_eq!(plan.result.total_points, 3000.0);
    }

    #[test]
    fn training_entry_snapshot_and_points() {
        let mut planner = stocked();
        let recorded = planner.record_training_entry(&barracks(), 90.0).unwrap();

        let entry = planner.ledger().get(recorded.id).unwrap();
        assert_eq!(entry.points(), 3000.0);
        assert_eq!(entry.speedup_minutes_spent, 90.0);
        assert_eq!(planner.inventory().available(SpeedupCategory::Training), 0.0);
    }

    #[test]
    fn record_round_trip_preserves_state() {
        let mut planner = stocked();
        planner
            .record_power_entry(Activity::Construction, "Embassy", 500.0, 45.0, 150.0)
            .unwrap();
        planner.record_training_entry(&barracks(), 30.0).unwrap();
        planner.packs_mut().add_pack("Weekly", 4.99, 5, 12).unwrap();

        let restored = Planner::from_record(&planner.to_record()).unwrap();
        assert_eq!(restored, planner);
        assert_eq!(restored.ledger().summary(), planner.ledger().summary());
        assert_eq!(restored.packs().totals(), planner.packs().totals());
    }

    #[test]
    fn removed_ids_stay_retired_across_records() {
        let mut planner = stocked();
        planner
            .record_power_entry(Activity::Construction, "Embassy", 500.0, 45.0, 10.0)
            .unwrap();
        let last_entry = planner
            .record_power_entry(Activity::Construction, "Furnace", 500.0, 45.0, 10.0)
            .unwrap()
            .id;
        let last_pack = planner.packs_mut().add_pack("Weekly", 4.99, 5, 12).unwrap();
        planner.ledger_mut().remove_entry(last_entry);
        planner.packs_mut().remove(last_pack);

        let mut restored = Planner::from_record(&planner.to_record()).unwrap();
        assert_eq!(restored, planner);
        let next_entry = restored
            .record_power_entry(Activity::Construction, "Embassy II", 500.0, 45.0, 10.0)
            .unwrap()
            .id;
        assert!(next_entry > last_entry);
        assert!(restored.packs_mut().add_pack("Daily", 0.99, 1, 0).unwrap() > last_pack);
    }

    #[test]
    fn newer_record_versions_are_refused() {
        let record = PlannerRecord {
            version: RECORD_VERSION + 1,
            ..PlannerRecord::default()
        };
        assert_eq!(Planner::from_record(&record).unwrap_err().fields(), ["version"]);
    }
}
