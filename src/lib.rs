//! Speed-up Planner
//!
//! Allocation and efficiency calculator for Whiteout Survival speed-ups:
//! which inventory pool a request draws from, how many training batches the
//! minutes finish, how many Hall of Chiefs points each activity earns per
//! minute, and which purchased pack gave the cheapest minutes.

pub mod db;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod models;
pub mod packs;
pub mod planner;
pub mod records;
pub mod report;
pub mod training;

pub use error::{PlannerError, Result};
pub use inventory::{AllocationResult, SpeedupInventory, plan_allocation};
pub use ledger::{CategorySummary, EfficiencyLedger, LedgerEntry, LedgerSummary};
pub use models::{Activity, Duration, EntryId, PackId, SpeedupCategory};
pub use packs::{PackEntry, PackTotals, PackValueComparator};
pub use planner::{Planner, RecordedEntry, TrainingPlan, TrainingSpec};
pub use records::{EntryFields, EntryRecord, PackRecord, PlannerRecord};
pub use training::{TrainingInput, TrainingResult};
