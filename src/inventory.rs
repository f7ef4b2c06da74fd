//! Speed-up minute inventory and the category-then-general allocation rule

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, ensure_non_negative};
use crate::models::SpeedupCategory;

/// Outcome of one allocation request.
///
/// Partial fulfilment is a success: `shortfall` carries whatever could not be
/// drawn from either pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub category: SpeedupCategory,
    pub requested_minutes: f64,
    pub allocated_from_category: f64,
    pub allocated_from_general: f64,
    pub total_allocated: f64,
    pub shortfall: f64,
}

impl AllocationResult {
    pub fn is_complete(&self) -> bool {
        self.shortfall == 0.0
    }
}

/// Apply the allocation rule to balance snapshots without touching any state.
///
/// The specific pool is exhausted before the shared General pool is touched;
/// a General request only ever draws from General. Callers must pass
/// validated, non-negative inputs.
pub fn plan_allocation(
    category: SpeedupCategory,
    requested_minutes: f64,
    category_available: f64,
    general_available: f64,
) -> AllocationResult {
    let allocated_from_category = if category == SpeedupCategory::General {
        0.0
    } else {
        requested_minutes.min(category_available)
    };
    let remaining_after_category = requested_minutes - allocated_from_category;
    let allocated_from_general = remaining_after_category.min(general_available);
    let shortfall = remaining_after_category - allocated_from_general;

    AllocationResult {
        category,
        requested_minutes,
        allocated_from_category,
        allocated_from_general,
        total_allocated: allocated_from_category + allocated_from_general,
        shortfall,
    }
}

/// Available speed-up minutes for every category. All four pools always exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeedupInventory {
    balances: [f64; 4],
}

impl SpeedupInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an inventory from `(category, minutes)` pairs; missing pools are 0.
    pub fn from_balances<I>(balances: I) -> Result<Self>
    where
        I: IntoIterator<Item = (SpeedupCategory, f64)>,
    {
        let mut inventory = Self::new();
        for (category, minutes) in balances {
            inventory.set(category, minutes)?;
        }
        Ok(inventory)
    }

    pub fn available(&self, category: SpeedupCategory) -> f64 {
        self.balances[category.index()]
    }

    /// Minutes an activity of `category` could draw in total, General included.
    pub fn available_for(&self, category: SpeedupCategory) -> f64 {
        let general = self.available(SpeedupCategory::General);
        if category == SpeedupCategory::General {
            general
        } else {
            self.available(category) + general
        }
    }

    pub fn total(&self) -> f64 {
        self.balances.iter().sum()
    }

    /// Overwrite a balance, e.g. when loading saved state or a manual edit.
    pub fn set(&mut self, category: SpeedupCategory, minutes: f64) -> Result<()> {
        let minutes = ensure_non_negative("minutes", minutes)?;
        self.balances[category.index()] = minutes;
        info!(%category, minutes, "speed-up balance set");
        Ok(())
    }

    /// The allocation `allocate` would make, without drawing anything.
    pub fn preview(&self, category: SpeedupCategory, requested_minutes: f64) -> Result<AllocationResult> {
        let requested_minutes = ensure_non_negative("requested_minutes", requested_minutes)?;
        Ok(plan_allocation(
            category,
            requested_minutes,
            self.available(category),
            self.available(SpeedupCategory::General),
        ))
    }

    /// Draw `requested_minutes` for `category` and commit the drawn amounts.
    pub fn allocate(
        &mut self,
        category: SpeedupCategory,
        requested_minutes: f64,
    ) -> Result<AllocationResult> {
        let plan = self.preview(category, requested_minutes)?;
        self.commit(&plan);

        debug!(
            %category,
            requested_minutes,
            from_category = plan.allocated_from_category,
            from_general = plan.allocated_from_general,
            "allocated speed-ups"
        );
        if !plan.is_complete() {
            warn!(%category, shortfall = plan.shortfall, "allocation partially fulfilled");
        }
        Ok(plan)
    }

    fn commit(&mut self, plan: &AllocationResult) {
        let category = &mut self.balances[plan.category.index()];
        *category = (*category - plan.allocated_from_category).max(0.0);
        let general = &mut self.balances[SpeedupCategory::General.index()];
        *general = (*general - plan.allocated_from_general).max(0.0);
    }

    /// Balances in the fixed category order.
    pub fn balances(&self) -> impl Iterator<Item = (SpeedupCategory, f64)> + '_ {
        SpeedupCategory::ALL
            .into_iter()
            .map(move |category| (category, self.available(category)))
    }
}
