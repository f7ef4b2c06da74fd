//! Text rendering of planner results for the terminal

use std::fmt;

use crate::inventory::{AllocationResult, SpeedupInventory};
use crate::ledger::{EfficiencyLedger, EntryDetails, LedgerSummary};
use crate::packs::{PackTotals, PackValueComparator};
use crate::training::TrainingResult;

/// Render minutes as `1d 2h 30m`. Negative values fall back to plain minutes.
pub fn format_minutes(minutes: f64) -> String {
    if minutes < 0.0 {
        return format!("{}m", minutes.trunc() as i64);
    }
    let days = (minutes / 1440.0).floor() as u64;
    let hours = ((minutes % 1440.0) / 60.0).floor() as u64;
    let mins = (minutes % 60.0).floor() as u64;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if mins > 0 || parts.is_empty() {
        parts.push(format!("{}m", mins));
    }
    parts.join(" ")
}

/// Whole number with thousands separators, e.g. `22,500`.
pub fn format_number(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        format!("-{}", out)
    } else {
        out
    }
}

pub fn format_currency(amount: f64) -> String {
    let total_cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && total_cents > 0 { "-" } else { "" };
    format!(
        "{}${}.{:02}",
        sign,
        format_number((total_cents / 100) as f64),
        total_cents % 100
    )
}

pub fn format_inventory(inventory: &SpeedupInventory) -> String {
    let mut output = String::new();
    output.push_str(&format!("{:<14} {:>12} {:>14}\n", "Category", "Minutes", "Duration"));
    output.push_str(&format!("{}\n", "-".repeat(42)));
    for (category, minutes) in inventory.balances() {
        output.push_str(&format!(
            "{:<14} {:>12} {:>14}\n",
            category.as_ref(),
            format_number(minutes),
            format_minutes(minutes)
        ));
    }
    output.push_str(&format!(
        "{:<14} {:>12} {:>14}\n",
        "total",
        format_number(inventory.total()),
        format_minutes(inventory.total())
    ));
    output
}

impl fmt::Display for AllocationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Allocation: {} ===", self.category)?;
        writeln!(f, "Requested:      {:.1} min", self.requested_minutes)?;
        writeln!(f, "From {:<10} {:.1} min", format!("{}:", self.category), self.allocated_from_category)?;
        writeln!(f, "From general:   {:.1} min", self.allocated_from_general)?;
        writeln!(f, "Total:          {:.1} min", self.total_allocated)?;
        if self.is_complete() {
            writeln!(f, "Fully covered")?;
        } else {
            writeln!(f, "Shortfall:      {:.1} min", self.shortfall)?;
        }
        Ok(())
    }
}

impl fmt::Display for TrainingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Training Analysis ===")?;
        writeln!(
            f,
            "Time per batch:     {:.1} min ({})",
            self.effective_time_minutes,
            format_minutes(self.effective_time_minutes)
        )?;
        writeln!(f, "Points per batch:   {}", format_number(self.points_per_batch))?;
        writeln!(f, "Batches possible:   {}", self.batches)?;
        writeln!(f, "Total points:       {}", format_number(self.total_points))?;
        writeln!(f, "Minutes used:       {:.1}", self.minutes_used)?;
        writeln!(f, "Minutes remaining:  {:.1}", self.minutes_unused)?;
        writeln!(f, "Points per minute:  {:.2}", self.points_per_minute)?;
        if let Some(required) = self.required_minutes_for_target {
            writeln!(
                f,
                "Needed for target:  {:.1} min ({})",
                required,
                format_minutes(required)
            )?;
        }
        Ok(())
    }
}

pub fn format_ledger(ledger: &EfficiencyLedger) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:>4} {:<13} {:<28} {:>14} {:>10} {:>12}\n",
        "ID", "Activity", "Description", "Points", "Minutes", "Pts/Min"
    ));
    output.push_str(&format!("{}\n", "-".repeat(86)));
    for entry in ledger.entries() {
        let description = match (&entry.description, entry.details) {
            (Some(text), _) => text.clone(),
            (None, EntryDetails::Training { base_duration, troops_per_batch, .. }) => {
                format!("{} troops / {}", troops_per_batch, base_duration)
            }
            (None, EntryDetails::Power { .. }) => String::new(),
        };
        output.push_str(&format!(
            "{:>4} {:<13} {:<28} {:>14} {:>10.1} {:>12.2}\n",
            entry.id,
            entry.activity.as_ref(),
            description,
            format_number(entry.points()),
            entry.speedup_minutes_spent,
            entry.efficiency()
        ));
    }
    output
}

impl fmt::Display for LedgerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Hall of Chiefs Summary ===")?;
        writeln!(
            f,
            "{:<13} {:>7} {:>14} {:>12} {:>12}",
            "Activity", "Entries", "Points", "Minutes", "Avg Pts/Min"
        )?;
        for category in &self.categories {
            writeln!(
                f,
                "{:<13} {:>7} {:>14} {:>12.1} {:>12.2}",
                category.activity.as_ref(),
                category.entry_count,
                format_number(category.total_points),
                category.total_speedup_minutes,
                category.average_efficiency
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:<13} {:>7} {:>14} {:>12.1} {:>12.2}",
            "overall",
            self.entry_count,
            format_number(self.total_points),
            self.total_speedup_minutes,
            self.overall_efficiency
        )
    }
}

pub fn format_pack_ranking(packs: &PackValueComparator) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "{:>4} {:>4} {:<28} {:>10} {:>6} {:>6} {:>9} {:>10}\n",
        "Rank", "ID", "Pack", "Price", "60m", "5m", "Minutes", "Cost/Min"
    ));
    output.push_str(&format!("{}\n", "-".repeat(86)));
    for (rank, pack) in packs.rank().into_iter().enumerate() {
        output.push_str(&format!(
            "{:>4} {:>4} {:<28} {:>10} {:>6} {:>6} {:>9} {:>10.4}\n",
            rank + 1,
            pack.id,
            pack.name,
            format_currency(pack.price),
            pack.count_60min,
            pack.count_5min,
            pack.total_minutes(),
            pack.cost_per_minute()
        ));
    }
    output
}

impl fmt::Display for PackTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Pack Totals ===")?;
        writeln!(f, "Packs:              {}", self.pack_count)?;
        writeln!(f, "Total spent:        {}", format_currency(self.total_price))?;
        writeln!(
            f,
            "Speed-up minutes:   {} ({})",
            self.total_minutes,
            format_minutes(self.total_minutes as f64)
        )?;
        writeln!(f, "Blended cost/min:   {:.4}", self.blended_cost_per_minute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpeedupCategory;

    #[test]
    fn minutes_format_like_game_timers() {
        assert_eq!(format_minutes(0.0), "0m");
        assert_eq!(format_minutes(90.0), "1h 30m");
        assert_eq!(format_minutes(1440.0 + 61.0), "1d 1h 1m");
        assert_eq!(format_minutes(2880.0), "2d");
        assert_eq!(format_minutes(-5.0), "-5m");
    }

    #[test]
    fn numbers_get_thousands_separators() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(22500.0), "22,500");
        assert_eq!(format_number(1234567.4), "1,234,567");
        assert_eq!(format_number(-4500.0), "-4,500");
    }

    #[test]
    fn currency_has_two_decimals() {
        assert_eq!(format_currency(4.99), "$4.99");
        assert_eq!(format_currency(1250.5), "$1,250.50");
        assert_eq!(format_currency(10.0), "$10.00");
    }

    #[test]
    fn allocation_report_mentions_shortfall() {
        let mut inventory = SpeedupInventory::new();
        inventory.set(SpeedupCategory::General, 10.0).unwrap();
        let result = inventory.allocate(SpeedupCategory::Research, 25.0).unwrap();

        let text = result.to_string();
        assert!(text.contains("Allocation: research"));
        assert!(text.contains("Shortfall:      15.0 min"));
    }

    #[test]
    fn ranking_lists_best_value_first() {
        let mut packs = PackValueComparator::new();
        packs.add_pack("Pricey", 10.0, 1, 0).unwrap();
        packs.add_pack("Bargain", 5.0, 0, 10).unwrap();

        let text = format_pack_ranking(&packs);
        let bargain = text.find("Bargain").unwrap();
        let pricey = text.find("Pricey").unwrap();
        assert!(bargain < pricey);
    }
}
