//! Troop training calculator
//!
//! Turns a base training time, time reduction bonus and batch parameters into
//! the number of whole batches a block of speed-up minutes can finish, and the
//! points those batches earn. Partially trained batches earn nothing.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlannerError, Result, ensure_finite, ensure_non_negative};
use crate::models::Duration;

/// Inputs for one training calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingInput {
    pub base_duration: Duration,
    pub troops_per_batch: u32,
    /// Percentage in `[0, 100)`.
    pub reduction_bonus_percent: f64,
    pub points_per_troop: f64,
    pub allocated_minutes: f64,
    pub current_points: f64,
    pub target_points: Option<f64>,
}

impl TrainingInput {
    pub fn new(
        base_duration: Duration,
        troops_per_batch: u32,
        reduction_bonus_percent: f64,
        points_per_troop: f64,
        allocated_minutes: f64,
    ) -> Self {
        Self {
            base_duration,
            troops_per_batch,
            reduction_bonus_percent,
            points_per_troop,
            allocated_minutes,
            current_points: 0.0,
            target_points: None,
        }
    }

    pub fn with_current_points(mut self, current_points: f64) -> Self {
        self.current_points = current_points;
        self
    }

    pub fn with_target_points(mut self, target_points: f64) -> Self {
        self.target_points = Some(target_points);
        self
    }

    fn validate(&self) -> Result<()> {
        let bonus = ensure_finite("reduction_bonus_percent", self.reduction_bonus_percent)?;
        if !(0.0..100.0).contains(&bonus) {
            return Err(PlannerError::invalid(
                "reduction_bonus_percent",
                "reduction_bonus_percent must be at least 0 and below 100",
            ));
        }
        if self.troops_per_batch == 0 {
            return Err(PlannerError::invalid(
                "troops_per_batch",
                "troops_per_batch must be greater than 0",
            ));
        }
        ensure_non_negative("points_per_troop", self.points_per_troop)?;
        if self.base_duration.total_minutes() <= 0.0 {
            return Err(PlannerError::invalid(
                "base_duration",
                "base training time must be greater than 0",
            ));
        }
        ensure_non_negative("allocated_minutes", self.allocated_minutes)?;
        ensure_non_negative("current_points", self.current_points)?;
        if let Some(target) = self.target_points {
            ensure_finite("target_points", target)?;
        }
        Ok(())
    }
}

/// Result of a training calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingResult {
    pub effective_time_minutes: f64,
    pub batches: u64,
    pub points_per_batch: f64,
    pub total_points: f64,
    pub minutes_used: f64,
    pub minutes_unused: f64,
    pub points_per_minute: f64,
    pub minutes_per_point: f64,
    pub required_minutes_for_target: Option<f64>,
}

/// Run the training calculation.
pub fn compute(input: &TrainingInput) -> Result<TrainingResult> {
    input.validate()?;

    let effective_time_minutes =
        input.base_duration.total_minutes() * (1.0 - input.reduction_bonus_percent / 100.0);
    // Whole batches only.
    let batches = (input.allocated_minutes / effective_time_minutes).floor() as u64;
    let points_per_batch = f64::from(input.troops_per_batch) * input.points_per_troop;
    let total_points = batches as f64 * points_per_batch + input.current_points;
    let minutes_used = batches as f64 * effective_time_minutes;
    let minutes_unused = input.allocated_minutes - minutes_used;

    let points_per_minute = if input.allocated_minutes > 0.0 {
        total_points / input.allocated_minutes
    } else {
        0.0
    };
    let minutes_per_point = if input.allocated_minutes > 0.0 && total_points > 0.0 {
        input.allocated_minutes / total_points
    } else {
        0.0
    };

    let required_minutes_for_target = input
        .target_points
        .map(|target| minutes_for_target(target, input.current_points, points_per_batch, effective_time_minutes))
        .transpose()?;

    debug!(
        effective_time_minutes,
        batches, total_points, minutes_unused, "training computed"
    );

    Ok(TrainingResult {
        effective_time_minutes,
        batches,
        points_per_batch,
        total_points,
        minutes_used,
        minutes_unused,
        points_per_minute,
        minutes_per_point,
        required_minutes_for_target,
    })
}

fn minutes_for_target(
    target_points: f64,
    current_points: f64,
    points_per_batch: f64,
    effective_time_minutes: f64,
) -> Result<f64> {
    if target_points <= current_points {
        return Ok(0.0);
    }
    if points_per_batch == 0.0 {
        return Err(PlannerError::invalid(
            "target_points",
            "target cannot be reached when a batch earns no points",
        ));
    }
    let batches_needed = ((target_points - current_points) / points_per_batch).ceil();
    Ok(batches_needed * effective_time_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_hour_half_bonus(allocated: f64) -> TrainingInput {
        TrainingInput::new(Duration::new(0, 1, 0, 0), 100, 50.0, 10.0, allocated)
    }

    #[test]
    fn worked_example() {
        let result = compute(&one_hour_half_bonus(90.0)).unwrap();

        assert_eq!(result.effective_time_minutes, 30.0);
        assert_eq!(result.batches, 3);
        assert_eq!(result.points_per_batch, 1000.0);
        assert_eq!(result.total_points, 3000.0);
        assert_eq!(result.minutes_used, 90.0);
        assert_eq!(result.minutes_unused, 0.0);
        assert!((result.points_per_minute - 3000.0 / 90.0).abs() < 1e-9);
    }

    // Confirmed assumption: a batch that cannot finish earns no points.
    #[test]
    fn partial_batches_earn_nothing() {
        let result = compute(&one_hour_half_bonus(89.0)).unwrap();
        assert_eq!(result.batches, 2);
        assert_eq!(result.total_points, 2000.0);
        assert_eq!(result.minutes_unused, 29.0);

        let result = compute(&one_hour_half_bonus(29.9)).unwrap();
        assert_eq!(result.batches, 0);
        assert_eq!(result.total_points, 0.0);
    }

    #[test]
    fn zero_allocation_has_zero_rates() {
        let result = compute(&one_hour_half_bonus(0.0).with_current_points(500.0)).unwrap();
        assert_eq!(result.batches, 0);
        assert_eq!(result.total_points, 500.0);
        assert_eq!(result.points_per_minute, 0.0);
        assert_eq!(result.minutes_per_point, 0.0);
    }

    #[test]
    fn current_points_are_carried_into_total() {
        let result = compute(&one_hour_half_bonus(60.0).with_current_points(250.0)).unwrap();
        assert_eq!(result.total_points, 2250.0);
    }

    #[test]
    fn target_rounds_up_to_whole_batches() {
        let input = one_hour_half_bonus(0.0)
            .with_current_points(500.0)
            .with_target_points(2600.0);
        let result = compute(&input).unwrap();
        // 2100 points short at 1000 per batch needs 3 batches of 30 minutes.
        assert_eq!(result.required_minutes_for_target, Some(90.0));
    }

    #[test]
    fn met_target_needs_no_minutes() {
        let input = one_hour_half_bonus(0.0)
            .with_current_points(5000.0)
            .with_target_points(4000.0);
        assert_eq!(compute(&input).unwrap().required_minutes_for_target, Some(0.0));
    }

    #[test]
    fn unreachable_target_is_rejected() {
        let input = TrainingInput::new(Duration::from_minutes(10), 5, 0.0, 0.0, 100.0).with_target_points(1.0);
        let err = compute(&input).unwrap_err();
        assert_eq!(err.fields(), ["target_points"]);

        // Already met, so the zero batch value does not matter.
        let input = TrainingInput::new(Duration::from_minutes(10), 5, 0.0, 0.0, 100.0).with_target_points(0.0);
        assert_eq!(compute(&input).unwrap().required_minutes_for_target, Some(0.0));
    }

    #[test]
    fn rejects_out_of_range_inputs() {
        let base = one_hour_half_bonus(90.0);

        let mut input = base;
        input.reduction_bonus_percent = 100.0;
        assert_eq!(compute(&input).unwrap_err().fields(), ["reduction_bonus_percent"]);

        let mut input = base;
        input.reduction_bonus_percent = -1.0;
        assert!(compute(&input).is_err());

        let mut input = base;
        input.troops_per_batch = 0;
        assert_eq!(compute(&input).unwrap_err().fields(), ["troops_per_batch"]);

        let mut input = base;
        input.base_duration = Duration::ZERO;
        assert_eq!(compute(&input).unwrap_err().fields(), ["base_duration"]);

        let mut input = base;
        input.points_per_troop = -2.0;
        assert!(compute(&input).is_err());

        let mut input = base;
        input.allocated_minutes = f64::INFINITY;
        assert_eq!(compute(&input).unwrap_err().fields(), ["allocated_minutes"]);
    }
}
