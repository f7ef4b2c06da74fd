//! Error types for the planner core

/// Errors raised by the allocation and efficiency engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlannerError {
    /// Input was missing, malformed or out of range.
    #[error("invalid {}: {message}", .fields.join(", "))]
    Validation {
        fields: Vec<String>,
        message: String,
    },

    /// An operation reached a state the fixed category set should rule out.
    #[error("inconsistent planner state: {detail}")]
    State { detail: String },
}

impl PlannerError {
    /// Validation failure for a single field.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        PlannerError::Validation {
            fields: vec![field.to_string()],
            message: message.into(),
        }
    }

    /// Field names carried by a validation failure (empty for state errors).
    pub fn fields(&self) -> &[String] {
        match self {
            PlannerError::Validation { fields, .. } => fields,
            PlannerError::State { .. } => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;

/// Collects field problems so a record can report all of them at once.
#[derive(Debug, Default)]
pub(crate) struct FieldErrors {
    fields: Vec<String>,
    messages: Vec<String>,
}

impl FieldErrors {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, field: &str, message: impl Into<String>) {
        self.fields.push(field.to_string());
        self.messages.push(message.into());
    }

    /// One problem that involves several fields together.
    pub(crate) fn push_many(&mut self, fields: &[&str], message: impl Into<String>) {
        self.fields.extend(fields.iter().map(|field| field.to_string()));
        self.messages.push(message.into());
    }

    pub(crate) fn missing(&mut self, field: &str) {
        self.push(field, format!("{} is required", field));
    }

    pub(crate) fn finish(self) -> Result<()> {
        if self.fields.is_empty() {
            Ok(())
        } else {
            Err(PlannerError::Validation {
                fields: self.fields,
                message: self.messages.join("; "),
            })
        }
    }
}

/// Reject NaN and infinities, which the arithmetic below cannot order.
pub(crate) fn ensure_finite(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PlannerError::invalid(field, format!("{} must be a finite number", field)))
    }
}

pub(crate) fn ensure_non_negative(field: &str, value: f64) -> Result<f64> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(PlannerError::invalid(field, format!("{} cannot be negative", field)));
    }
    Ok(value)
}
