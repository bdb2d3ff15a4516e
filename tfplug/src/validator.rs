//! Built-in attribute validators
//!
//! Validators run against known, non-null configuration values only; the
//! server skips null and unknown values before calling them.

use crate::schema::{Validator, ValidatorRequest, ValidatorResponse};
use crate::types::{Diagnostic, Dynamic};

/// String length must fall within `min..=max` characters
pub struct StringLengthBetween {
    pub min: usize,
    pub max: usize,
}

impl StringLengthBetween {
    pub fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

impl Validator for StringLengthBetween {
    fn description(&self) -> String {
        format!(
            "string length must be between {} and {}",
            self.min, self.max
        )
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];

        if let Some(s) = request.config_value.as_string() {
            let len = s.chars().count();
            if len < self.min || len > self.max {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid Attribute Value Length",
                        format!(
                            "Attribute {} {}, got: {}",
                            request.path,
                            self.description(),
                            len
                        ),
                    )
                    .with_attribute(request.path),
                );
            }
        }

        ValidatorResponse { diagnostics }
    }
}

/// Whole number must fall within `min..=max`
pub struct Int64Between {
    pub min: i64,
    pub max: i64,
}

impl Int64Between {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }
}

impl Validator for Int64Between {
    fn description(&self) -> String {
        format!("value must be between {} and {}", self.min, self.max)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];

        if let Some(n) = request.config_value.as_number() {
            if n < self.min as f64 || n > self.max as f64 {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid Attribute Value",
                        format!(
                            "Attribute {} {}, got: {}",
                            request.path,
                            self.description(),
                            n
                        ),
                    )
                    .with_attribute(request.path),
                );
            }
        }

        ValidatorResponse { diagnostics }
    }
}

/// Whole number must be at least `min`
pub struct Int64AtLeast {
    pub min: i64,
}

impl Int64AtLeast {
    pub fn new(min: i64) -> Self {
        Self { min }
    }
}

impl Validator for Int64AtLeast {
    fn description(&self) -> String {
        format!("value must be at least {}", self.min)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];

        if let Some(n) = request.config_value.as_number() {
            if n < self.min as f64 {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid Attribute Value",
                        format!(
                            "Attribute {} {}, got: {}",
                            request.path,
                            self.description(),
                            n
                        ),
                    )
                    .with_attribute(request.path),
                );
            }
        }

        ValidatorResponse { diagnostics }
    }
}

/// String must be one of a fixed set of values
pub struct StringOneOf {
    pub values: Vec<String>,
}

impl StringOneOf {
    pub fn new<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            values: values.into_iter().map(str::to_string).collect(),
        }
    }
}

impl Validator for StringOneOf {
    fn description(&self) -> String {
        format!("value must be one of: {:?}", self.values)
    }

    fn validate(&self, request: ValidatorRequest) -> ValidatorResponse {
        let mut diagnostics = vec![];

        if let Dynamic::String(s) = &request.config_value {
            if !self.values.iter().any(|v| v == s) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid Attribute Value Match",
                        format!(
                            "Attribute {} {}, got: {:?}",
                            request.path,
                            self.description(),
                            s
                        ),
                    )
                    .with_attribute(request.path),
                );
            }
        }

        ValidatorResponse { diagnostics }
    }
}
