//! Configuration validation utilities

use crate::QuireError;
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

/// Configuration validation result
pub type ValidationResult = Result<(), ValidationError>;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Value is required but missing or empty
    Required { field: String },
    /// Value is out of acceptable range
    OutOfRange {
        field: String,
        min: Option<f64>,
        max: Option<f64>,
        actual: f64,
    },
    /// Value format is invalid
    InvalidFormat {
        field: String,
        expected: String,
        actual: String,
    },
    /// A value appears more than once where names must be unique
    Duplicate { field: String, value: String },
    /// Custom validation failed
    Custom { field: String, message: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Required { field } => {
                write!(f, "Field '{field}' is required but missing")
            }
            ValidationError::OutOfRange {
                field,
                min,
                max,
                actual,
            } => {
                let range_desc = match (min, max) {
                    (Some(min), Some(max)) => format!("between {min} and {max}"),
                    (Some(min), None) => format!("at least {min}"),
                    (None, Some(max)) => format!("at most {max}"),
                    (None, None) => "in valid range".to_string(),
                };
                write!(f, "Field '{field}' must be {range_desc} (got {actual})")
            }
            ValidationError::InvalidFormat {
                field,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Field '{field}' has invalid format. Expected: {expected}, got: {actual}"
                )
            }
            ValidationError::Duplicate { field, value } => {
                write!(f, "Field '{field}' contains duplicate value '{value}'")
            }
            ValidationError::Custom { field, message } => {
                write!(f, "Field '{field}': {message}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for QuireError {
    fn from(err: ValidationError) -> Self {
        QuireError::invalid(err.to_string())
    }
}

/// Configuration validator that accumulates validation rules
#[derive(Debug, Default)]
pub struct ConfigValidator {
    errors: Vec<ValidationError>,
    field_prefix: String,
}

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator for a nested field
    fn for_field(&self, field_name: &str) -> Self {
        Self {
            errors: Vec::new(),
            field_prefix: self.full_field_name(field_name),
        }
    }

    /// Validate that an optional value is present
    pub fn required<T>(&mut self, field_name: &str, value: &Option<T>) -> &mut Self {
        if value.is_none() {
            self.errors.push(ValidationError::Required {
                field: self.full_field_name(field_name),
            });
        }
        self
    }

    /// Validate that a string is not blank
    pub fn non_empty(&mut self, field_name: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.errors.push(ValidationError::Required {
                field: self.full_field_name(field_name),
            });
        }
        self
    }

    /// Validate that a number is within range
    pub fn range<T>(&mut self, field_name: &str, value: T, min: Option<T>, max: Option<T>) -> &mut Self
    where
        T: PartialOrd + Copy + Into<f64>,
    {
        let below = min.map_or(false, |min| value < min);
        let above = max.map_or(false, |max| value > max);

        if below || above {
            self.errors.push(ValidationError::OutOfRange {
                field: self.full_field_name(field_name),
                min: min.map(Into::into),
                max: max.map(Into::into),
                actual: value.into(),
            });
        }
        self
    }

    /// Validate string format
    ///
    /// Known patterns are `identifier` (ASCII alphanumerics and underscore)
    /// and `path` (starts with `/`). Anything else only checks non-emptiness.
    pub fn format(&mut self, field_name: &str, value: &str, pattern: &str) -> &mut Self {
        let is_valid = match pattern {
            "identifier" => is_identifier(value),
            "path" => value.starts_with('/'),
            _ => !value.is_empty(),
        };

        if !is_valid {
            self.errors.push(ValidationError::InvalidFormat {
                field: self.full_field_name(field_name),
                expected: pattern.to_string(),
                actual: value.to_string(),
            });
        }
        self
    }

    /// Validate that every value in a sequence is distinct
    pub fn unique<'a, T, I>(&mut self, field_name: &str, values: I) -> &mut Self
    where
        T: Eq + Hash + fmt::Display + 'a + ?Sized,
        I: IntoIterator<Item = &'a T>,
    {
        let mut seen = HashSet::new();
        for value in values {
            if !seen.insert(value) {
                self.errors.push(ValidationError::Duplicate {
                    field: self.full_field_name(field_name),
                    value: value.to_string(),
                });
            }
        }
        self
    }

    /// Validate using a custom predicate
    pub fn custom<T, F>(&mut self, field_name: &str, value: &T, predicate: F, message: &str) -> &mut Self
    where
        T: ?Sized,
        F: FnOnce(&T) -> bool,
    {
        if !predicate(value) {
            self.errors.push(ValidationError::Custom {
                field: self.full_field_name(field_name),
                message: message.to_string(),
            });
        }
        self
    }

    /// Validate a collection of items
    pub fn each<T, F>(&mut self, field_name: &str, items: &[T], mut validator: F) -> &mut Self
    where
        F: FnMut(&mut ConfigValidator, usize, &T),
    {
        for (index, item) in items.iter().enumerate() {
            let mut item_validator = self.for_field(&format!("{field_name}[{index}]"));
            validator(&mut item_validator, index, item);
            self.merge(item_validator);
        }
        self
    }

    fn merge(&mut self, other: ConfigValidator) {
        self.errors.extend(other.errors);
    }

    /// Get validation result, reporting the first error
    pub fn result(self) -> ValidationResult {
        match self.errors.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(first),
        }
    }

    fn full_field_name(&self, field_name: &str) -> String {
        if self.field_prefix.is_empty() {
            field_name.to_string()
        } else {
            format!("{}.{}", self.field_prefix, field_name)
        }
    }
}

fn is_identifier(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
