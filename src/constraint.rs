//! Constraint lists: ordered `(property, expected value)` pairs.
//!
//! A pair whose expected value is missing or empty places no constraint on
//! the device and is always satisfied. Callers can feed configuration-derived
//! pairs straight in without filtering the empty ones first.

use std::fmt;

/// A single `(property, expected value)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub name: String,
    pub expected: Option<String>,
}

impl Constraint {
    pub fn new(name: impl Into<String>, expected: Option<impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            expected: expected.map(Into::into),
        }
    }

    /// The value this pair requires, or `None` when the pair is vacuous.
    pub fn required_value(&self) -> Option<&str> {
        self.expected.as_deref().filter(|v| !v.is_empty())
    }

    pub fn is_vacuous(&self) -> bool {
        self.required_value().is_none()
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.required_value() {
            Some(value) => write!(f, "{}={}", self.name, value),
            None => write!(f, "{}=*", self.name),
        }
    }
}

/// Ordered conjunction of constraints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintList {
    constraints: Vec<Constraint>,
}

impl ConstraintList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair that must match exactly.
    pub fn with(mut self, name: impl Into<String>, expected: impl Into<String>) -> Self {
        self.constraints.push(Constraint {
            name: name.into(),
            expected: Some(expected.into()),
        });
        self
    }

    /// Append a pair whose value may be missing.
    pub fn with_optional(mut self, name: impl Into<String>, expected: Option<&str>) -> Self {
        self.constraints.push(Constraint::new(name, expected));
        self
    }

    /// The non-vacuous pairs in order, as `(name, required value)`.
    pub fn required(&self) -> impl Iterator<Item = (&str, &str)> {
        self.constraints
            .iter()
            .filter_map(|c| c.required_value().map(|v| (c.name.as_str(), v)))
    }

    /// Evaluate the conjunction, stopping at the first pair `check` rejects.
    ///
    /// Vacuous pairs never reach `check`. Errors from `check` abort the
    /// evaluation and are returned as-is.
    pub fn all_satisfied<E>(
        &self,
        mut check: impl FnMut(&str, &str) -> Result<bool, E>,
    ) -> Result<bool, E> {
        for (name, value) in self.required() {
            if !check(name, value)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl FromIterator<Constraint> for ConstraintList {
    fn from_iter<I: IntoIterator<Item = Constraint>>(iter: I) -> Self {
        Self {
            constraints: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ConstraintList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.constraints.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", parts.join(", "))
    }
}
