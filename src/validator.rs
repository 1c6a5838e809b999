//! Path parameter validators.
//!
//! A validator decides whether a raw path segment may be bound to a
//! parameter. Validators attach to a parameter *name* on a route and end up
//! on the tree node for that parameter, so every route sharing the node is
//! subject to them. A value must satisfy all validators on the node; a node
//! without validators accepts anything.
//!
//! Validators must be side-effect free and must not panic.

use regex::Regex;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Decides whether a raw segment value is acceptable for a parameter.
/// Implemented for plain functions and closures:
/// ```rust
/// use segrouter::ParamValidator;
///
/// let short = |value: &str| value.len() <= 3;
/// assert!(short.validate("abc"));
/// assert!(!short.validate("abcd"));
/// ```
pub trait ParamValidator: Send + Sync {
    fn validate(&self, value: &str) -> bool;
}

impl<F> ParamValidator for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn validate(&self, value: &str) -> bool {
        self(value)
    }
}

/// A shared validator. Identity (the allocation) is what deduplication
/// compares, so attaching the same `Validator` twice has no effect.
#[derive(Clone)]
pub struct Validator(Arc<dyn ParamValidator>);

impl Validator {
    pub fn new(validator: impl ParamValidator + 'static) -> Self {
        Self(Arc::new(validator))
    }

    pub fn validate(&self, value: &str) -> bool {
        self.0.validate(value)
    }

    pub fn same(&self, other: &Validator) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validator")
            .field(&Arc::as_ptr(&self.0))
            .finish()
    }
}

/// Merge `incoming` into `validators`, skipping ones already present.
pub(crate) fn merge(validators: &mut Vec<Validator>, incoming: &[Validator]) {
    for validator in incoming {
        if !validators.iter().any(|v| v.same(validator)) {
            validators.push(validator.clone());
        }
    }
}

/// Accepts non-empty strings of ASCII digits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Numeric;

impl ParamValidator for Numeric {
    fn validate(&self, value: &str) -> bool {
        !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
    }
}

/// Accepts one of a fixed set of values, compared case-sensitively.
#[derive(Debug, Clone, Default)]
pub struct OneOf(HashSet<String>);

impl OneOf {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }
}

impl ParamValidator for OneOf {
    fn validate(&self, value: &str) -> bool {
        self.0.contains(value)
    }
}

/// Accepts values fully matched by a regular expression.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// The pattern is anchored on both ends before compiling.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(&format!("^(?:{})$", pattern)).map(Self)
    }
}

impl ParamValidator for Pattern {
    fn validate(&self, value: &str) -> bool {
        self.0.is_match(value)
    }
}
