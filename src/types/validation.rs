//! Declarative field constraints shared by every record type

use crate::core::error::{Error, FieldError, Result};

/// Records that check their own field constraints before being stored
pub trait Validate {
    /// Return `Error::Validation` listing every failed constraint
    fn validate(&self) -> Result<()>;
}

/// Accumulates constraint failures so a single response can list all of them
#[derive(Debug, Default)]
pub struct Violations {
    errors: Vec<FieldError>,
}

impl Violations {
    /// Start an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure when `ok` is false
    pub fn check(&mut self, ok: bool, field: &'static str, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(FieldError {
                field,
                message: message.into(),
            });
        }
        self
    }

    /// Non-blank string with a character count in `min..=max`
    pub fn length(&mut self, field: &'static str, value: &str, min: usize, max: usize) -> &mut Self {
        let len = value.trim().chars().count();
        if min > 0 && len == 0 {
            return self.check(false, field, "is required");
        }
        self.check(
            (min..=max).contains(&len),
            field,
            format!("must be between {} and {} characters", min, max),
        )
    }

    /// Optional string that, when present, is at most `max` characters
    pub fn max_length(&mut self, field: &'static str, value: Option<&str>, max: usize) -> &mut Self {
        let len = value.map(|v| v.chars().count()).unwrap_or(0);
        self.check(len <= max, field, format!("must be at most {} characters", max))
    }

    /// Finite number inside `min..=max`
    pub fn range(&mut self, field: &'static str, value: f64, min: f64, max: f64) -> &mut Self {
        self.check(
            value.is_finite() && value >= min && value <= max,
            field,
            format!("must be between {} and {}", min, max),
        )
    }

    /// Finite, non-negative number
    pub fn non_negative(&mut self, field: &'static str, value: f64) -> &mut Self {
        self.check(value.is_finite() && value >= 0.0, field, "must be zero or greater")
    }

    /// Convert into a result
    pub fn finish(&mut self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

/// Lower-case, hyphen separated slug made of ASCII alphanumerics
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(ch.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Slugs are what `slugify` would produce for themselves
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}
