//! URL-safe tenant slug value object.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Globally unique, URL-safe tenant identifier (e.g. `"golf-club-42"`).
///
/// Slugs are immutable once a tenant is active: they appear in vanity URLs
/// and white-label domains, so renames would break customer links.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantSlug(String);

impl TenantSlug {
    /// Minimum slug length.
    pub const MIN_LEN: usize = 3;
    /// Maximum slug length (DNS label limit, for custom subdomains).
    pub const MAX_LEN: usize = 63;

    /// Creates a slug, validating the URL-safe shape.
    ///
    /// Valid slugs are lowercase ASCII letters, digits, and single hyphens;
    /// they cannot start or end with a hyphen.
    pub fn new(slug: impl Into<String>) -> Result<Self, ValidationError> {
        let slug = slug.into();

        if slug.len() < Self::MIN_LEN || slug.len() > Self::MAX_LEN {
            return Err(ValidationError::out_of_range(
                "slug",
                Self::MIN_LEN as i64,
                Self::MAX_LEN as i64,
                slug.len() as i64,
            ));
        }
        if !slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        {
            return Err(ValidationError::invalid_format(
                "slug",
                "only lowercase letters, digits, and hyphens are allowed",
            ));
        }
        if slug.starts_with('-') || slug.ends_with('-') || slug.contains("--") {
            return Err(ValidationError::invalid_format(
                "slug",
                "hyphens cannot lead, trail, or repeat",
            ));
        }

        Ok(Self(slug))
    }

    /// Returns the slug as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TenantSlug {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TenantSlug::new(value)
    }
}

impl From<TenantSlug> for String {
    fn from(slug: TenantSlug) -> Self {
        slug.0
    }
}
