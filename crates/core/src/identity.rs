//! Page identity value object.
//!
//! A page is named by the tuple `(slug, country_code, language_code?)`. The
//! tuple is unique among non-deleted pages; two pages may share a slug when
//! they differ in country or language.

use std::fmt;

use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::CoreError;

/// Country used when a caller does not name one.
pub const DEFAULT_COUNTRY: &str = "glo";

/// The `(slug, country, language?)` key of a page.
///
/// Construct through [`PageIdentity::new`] so the fields are normalized;
/// equality is structural over the normalized fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Validate)]
pub struct PageIdentity {
    #[validate(
        length(min = 1, max = 200, message = "slug is required"),
        custom(function = "validate_slug_chars")
    )]
    pub slug: String,
    #[validate(custom(function = "validate_code"))]
    pub country_code: String,
    pub language_code: Option<String>,
}

impl PageIdentity {
    /// Build a normalized identity.
    ///
    /// Whitespace is trimmed, codes are lower-cased, leading/trailing `/` are
    /// stripped from the slug, an empty country falls back to
    /// [`DEFAULT_COUNTRY`] and an empty language becomes `None`.
    pub fn new(slug: &str, country_code: Option<&str>, language_code: Option<&str>) -> Self {
        let slug = slug.trim().trim_matches('/').to_string();

        let country_code = country_code
            .map(|c| c.trim().to_ascii_lowercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());

        let language_code = language_code
            .map(|l| l.trim().to_ascii_lowercase())
            .filter(|l| !l.is_empty());

        Self {
            slug,
            country_code,
            language_code,
        }
    }

    /// Check the identity is usable as a page key.
    ///
    /// An empty slug is reported as `"slug is required"`.
    pub fn check(&self) -> Result<(), CoreError> {
        if self.slug.is_empty() {
            return Err(CoreError::Validation("slug is required".into()));
        }
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };
        if let Some(lang) = &self.language_code {
            if let Err(err) = validate_code(lang) {
                errors.add("language_code", err);
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(describe_errors(&errors)))
        }
    }

    pub fn language(&self) -> Option<&str> {
        self.language_code.as_deref()
    }
}

impl fmt::Display for PageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.slug, self.country_code)?;
        if let Some(lang) = &self.language_code {
            write!(f, "/{lang}")?;
        }
        Ok(())
    }
}

fn validate_slug_chars(slug: &str) -> Result<(), ValidationError> {
    if slug.chars().any(|c| c.is_whitespace() || c.is_control()) {
        let mut err = ValidationError::new("slug_chars");
        err.message = Some("slug must not contain whitespace".into());
        return Err(err);
    }
    Ok(())
}

fn validate_code(code: &str) -> Result<(), ValidationError> {
    let ok = (2..=8).contains(&code.len())
        && code.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !ok {
        let mut err = ValidationError::new("locale_code");
        err.message = Some("locale codes must be 2-8 lowercase alphanumeric characters".into());
        return Err(err);
    }
    Ok(())
}

/// Flatten `validator` errors into a single stable message.
fn describe_errors(errors: &ValidationErrors) -> String {
    let mut parts: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{field}: {msg}"),
                None => format!("{field}: {}", e.code),
            })
        })
        .collect();
    parts.sort();
    parts.join("; ")
}
