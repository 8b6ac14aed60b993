//! Shared query parameter types for API handlers.

use cms_core::identity::PageIdentity;
use serde::Deserialize;

/// Page identity in a query string (`?slug=&country=&language=`).
///
/// `country` defaults to the global scope; `language` is optional.
#[derive(Debug, Deserialize)]
pub struct IdentityParams {
    #[serde(default)]
    pub slug: String,
    pub country: Option<String>,
    pub language: Option<String>,
}

impl IdentityParams {
    pub fn identity(&self) -> PageIdentity {
        PageIdentity::new(
            &self.slug,
            self.country.as_deref(),
            self.language.as_deref(),
        )
    }
}

/// Identity plus the `include_deleted` flag for version listings.
///
/// Spelled out rather than flattened: flattened query structs lose typed
/// (non-string) fields.
#[derive(Debug, Deserialize)]
pub struct VersionHistoryParams {
    #[serde(default)]
    pub slug: String,
    pub country: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub include_deleted: bool,
}

impl VersionHistoryParams {
    pub fn identity(&self) -> PageIdentity {
        PageIdentity::new(
            &self.slug,
            self.country.as_deref(),
            self.language.as_deref(),
        )
    }
}

/// Page search parameters (`?keyword=&page=&page_size=`).
///
/// Values are clamped in the handler via `clamp_page` / `clamp_limit`.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub keyword: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}
