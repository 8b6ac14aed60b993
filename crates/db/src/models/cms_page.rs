//! CMS page entity model and DTOs.

use cms_core::content::PageContent;
use cms_core::identity::PageIdentity;
use cms_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `cms_pages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CmsPage {
    pub id: DbId,
    pub slug: String,
    pub country_code: String,
    pub language_code: Option<String>,
    /// Plain text, or a per-language map serialized as JSON text.
    pub title: String,
    pub draft_content: Option<Json<PageContent>>,
    pub published_version_id: Option<DbId>,
    pub published_at: Option<Timestamp>,
    /// Version number the next publish will be assigned.
    pub version_counter: i32,
    pub is_deleted: bool,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CmsPage {
    pub fn identity(&self) -> PageIdentity {
        PageIdentity {
            slug: self.slug.clone(),
            country_code: self.country_code.clone(),
            language_code: self.language_code.clone(),
        }
    }

    pub fn draft(&self) -> Option<&PageContent> {
        self.draft_content.as_ref().map(|Json(content)| content)
    }
}

/// Listing projection of a page, without the draft document.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CmsPageSummary {
    pub id: DbId,
    pub slug: String,
    pub country_code: String,
    pub language_code: Option<String>,
    pub title: String,
    pub published_version_id: Option<DbId>,
    pub published_at: Option<Timestamp>,
    pub version_counter: i32,
    pub updated_by: Option<String>,
    pub updated_at: Timestamp,
}

/// DTO for inserting a new page.
#[derive(Debug, Clone)]
pub struct CreateCmsPage {
    pub identity: PageIdentity,
    pub title: String,
    pub draft_content: Option<PageContent>,
    pub created_by: Option<String>,
}
