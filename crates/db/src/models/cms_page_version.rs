//! CMS page version model.
//!
//! Versions are immutable snapshots of a page's draft, created on publish.

use cms_core::content::PageContent;
use cms_core::types::{DbId, Timestamp, VersionNum};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `cms_page_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CmsPageVersion {
    pub id: DbId,
    pub page_id: DbId,
    pub country_code: String,
    pub language_code: Option<String>,
    pub version_num: VersionNum,
    /// Optional alias such as a campaign name.
    pub version_name: Option<String>,
    pub content: Json<PageContent>,
    pub is_published: bool,
    pub published_at: Option<Timestamp>,
    /// Changelog note supplied at publish time.
    pub remark: Option<String>,
    pub is_deleted: bool,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording a new version snapshot.
#[derive(Debug, Clone)]
pub struct CreateCmsPageVersion {
    pub page_id: DbId,
    pub country_code: String,
    pub language_code: Option<String>,
    pub version_num: VersionNum,
    pub version_name: Option<String>,
    pub content: PageContent,
    pub is_published: bool,
    pub remark: Option<String>,
    pub created_by: Option<String>,
}

/// History listing projection of a version, without the content document.
#[derive(Debug, Clone, Serialize)]
pub struct CmsPageVersionSummary {
    pub id: DbId,
    pub version_num: VersionNum,
    pub version_name: Option<String>,
    pub is_published: bool,
    pub published_at: Option<Timestamp>,
    pub remark: Option<String>,
    pub is_deleted: bool,
    pub created_by: Option<String>,
    pub created_at: Timestamp,
}

impl From<CmsPageVersion> for CmsPageVersionSummary {
    fn from(v: CmsPageVersion) -> Self {
        Self {
            id: v.id,
            version_num: v.version_num,
            version_name: v.version_name,
            is_published: v.is_published,
            published_at: v.published_at,
            remark: v.remark,
            is_deleted: v.is_deleted,
            created_by: v.created_by,
            created_at: v.created_at,
        }
    }
}
