//! Repository for the `cms_page_versions` table.
//!
//! Versions are append-only: rows are inserted on publish and afterwards only
//! their `is_published` / `is_deleted` flags ever change.

use cms_core::error::CoreError;
use cms_core::types::{DbId, VersionNum};
use sqlx::types::Json;
use sqlx::PgExecutor;

use crate::error::StoreError;
use crate::models::cms_page_version::{CmsPageVersion, CreateCmsPageVersion};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, page_id, country_code, language_code, version_num, version_name, \
    content, is_published, published_at, remark, is_deleted, \
    created_by, updated_by, created_at, updated_at";

/// Provides append and history operations for page versions.
pub struct CmsPageVersionRepo;

impl CmsPageVersionRepo {
    // ── Append ──────────────────────────────────────────────────────

    /// Insert a new version snapshot.
    ///
    /// No invariant checks beyond the table's constraints: the caller picks
    /// `version_num` and is responsible for un-publishing older versions.
    pub async fn record<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateCmsPageVersion,
    ) -> Result<CmsPageVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO cms_page_versions
                (page_id, country_code, language_code, version_num, version_name, content,
                 is_published, published_at, remark, created_by, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, CASE WHEN $7::BOOLEAN THEN NOW() END, $8, $9, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CmsPageVersion>(&query)
            .bind(input.page_id)
            .bind(&input.country_code)
            .bind(&input.language_code)
            .bind(input.version_num)
            .bind(&input.version_name)
            .bind(Json(&input.content))
            .bind(input.is_published)
            .bind(&input.remark)
            .bind(&input.created_by)
            .fetch_one(executor)
            .await
    }

    // ── Publish flags ───────────────────────────────────────────────

    /// Clear `is_published` on every currently-published version of a page.
    /// Returns the number of rows flipped (0 or 1 while the invariant holds).
    pub async fn mark_all_unpublished<'e, E: PgExecutor<'e>>(
        executor: E,
        page_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE cms_page_versions SET is_published = false \
             WHERE page_id = $1 AND is_published",
        )
        .bind(page_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Clear `is_published` on every version of a page except `keep_id`.
    pub async fn unpublish_all_except<'e, E: PgExecutor<'e>>(
        executor: E,
        page_id: DbId,
        keep_id: Option<DbId>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE cms_page_versions SET is_published = false \
             WHERE page_id = $1 AND is_published AND id IS DISTINCT FROM $2",
        )
        .bind(page_id)
        .bind(keep_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    /// Set `is_published` on one live version. Returns `true` if it changed.
    pub async fn mark_published<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE cms_page_versions \
             SET is_published = true, published_at = COALESCE(published_at, NOW()) \
             WHERE id = $1 AND NOT is_published AND NOT is_deleted",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Lookups ─────────────────────────────────────────────────────

    /// Find a live version of a page by its version number.
    pub async fn find_by_page_and_version_num<'e, E: PgExecutor<'e>>(
        executor: E,
        page_id: DbId,
        version_num: VersionNum,
    ) -> Result<Option<CmsPageVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cms_page_versions
             WHERE page_id = $1 AND version_num = $2 AND NOT is_deleted"
        );
        sqlx::query_as::<_, CmsPageVersion>(&query)
            .bind(page_id)
            .bind(version_num)
            .fetch_optional(executor)
            .await
    }

    /// Find a live version by ID.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<CmsPageVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cms_page_versions WHERE id = $1 AND NOT is_deleted"
        );
        sqlx::query_as::<_, CmsPageVersion>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// List a page's versions, newest first.
    pub async fn list_history<'e, E: PgExecutor<'e>>(
        executor: E,
        page_id: DbId,
        include_deleted: bool,
    ) -> Result<Vec<CmsPageVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cms_page_versions
             WHERE page_id = $1 AND ($2::BOOLEAN OR NOT is_deleted)
             ORDER BY version_num DESC"
        );
        sqlx::query_as::<_, CmsPageVersion>(&query)
            .bind(page_id)
            .bind(include_deleted)
            .fetch_all(executor)
            .await
    }

    /// Highest version number recorded for a page, 0 if none.
    pub async fn max_version_num<'e, E: PgExecutor<'e>>(
        executor: E,
        page_id: DbId,
    ) -> Result<VersionNum, sqlx::Error> {
        let row: (VersionNum,) = sqlx::query_as(
            "SELECT COALESCE(MAX(version_num), 0) FROM cms_page_versions WHERE page_id = $1",
        )
        .bind(page_id)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// Number of versions of a page flagged as published.
    pub async fn count_published<'e, E: PgExecutor<'e>>(
        executor: E,
        page_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM cms_page_versions WHERE page_id = $1 AND is_published",
        )
        .bind(page_id)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    // ── Soft delete ─────────────────────────────────────────────────

    /// Soft-delete an unpublished version.
    ///
    /// Fails with `InvalidState` if the version is currently published and
    /// `NotFound` if it does not exist or is already deleted.
    pub async fn soft_delete(
        conn: &mut sqlx::PgConnection,
        id: DbId,
        user_id: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE cms_page_versions SET is_deleted = true, updated_by = $2 \
             WHERE id = $1 AND NOT is_deleted AND NOT is_published",
        )
        .bind(id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
        if result.rows_affected() > 0 {
            return Ok(());
        }

        match Self::find_by_id(&mut *conn, id).await? {
            Some(version) if version.is_published => Err(CoreError::InvalidState(format!(
                "Cannot delete version {} while it is published",
                version.version_num
            ))
            .into()),
            _ => Err(CoreError::not_found("CmsPageVersion", id).into()),
        }
    }
}
