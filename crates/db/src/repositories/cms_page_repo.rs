//! Repository for the `cms_pages` table.
//!
//! Lookups by identity only ever see live (non-deleted) pages unless the
//! method name says otherwise.

use cms_core::content::PageContent;
use cms_core::identity::PageIdentity;
use cms_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use crate::models::cms_page::{CmsPage, CmsPageSummary, CreateCmsPage};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, slug, country_code, language_code, title, draft_content, \
    published_version_id, published_at, version_counter, is_deleted, \
    created_by, updated_by, created_at, updated_at";

/// Columns for the listing projection.
const SUMMARY_COLUMNS: &str = "id, slug, country_code, language_code, title, \
    published_version_id, published_at, version_counter, updated_by, updated_at";

/// Identity predicate over `$1..$3`. A NULL language only matches NULL.
const IDENTITY_MATCH: &str =
    "slug = $1 AND country_code = $2 AND language_code IS NOT DISTINCT FROM $3";

/// Provides identity lookups, draft updates and listing for CMS pages.
pub struct CmsPageRepo;

impl CmsPageRepo {
    // ── Lookups ─────────────────────────────────────────────────────

    /// Find the live page with the given identity.
    pub async fn find_by_identity<'e, E: PgExecutor<'e>>(
        executor: E,
        identity: &PageIdentity,
    ) -> Result<Option<CmsPage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cms_pages WHERE {IDENTITY_MATCH} AND NOT is_deleted"
        );
        sqlx::query_as::<_, CmsPage>(&query)
            .bind(&identity.slug)
            .bind(&identity.country_code)
            .bind(&identity.language_code)
            .fetch_optional(executor)
            .await
    }

    /// Like [`Self::find_by_identity`] but takes a row lock for the rest of
    /// the enclosing transaction.
    pub async fn lock_by_identity<'e, E: PgExecutor<'e>>(
        executor: E,
        identity: &PageIdentity,
    ) -> Result<Option<CmsPage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cms_pages \
             WHERE {IDENTITY_MATCH} AND NOT is_deleted \
             FOR UPDATE"
        );
        sqlx::query_as::<_, CmsPage>(&query)
            .bind(&identity.slug)
            .bind(&identity.country_code)
            .bind(&identity.language_code)
            .fetch_optional(executor)
            .await
    }

    /// Find the most recently updated soft-deleted page with the given identity.
    pub async fn find_deleted_by_identity<'e, E: PgExecutor<'e>>(
        executor: E,
        identity: &PageIdentity,
    ) -> Result<Option<CmsPage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cms_pages \
             WHERE {IDENTITY_MATCH} AND is_deleted \
             ORDER BY updated_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, CmsPage>(&query)
            .bind(&identity.slug)
            .bind(&identity.country_code)
            .bind(&identity.language_code)
            .fetch_optional(executor)
            .await
    }

    /// Find a page by ID, including soft-deleted rows.
    pub async fn find_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<CmsPage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cms_pages WHERE id = $1");
        sqlx::query_as::<_, CmsPage>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Lock a page row by ID for the rest of the enclosing transaction.
    pub async fn lock_by_id<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
    ) -> Result<Option<CmsPage>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM cms_pages WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, CmsPage>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Insert a new live page with `version_counter = 1`.
    pub async fn create<'e, E: PgExecutor<'e>>(
        executor: E,
        input: &CreateCmsPage,
    ) -> Result<CmsPage, sqlx::Error> {
        let query = format!(
            "INSERT INTO cms_pages
                (slug, country_code, language_code, title, draft_content,
                 version_counter, is_deleted, created_by, updated_by)
             VALUES ($1, $2, $3, $4, $5, 1, false, $6, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CmsPage>(&query)
            .bind(&input.identity.slug)
            .bind(&input.identity.country_code)
            .bind(&input.identity.language_code)
            .bind(&input.title)
            .bind(input.draft_content.as_ref().map(Json))
            .bind(&input.created_by)
            .fetch_one(executor)
            .await
    }

    /// Overwrite a page's draft, moving it to `identity` at the same time.
    ///
    /// `title` is left untouched when `None`. Returns `None` if the page does
    /// not exist or is soft-deleted.
    pub async fn update_draft<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        identity: &PageIdentity,
        title: Option<&str>,
        content: &PageContent,
        user_id: &str,
    ) -> Result<Option<CmsPage>, sqlx::Error> {
        let query = format!(
            "UPDATE cms_pages SET
                slug = $2,
                country_code = $3,
                language_code = $4,
                title = COALESCE($5, title),
                draft_content = $6,
                updated_by = $7
             WHERE id = $1 AND NOT is_deleted
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CmsPage>(&query)
            .bind(id)
            .bind(&identity.slug)
            .bind(&identity.country_code)
            .bind(&identity.language_code)
            .bind(title)
            .bind(Json(content))
            .bind(user_id)
            .fetch_optional(executor)
            .await
    }

    /// Replace only the draft document. Returns `true` if a live row was updated.
    pub async fn set_draft_content<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        content: &PageContent,
        user_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE cms_pages SET draft_content = $2, updated_by = $3 \
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .bind(Json(content))
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Flip the soft-delete flag. Returns `true` if the flag changed.
    pub async fn set_deleted<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        deleted: bool,
        user_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE cms_pages SET is_deleted = $2, updated_by = $3 \
             WHERE id = $1 AND is_deleted <> $2",
        )
        .bind(id)
        .bind(deleted)
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Point the page at a freshly published version and advance its counter.
    ///
    /// The update only applies while `version_counter` still equals
    /// `expected_counter`; returns `false` when another writer got there first.
    pub async fn advance_published<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        version_id: DbId,
        expected_counter: i32,
        user_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE cms_pages SET
                published_version_id = $2,
                published_at = NOW(),
                version_counter = version_counter + 1,
                updated_by = $4
             WHERE id = $1 AND version_counter = $3",
        )
        .bind(id)
        .bind(version_id)
        .bind(expected_counter)
        .bind(user_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Repair the published pointer and counter of a page.
    pub async fn repair_pointer<'e, E: PgExecutor<'e>>(
        executor: E,
        id: DbId,
        published_version_id: Option<DbId>,
        version_counter: i32,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE cms_pages SET
                published_version_id = $2,
                published_at = CASE WHEN $2::BIGINT IS NULL THEN NULL ELSE published_at END,
                version_counter = $3
             WHERE id = $1",
        )
        .bind(id)
        .bind(published_version_id)
        .bind(version_counter)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Listing ─────────────────────────────────────────────────────

    /// Search live pages whose title or slug matches `pattern` (an `ILIKE`
    /// pattern; `None` matches everything), most recently updated first.
    pub async fn search(
        pool: &PgPool,
        pattern: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CmsPageSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM cms_pages
             WHERE NOT is_deleted
               AND ($1::TEXT IS NULL OR title ILIKE $1 OR slug ILIKE $1)
             ORDER BY updated_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, CmsPageSummary>(&query)
            .bind(pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Count live pages matching the same predicate as [`Self::search`].
    pub async fn count_matching(pool: &PgPool, pattern: Option<&str>) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM cms_pages \
             WHERE NOT is_deleted \
               AND ($1::TEXT IS NULL OR title ILIKE $1 OR slug ILIKE $1)",
        )
        .bind(pattern)
        .fetch_one(pool)
        .await?;
        Ok(row.0)
    }

    /// IDs of every page, deleted or not, in ascending order.
    pub async fn list_ids(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        let rows: Vec<(DbId,)> = sqlx::query_as("SELECT id FROM cms_pages ORDER BY id")
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }
}
