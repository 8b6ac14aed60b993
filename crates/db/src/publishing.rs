//! Draft / publish / rollback workflow over the page registry and the
//! version ledger.
//!
//! Multi-statement operations (save-draft with rename, publish) run inside a
//! single transaction after locking the page row, so a failure at any step
//! leaves no partial state behind.

use cms_core::content::PageContent;
use cms_core::error::CoreError;
use cms_core::identity::PageIdentity;
use cms_core::search::{like_pattern, page_offset, Paginated};
use cms_core::types::{DbId, VersionNum};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::{StoreError, StoreResult};
use crate::models::cms_page::{CmsPage, CmsPageSummary, CreateCmsPage};
use crate::models::cms_page_version::{CmsPageVersion, CreateCmsPageVersion};
use crate::repositories::{CmsPageRepo, CmsPageVersionRepo};

const PAGE: &str = "CmsPage";
const VERSION: &str = "CmsPageVersion";

/// Input for [`PublishingWorkflow::save_draft`].
#[derive(Debug, Clone)]
pub struct SaveDraft {
    /// Identity the editor loaded the page under. `None` for a brand-new page.
    pub original: Option<PageIdentity>,
    /// Identity to persist the page under. Differs from `original` on rename.
    pub target: PageIdentity,
    pub content: PageContent,
    /// New title; `None` keeps the stored one (or derives it on create).
    pub title: Option<String>,
    pub user_id: String,
}

/// Outcome of a draft save.
#[derive(Debug, Clone, Serialize)]
pub struct SavedDraft {
    pub page_id: DbId,
    /// The identity actually persisted.
    pub identity: PageIdentity,
    pub created: bool,
    pub renamed: bool,
}

/// Page metadata handed to the editor alongside the draft.
#[derive(Debug, Clone, Serialize)]
pub struct PageInfo {
    pub id: DbId,
    pub title: String,
    pub slug: String,
    pub country_code: String,
    pub language_code: Option<String>,
    pub published_version_id: Option<DbId>,
}

/// A draft prepared for the editor.
#[derive(Debug, Clone, Serialize)]
pub struct EditorDraft {
    /// Draft with the persisted title/slug injected into `root.props`.
    pub content: Option<PageContent>,
    pub page_info: PageInfo,
}

/// Orchestrates the page lifecycle. Stateless; every call takes the pool.
pub struct PublishingWorkflow;

impl PublishingWorkflow {
    // ── Drafts ──────────────────────────────────────────────────────

    /// Save a draft, creating the page or renaming it as needed.
    ///
    /// The page is resolved by `original` (or `target` when no original is
    /// given). A missing page is created at `target`; an existing page whose
    /// identity differs from `target` is moved there. Either way `target` must
    /// not be held by a different live page.
    pub async fn save_draft(pool: &PgPool, input: &SaveDraft) -> StoreResult<SavedDraft> {
        input.target.check()?;

        let lookup = input.original.as_ref().unwrap_or(&input.target);
        let mut tx = pool.begin().await?;

        let saved = match CmsPageRepo::lock_by_identity(&mut *tx, lookup).await? {
            None => {
                if CmsPageRepo::find_by_identity(&mut *tx, &input.target)
                    .await?
                    .is_some()
                {
                    return Err(identity_taken(&input.target));
                }
                let title = input
                    .title
                    .clone()
                    .unwrap_or_else(|| input.content.extract_title());
                let page = CmsPageRepo::create(
                    &mut *tx,
                    &CreateCmsPage {
                        identity: input.target.clone(),
                        title,
                        draft_content: Some(input.content.clone()),
                        created_by: Some(input.user_id.clone()),
                    },
                )
                .await?;
                SavedDraft {
                    page_id: page.id,
                    identity: page.identity(),
                    created: true,
                    renamed: false,
                }
            }
            Some(page) => {
                let renamed = page.identity() != input.target;
                if renamed {
                    let occupant = CmsPageRepo::find_by_identity(&mut *tx, &input.target).await?;
                    if occupant.is_some_and(|other| other.id != page.id) {
                        return Err(identity_taken(&input.target));
                    }
                }
                let updated = CmsPageRepo::update_draft(
                    &mut *tx,
                    page.id,
                    &input.target,
                    input.title.as_deref(),
                    &input.content,
                    &input.user_id,
                )
                .await?
                .ok_or_else(|| CoreError::not_found(PAGE, lookup))?;
                SavedDraft {
                    page_id: updated.id,
                    identity: updated.identity(),
                    created: false,
                    renamed,
                }
            }
        };

        tx.commit().await?;

        tracing::info!(
            page_id = saved.page_id,
            identity = %saved.identity,
            created = saved.created,
            renamed = saved.renamed,
            user_id = %input.user_id,
            "Saved page draft"
        );
        Ok(saved)
    }

    /// Current draft of a live page, or `None` if the page or draft is absent.
    pub async fn get_draft_content(
        pool: &PgPool,
        identity: &PageIdentity,
    ) -> StoreResult<Option<PageContent>> {
        let page = CmsPageRepo::find_by_identity(pool, identity).await?;
        Ok(page.and_then(|p| p.draft_content.map(|json| json.0)))
    }

    /// Draft plus page metadata for the editor; fails if the page is absent.
    pub async fn load_draft_for_editor(
        pool: &PgPool,
        identity: &PageIdentity,
    ) -> StoreResult<EditorDraft> {
        let page = Self::require_page(pool, identity).await?;
        let content = page
            .draft()
            .cloned()
            .map(|c| c.with_page_info(&page.title, &page.slug));
        Ok(EditorDraft {
            content,
            page_info: PageInfo {
                id: page.id,
                title: page.title,
                slug: page.slug,
                country_code: page.country_code,
                language_code: page.language_code,
                published_version_id: page.published_version_id,
            },
        })
    }

    // ── Publish / rollback ──────────────────────────────────────────

    /// Freeze the current draft into a new published version.
    ///
    /// The new version takes the page's `version_counter` as its number; the
    /// previous live version is un-published and the page pointer advanced in
    /// the same transaction.
    pub async fn publish(
        pool: &PgPool,
        identity: &PageIdentity,
        user_id: &str,
        remark: Option<&str>,
    ) -> StoreResult<CmsPageVersion> {
        let mut tx = pool.begin().await?;

        let page = CmsPageRepo::lock_by_identity(&mut *tx, identity)
            .await?
            .ok_or_else(|| CoreError::not_found(PAGE, identity))?;

        let draft = match page.draft() {
            Some(content) if !content.is_empty() => content.clone(),
            _ => {
                return Err(CoreError::InvalidState(format!(
                    "Nothing to publish: page {identity} has an empty draft"
                ))
                .into())
            }
        };

        let unpublished = CmsPageVersionRepo::mark_all_unpublished(&mut *tx, page.id).await?;

        let version = CmsPageVersionRepo::record(
            &mut *tx,
            &CreateCmsPageVersion {
                page_id: page.id,
                country_code: page.country_code.clone(),
                language_code: page.language_code.clone(),
                version_num: page.version_counter,
                version_name: None,
                content: draft,
                is_published: true,
                remark: remark.map(str::to_string),
                created_by: Some(user_id.to_string()),
            },
        )
        .await?;

        let advanced = CmsPageRepo::advance_published(
            &mut *tx,
            page.id,
            version.id,
            page.version_counter,
            user_id,
        )
        .await?;
        if !advanced {
            return Err(CoreError::Conflict(format!(
                "Page {identity} was published concurrently; retry the publish"
            ))
            .into());
        }

        tx.commit().await?;

        tracing::info!(
            page_id = page.id,
            identity = %identity,
            version_id = version.id,
            version_num = version.version_num,
            unpublished,
            user_id = %user_id,
            "Published page"
        );
        Ok(version)
    }

    /// Reset the draft to a historical version's content.
    ///
    /// The live version is untouched; a later publish is needed to make the
    /// restored content live.
    pub async fn rollback(
        pool: &PgPool,
        identity: &PageIdentity,
        version_num: VersionNum,
        user_id: &str,
    ) -> StoreResult<()> {
        let page = Self::require_page(pool, identity).await?;
        let version = Self::require_version(pool, &page, version_num).await?;

        let updated =
            CmsPageRepo::set_draft_content(pool, page.id, &version.content.0, user_id).await?;
        if !updated {
            return Err(CoreError::not_found(PAGE, identity).into());
        }

        tracing::info!(
            page_id = page.id,
            identity = %identity,
            version_num,
            user_id = %user_id,
            "Rolled back page draft"
        );
        Ok(())
    }

    /// Content of the live version, or `None` if the page is absent,
    /// unpublished, or its live version is missing.
    pub async fn get_published_content(
        pool: &PgPool,
        identity: &PageIdentity,
    ) -> StoreResult<Option<PageContent>> {
        let Some(page) = CmsPageRepo::find_by_identity(pool, identity).await? else {
            return Ok(None);
        };
        let Some(version_id) = page.published_version_id else {
            return Ok(None);
        };
        let version = CmsPageVersionRepo::find_by_id(pool, version_id).await?;
        Ok(version.map(|v| v.content.0))
    }

    // ── Version history ─────────────────────────────────────────────

    /// A page's versions, newest first.
    pub async fn list_version_history(
        pool: &PgPool,
        identity: &PageIdentity,
        include_deleted: bool,
    ) -> StoreResult<Vec<CmsPageVersion>> {
        let page = Self::require_page(pool, identity).await?;
        Ok(CmsPageVersionRepo::list_history(pool, page.id, include_deleted).await?)
    }

    /// One historical version of a page.
    pub async fn get_version(
        pool: &PgPool,
        identity: &PageIdentity,
        version_num: VersionNum,
    ) -> StoreResult<CmsPageVersion> {
        let page = Self::require_page(pool, identity).await?;
        Self::require_version(pool, &page, version_num).await
    }

    /// Soft-delete a version; the live version cannot be deleted.
    pub async fn soft_delete_version(
        pool: &PgPool,
        identity: &PageIdentity,
        version_num: VersionNum,
        user_id: &str,
    ) -> StoreResult<()> {
        let page = Self::require_page(pool, identity).await?;
        let version = Self::require_version(pool, &page, version_num).await?;

        let mut conn = pool.acquire().await?;
        CmsPageVersionRepo::soft_delete(&mut conn, version.id, user_id).await?;

        tracing::info!(
            page_id = page.id,
            version_id = version.id,
            version_num,
            user_id = %user_id,
            "Deleted page version"
        );
        Ok(())
    }

    // ── Page lifecycle ──────────────────────────────────────────────

    /// Soft-delete a live page. Its versions are kept.
    pub async fn soft_delete_page(
        pool: &PgPool,
        identity: &PageIdentity,
        user_id: &str,
    ) -> StoreResult<()> {
        let page = Self::require_page(pool, identity).await?;
        // A concurrent delete may have flipped the flag first.
        if !CmsPageRepo::set_deleted(pool, page.id, true, user_id).await? {
            return Err(CoreError::not_found(PAGE, identity).into());
        }
        tracing::info!(page_id = page.id, identity = %identity, user_id = %user_id, "Deleted page");
        Ok(())
    }

    /// Restore the most recently deleted page with this identity.
    ///
    /// Fails with `Conflict` if a live page already holds the identity.
    pub async fn restore_page(
        pool: &PgPool,
        identity: &PageIdentity,
        user_id: &str,
    ) -> StoreResult<()> {
        let mut tx = pool.begin().await?;

        let page = CmsPageRepo::find_deleted_by_identity(&mut *tx, identity)
            .await?
            .ok_or_else(|| CoreError::not_found("deleted CmsPage", identity))?;
        if CmsPageRepo::find_by_identity(&mut *tx, identity)
            .await?
            .is_some()
        {
            return Err(identity_taken(identity));
        }
        if !CmsPageRepo::set_deleted(&mut *tx, page.id, false, user_id).await? {
            return Err(CoreError::not_found("deleted CmsPage", identity).into());
        }

        tx.commit().await?;
        tracing::info!(page_id = page.id, identity = %identity, user_id = %user_id, "Restored page");
        Ok(())
    }

    // ── Search ──────────────────────────────────────────────────────

    /// Case-insensitive substring search over title and slug of live pages,
    /// most recently updated first. `page` is 1-based.
    pub async fn search_pages(
        pool: &PgPool,
        keyword: &str,
        page: i64,
        page_size: i64,
    ) -> StoreResult<Paginated<CmsPageSummary>> {
        let pattern = like_pattern(keyword);
        let total = CmsPageRepo::count_matching(pool, pattern.as_deref()).await?;
        let items = CmsPageRepo::search(
            pool,
            pattern.as_deref(),
            page_size,
            page_offset(page, page_size),
        )
        .await?;
        Ok(Paginated::new(items, total, page, page_size))
    }

    // ── Helpers ─────────────────────────────────────────────────────

    async fn require_page(pool: &PgPool, identity: &PageIdentity) -> StoreResult<CmsPage> {
        CmsPageRepo::find_by_identity(pool, identity)
            .await?
            .ok_or_else(|| CoreError::not_found(PAGE, identity).into())
    }

    async fn require_version(
        pool: &PgPool,
        page: &CmsPage,
        version_num: VersionNum,
    ) -> StoreResult<CmsPageVersion> {
        CmsPageVersionRepo::find_by_page_and_version_num(pool, page.id, version_num)
            .await?
            .ok_or_else(|| {
                CoreError::not_found(VERSION, format!("{} v{version_num}", page.identity())).into()
            })
    }
}

fn identity_taken(identity: &PageIdentity) -> StoreError {
    CoreError::Conflict(format!(
        "Page identity {identity} is already used by another page"
    ))
    .into()
}
