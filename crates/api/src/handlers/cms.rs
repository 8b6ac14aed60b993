//! Handlers for CMS pages: drafts, publishing, version history, search and
//! maintenance.
//!
//! Page identity travels as `slug` / `country` / `language`, in the JSON body
//! for mutations and in the query string for reads. Slugs may contain `/`, so
//! they are never path segments.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use cms_core::content::PageContent;
use cms_core::error::CoreError;
use cms_core::identity::PageIdentity;
use cms_core::search::{clamp_limit, clamp_page, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use cms_core::types::{DbId, VersionNum};
use cms_db::models::cms_page_version::CmsPageVersionSummary;
use cms_db::publishing::{PublishingWorkflow, SaveDraft};
use cms_db::reconcile::Reconciler;

use crate::error::{AppError, AppResult};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::editor::Editor;
use crate::query::{IdentityParams, SearchParams, VersionHistoryParams};
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
Request bodies
-------------------------------------------------------------------------- */

/// Identity carried in a mutation body.
#[derive(Debug, Deserialize)]
pub struct IdentityBody {
    #[serde(default)]
    pub slug: String,
    pub country: Option<String>,
    pub language: Option<String>,
}

impl IdentityBody {
    fn identity(&self) -> PageIdentity {
        PageIdentity::new(&self.slug, self.country.as_deref(), self.language.as_deref())
    }
}

/// Body of `POST /pages/draft`.
#[derive(Debug, Deserialize, Validate)]
pub struct SaveDraftRequest {
    #[serde(flatten)]
    pub target: IdentityBody,
    /// Identity the editor loaded the page under; set when renaming.
    pub original_slug: Option<String>,
    pub original_country: Option<String>,
    pub original_language: Option<String>,
    #[validate(length(max = 500, message = "title must be at most 500 characters"))]
    pub title: Option<String>,
    pub content: serde_json::Value,
}

impl SaveDraftRequest {
    fn original(&self) -> Option<PageIdentity> {
        let slug = self.original_slug.as_deref().filter(|s| !s.trim().is_empty())?;
        Some(PageIdentity::new(
            slug,
            self.original_country.as_deref(),
            self.original_language.as_deref(),
        ))
    }
}

/// Body of `POST /pages/publish`.
#[derive(Debug, Deserialize, Validate)]
pub struct PublishRequest {
    #[serde(flatten)]
    pub page: IdentityBody,
    #[validate(length(max = 1000, message = "remark must be at most 1000 characters"))]
    pub remark: Option<String>,
}

/// Body of `POST /pages/rollback`.
#[derive(Debug, Deserialize, Validate)]
pub struct RollbackRequest {
    #[serde(flatten)]
    pub page: IdentityBody,
    #[validate(range(min = 1, message = "version_num must be positive"))]
    pub version_num: VersionNum,
}

/// Body of `POST /maintenance/reconcile`.
#[derive(Debug, Default, Deserialize)]
pub struct ReconcileRequest {
    /// Limit the pass to one page.
    pub page_id: Option<DbId>,
    /// Report inconsistencies without repairing them.
    #[serde(default)]
    pub dry_run: bool,
}

/* --------------------------------------------------------------------------
Response bodies
-------------------------------------------------------------------------- */

#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub version_id: DbId,
    pub version_num: VersionNum,
}

/* --------------------------------------------------------------------------
Helpers
-------------------------------------------------------------------------- */

fn check_request(input: &impl Validate) -> AppResult<()> {
    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))
}

/// Reject identities outside the locale catalogue when enforcement is on.
fn check_locale(state: &AppState, identity: &PageIdentity) -> AppResult<()> {
    if state.config.enforce_locales {
        state.locales.check(identity)?;
    }
    Ok(())
}

fn require_slug(identity: &PageIdentity) -> AppResult<()> {
    if identity.slug.is_empty() {
        return Err(AppError::BadRequest("slug is required".into()));
    }
    Ok(())
}

/* --------------------------------------------------------------------------
Search
-------------------------------------------------------------------------- */

/// GET /cms/pages
///
/// Case-insensitive keyword search over title and slug, newest first.
pub async fn search_pages(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> AppResult<impl IntoResponse> {
    let page = clamp_page(params.page);
    let page_size = clamp_limit(params.page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    let keyword = params.keyword.unwrap_or_default();

    let result = PublishingWorkflow::search_pages(&state.pool, &keyword, page, page_size).await?;
    Ok(Json(DataResponse { data: result }))
}

/* --------------------------------------------------------------------------
Drafts
-------------------------------------------------------------------------- */

/// POST /cms/pages/draft
///
/// Save the draft, creating the page (201) or updating / renaming it (200).
pub async fn save_draft(
    editor: Editor,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<SaveDraftRequest>,
) -> AppResult<impl IntoResponse> {
    check_request(&input)?;

    let target = input.target.identity();
    target.check()?;
    check_locale(&state, &target)?;
    let content = PageContent::from_value(input.content.clone())?;

    let saved = PublishingWorkflow::save_draft(
        &state.pool,
        &SaveDraft {
            original: input.original(),
            target,
            content,
            title: input.title.clone(),
            user_id: editor.user_id,
        },
    )
    .await?;

    let status = if saved.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(DataResponse { data: saved })))
}

/// GET /cms/pages/draft
///
/// Load the draft for the editor with the persisted title and slug injected.
pub async fn load_draft(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<IdentityParams>,
) -> AppResult<impl IntoResponse> {
    let identity = params.identity();
    require_slug(&identity)?;

    let draft = PublishingWorkflow::load_draft_for_editor(&state.pool, &identity).await?;
    Ok(Json(DataResponse { data: draft }))
}

/// GET /cms/pages/published
///
/// Live content of a page; `data` is `null` when nothing is published.
pub async fn get_published(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<IdentityParams>,
) -> AppResult<impl IntoResponse> {
    let identity = params.identity();
    require_slug(&identity)?;

    let content = PublishingWorkflow::get_published_content(&state.pool, &identity).await?;
    Ok(Json(DataResponse { data: content }))
}

/* --------------------------------------------------------------------------
Publish / rollback
-------------------------------------------------------------------------- */

/// POST /cms/pages/publish
pub async fn publish(
    editor: Editor,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<PublishRequest>,
) -> AppResult<impl IntoResponse> {
    check_request(&input)?;
    let identity = input.page.identity();
    require_slug(&identity)?;

    let version = PublishingWorkflow::publish(
        &state.pool,
        &identity,
        &editor.user_id,
        input.remark.as_deref(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: PublishResponse {
                version_id: version.id,
                version_num: version.version_num,
            },
        }),
    ))
}

/// POST /cms/pages/rollback
///
/// Reset the draft to a historical version; the live version is unchanged.
pub async fn rollback(
    editor: Editor,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<RollbackRequest>,
) -> AppResult<StatusCode> {
    check_request(&input)?;
    let identity = input.page.identity();
    require_slug(&identity)?;

    PublishingWorkflow::rollback(&state.pool, &identity, input.version_num, &editor.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/* --------------------------------------------------------------------------
Page lifecycle
-------------------------------------------------------------------------- */

/// DELETE /cms/pages
pub async fn delete_page(
    editor: Editor,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<IdentityBody>,
) -> AppResult<StatusCode> {
    let identity = input.identity();
    require_slug(&identity)?;

    PublishingWorkflow::soft_delete_page(&state.pool, &identity, &editor.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /cms/pages/restore
pub async fn restore_page(
    editor: Editor,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<IdentityBody>,
) -> AppResult<StatusCode> {
    let identity = input.identity();
    require_slug(&identity)?;

    PublishingWorkflow::restore_page(&state.pool, &identity, &editor.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/* --------------------------------------------------------------------------
Version history
-------------------------------------------------------------------------- */

/// GET /cms/pages/versions
///
/// Version history, newest first, without the content documents.
pub async fn list_versions(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<VersionHistoryParams>,
) -> AppResult<impl IntoResponse> {
    let identity = params.identity();
    require_slug(&identity)?;

    let versions =
        PublishingWorkflow::list_version_history(&state.pool, &identity, params.include_deleted)
            .await?;
    let data: Vec<CmsPageVersionSummary> = versions.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse { data }))
}

/// GET /cms/pages/versions/{version_num}
pub async fn get_version(
    State(state): State<AppState>,
    ApiPath(version_num): ApiPath<VersionNum>,
    ApiQuery(params): ApiQuery<IdentityParams>,
) -> AppResult<impl IntoResponse> {
    let identity = params.identity();
    require_slug(&identity)?;

    let version = PublishingWorkflow::get_version(&state.pool, &identity, version_num).await?;
    Ok(Json(DataResponse { data: version }))
}

/// DELETE /cms/pages/versions/{version_num}
///
/// Fails with 422 while the version is live.
pub async fn delete_version(
    editor: Editor,
    State(state): State<AppState>,
    ApiPath(version_num): ApiPath<VersionNum>,
    ApiJson(input): ApiJson<IdentityBody>,
) -> AppResult<StatusCode> {
    let identity = input.identity();
    require_slug(&identity)?;

    PublishingWorkflow::soft_delete_version(&state.pool, &identity, version_num, &editor.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/* --------------------------------------------------------------------------
Maintenance
-------------------------------------------------------------------------- */

/// POST /cms/maintenance/reconcile
///
/// Repair pointer/flag/counter drift, or just report it with `dry_run`.
pub async fn reconcile(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ReconcileRequest>,
) -> AppResult<axum::response::Response> {
    if input.dry_run {
        let found = Reconciler::find_inconsistent_pages(&state.pool).await?;
        let found: Vec<_> = match input.page_id {
            Some(id) => found.into_iter().filter(|p| p.page_id == id).collect(),
            None => found,
        };
        return Ok(Json(DataResponse { data: found }).into_response());
    }

    let report = Reconciler::reconcile(&state.pool, input.page_id).await?;
    Ok(Json(DataResponse { data: report }).into_response())
}
