//! Route definitions for CMS pages.
//!
//! Registered under `/cms`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::cms;
use crate::state::AppState;

/// CMS routes, registered as `/cms`.
///
/// ```text
/// GET    /pages                           search_pages
/// DELETE /pages                           delete_page
/// GET    /pages/draft                     load_draft
/// POST   /pages/draft                     save_draft
/// GET    /pages/published                 get_published
/// POST   /pages/publish                   publish
/// POST   /pages/rollback                  rollback
/// POST   /pages/restore                   restore_page
/// GET    /pages/versions                  list_versions
/// GET    /pages/versions/{version_num}    get_version
/// DELETE /pages/versions/{version_num}    delete_version
/// POST   /maintenance/reconcile           reconcile
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pages", get(cms::search_pages).delete(cms::delete_page))
        .route("/pages/draft", get(cms::load_draft).post(cms::save_draft))
        .route("/pages/published", get(cms::get_published))
        .route("/pages/publish", post(cms::publish))
        .route("/pages/rollback", post(cms::rollback))
        .route("/pages/restore", post(cms::restore_page))
        .route("/pages/versions", get(cms::list_versions))
        .route(
            "/pages/versions/{version_num}",
            get(cms::get_version).delete(cms::delete_version),
        )
        .route("/maintenance/reconcile", post(cms::reconcile))
}
