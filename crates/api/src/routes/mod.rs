pub mod cms;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /cms/pages ...                                   page drafts, publishing, history
/// /cms/maintenance/reconcile                       consistency repair
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/cms", cms::router())
}
