//! Editor attribution extractor for Axum handlers.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::state::AppState;

/// Header naming the editor on whose behalf a change is made.
pub const EDITOR_HEADER: &str = "x-user-id";

/// The editor recorded as `created_by` / `updated_by` on changes.
///
/// Taken from the `x-user-id` header, falling back to the configured
/// default user. Authentication happens upstream of this service.
///
/// ```ignore
/// async fn my_handler(editor: Editor) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %editor.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Editor {
    pub user_id: String,
}

impl FromRequestParts<AppState> for Editor {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(EDITOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| state.config.default_user.clone());

        Ok(Editor { user_id })
    }
}
