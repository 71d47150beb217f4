use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::middleware::auth::optional_auth_middleware;
use crate::models::essential::ContentQuery;
use crate::response::{self, ApiError};
use crate::AppState;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

/// Zero-based offset of the first item on `page`. Widened arithmetic so
/// hostile page/limit query values cannot overflow.
fn page_offset(page: u32, limit: u32) -> usize {
    let offset = (page.max(1) as u64 - 1) * limit as u64;
    offset.min(usize::MAX as u64) as usize
}

pub fn essential_routes() -> Router {
    Router::new()
        .route("/api/essential/categories", get(list_categories))
        .route("/api/essential/categories/:id", get(get_category))
        .route("/api/essential/categories/:id/content", get(get_category_content))
        .route("/api/essential/content/:id", get(get_content))
        .layer(axum::middleware::from_fn(optional_auth_middleware))
}

async fn list_categories(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    Ok(response::ok(
        state.catalog.categories().to_vec(),
        "Essential categories retrieved successfully",
    ))
}

async fn get_category(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let category = state
        .catalog
        .category(&id)
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))?;

    Ok(response::ok(
        category.clone(),
        "Category retrieved successfully",
    ))
}

async fn get_category_content(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ContentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let page = query.page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let matching = state
        .catalog
        .content_for_category(&id, query.content_type.as_deref());
    let total = matching.len() as u32;

    let page_items: Vec<_> = matching
        .into_iter()
        .skip(page_offset(page, limit))
        .take(limit as usize)
        .cloned()
        .collect();

    Ok(response::paginated(
        page_items,
        page,
        limit,
        total,
        "Category content retrieved successfully",
    ))
}

async fn get_content(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let content = state
        .catalog
        .content(&id)
        .ok_or_else(|| ApiError::NotFound("Content not found".to_string()))?;

    Ok(response::ok(
        content.clone(),
        "Content retrieved successfully",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offset_is_zero_based() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(3, 10), 20);
        assert_eq!(page_offset(0, 10), 0);
    }

    #[test]
    fn page_offset_survives_extreme_query_values() {
        // Must not overflow for any u32 page/limit combination.
        let offset = page_offset(u32::MAX, MAX_LIMIT);
        assert_eq!(offset as u64, (u32::MAX as u64 - 1) * MAX_LIMIT as u64);

        let extreme = page_offset(u32::MAX, u32::MAX);
        assert_eq!(extreme as u64, (u32::MAX as u64 - 1) * u32::MAX as u64);
    }
}
