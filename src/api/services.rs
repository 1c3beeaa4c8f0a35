use axum::{extract::State, Json};
use std::sync::Arc;

use super::error::ApiError;
use super::extract::ApiQuery;
use super::validation::non_blank;
use crate::db::{Service, ServiceQuery};
use crate::AppState;

/// List the service catalog, optionally narrowed to one category
///
/// GET /api/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<ServiceQuery>,
) -> Result<Json<Vec<Service>>, ApiError> {
    let services = match non_blank(&query.category) {
        Some(category) => {
            sqlx::query_as::<_, Service>(
                "SELECT * FROM services WHERE category = ? ORDER BY category, name",
            )
            .bind(category.to_lowercase())
            .fetch_all(&state.db)
            .await?
        }
        None => {
            sqlx::query_as::<_, Service>("SELECT * FROM services ORDER BY category, name")
                .fetch_all(&state.db)
                .await?
        }
    };

    Ok(Json(services))
}
