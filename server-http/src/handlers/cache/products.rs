use crate::api::{ErrorResponse, ProductsResponse};
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use graphite::catalog::PRODUCTS_ALL_KEY;
use graphite::domain::Product;
use tracing::{error, info};

/// GET /api/products
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<ProductsResponse<Vec<Product>>>, (StatusCode, Json<ErrorResponse>)> {
    match state.products.fetch(PRODUCTS_ALL_KEY).await {
        Ok(result) => {
            info!(
                "GET products: {} item(s) from {:?}",
                result.value.len(),
                result.provenance
            );
            Ok(Json(ProductsResponse::from(result)))
        }
        Err(e) => {
            error!("Failed to fetch products: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error")),
            ))
        }
    }
}
