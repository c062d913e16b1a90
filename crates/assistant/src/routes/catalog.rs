//! Catalog, tools and order routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use vendai_core::Product;

use crate::catalog::PricedOrder;
use crate::error::AppError;
use crate::middleware::conversation_id;
use crate::state::AppState;
use crate::tools::ToolDescriptor;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tools", get(list_tools))
        .route("/api/catalog", get(list_products))
        .route("/api/orders", post(create_order))
}

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
pub struct OrderRequest {
    pub products: Vec<String>,
}

/// GET /api/tools
async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolDescriptor>> {
    Json(state.registry().list_tools().to_vec())
}

/// GET /api/catalog
async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Json<CatalogResponse> {
    let catalog = state.catalog();
    let products = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => catalog.search(q).into_iter().cloned().collect(),
        _ => catalog.products().to_vec(),
    };
    Json(CatalogResponse { products })
}

/// POST /api/orders
async fn create_order(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<OrderRequest>,
) -> Result<Json<PricedOrder>, AppError> {
    let id = conversation_id(&session).await?;
    let conversation = state.conversation(id).await;
    let user_name = conversation
        .lock()
        .await
        .user_name()
        .map(ToString::to_string)
        .ok_or(AppError::NotRegistered)?;

    let catalog = state.catalog();
    let order = catalog.price_order(catalog.build_order(&user_name, &request.products));
    Ok(Json(order))
}
