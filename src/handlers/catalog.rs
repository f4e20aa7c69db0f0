use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::catalog::{Product, StockAlerts};
use crate::errors::AppError;
use crate::state::AppState;

use super::identity::CurrentUser;
use super::money;

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    /// List price before discount, e.g. "50.00"
    pub price: String,
    pub discount_percent: String,
    /// Price actually charged per unit
    pub unit_price: String,
    pub stock: i32,
    /// ISO date, e.g. "2025-06-30"
    pub expiry_date: Option<String>,
}

impl From<Product> for ProductResponse {
    fn from(p: Product) -> Self {
        ProductResponse {
            unit_price: money(&p.unit_price()),
            price: money(&p.price),
            discount_percent: p.discount_percent.to_string(),
            id: p.id,
            name: p.name,
            brand: p.brand,
            stock: p.stock,
            expiry_date: p.expiry_date.map(|d| d.to_string()),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LowStockParams {
    /// Stock level at or below which a product is reported. Defaults to 5.
    pub min: Option<i32>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ExpiringParams {
    /// Days ahead to look for expiring products. Defaults to 30.
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AlertsParams {
    /// Stock level at or below which a product is reported. Defaults to 5.
    pub min: Option<i32>,
    /// Days ahead to look for expiring products. Defaults to 30.
    pub days: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StockAlertsResponse {
    pub low_stock: Vec<ProductResponse>,
    /// Soonest expiry first; already expired products included
    pub expiring: Vec<ProductResponse>,
}

impl From<StockAlerts> for StockAlertsResponse {
    fn from(a: StockAlerts) -> Self {
        StockAlertsResponse {
            low_stock: a.low_stock.into_iter().map(ProductResponse::from).collect(),
            expiring: a.expiring.into_iter().map(ProductResponse::from).collect(),
        }
    }
}

/// GET /products
///
/// Lists every product that can currently be bought.
#[utoipa::path(
    get,
    path = "/products",
    responses(
        (status = 200, description = "Products in stock", body = [ProductResponse]),
        (status = 500, description = "Internal server error"),
    ),
    tag = "catalog"
)]
pub async fn list_products(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let products = web::block(move || state.catalog.available_products())
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "catalog"
)]
pub async fn get_product(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let product = web::block(move || state.catalog.find_product(product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}

/// GET /admin/alerts/low-stock
///
/// Products running out, lowest stock first. Cashiers and admins only.
#[utoipa::path(
    get,
    path = "/admin/alerts/low-stock",
    params(
        LowStockParams,
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Products at or below the threshold", body = [ProductResponse]),
        (status = 401, description = "Missing identity"),
        (status = 403, description = "Caller is not staff"),
    ),
    tag = "admin"
)]
pub async fn low_stock(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<LowStockParams>,
) -> Result<HttpResponse, AppError> {
    let threshold = query.into_inner().min;
    let products = web::block(move || state.catalog.low_stock(user.0, threshold))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    get,
    path = "/admin/alerts/expiring",
    params(
        ExpiringParams,
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Products expiring within the window", body = [ProductResponse]),
        (status = 400, description = "Window out of range"),
        (status = 403, description = "Caller is not staff"),
    ),
    tag = "admin"
)]
pub async fn expiring(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<ExpiringParams>,
) -> Result<HttpResponse, AppError> {
    let days = query.into_inner().days;
    let products = web::block(move || state.catalog.expiring_soon(user.0, days))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<ProductResponse> = products.into_iter().map(ProductResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /admin/alerts
///
/// Low stock and upcoming expiry on one page.
#[utoipa::path(
    get,
    path = "/admin/alerts",
    params(
        AlertsParams,
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Current stock alerts", body = StockAlertsResponse),
        (status = 400, description = "Threshold or window out of range"),
        (status = 403, description = "Caller is not staff"),
    ),
    tag = "admin"
)]
pub async fn alerts(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<AlertsParams>,
) -> Result<HttpResponse, AppError> {
    let AlertsParams { min, days } = query.into_inner();
    let alerts = web::block(move || state.catalog.alerts(user.0, min, days))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(StockAlertsResponse::from(alerts)))
}
