use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::cart::CartChange;
use crate::domain::errors::DomainError;
use crate::domain::pricing::OrderTotals;
use crate::errors::AppError;
use crate::session::{SessionContext, SharedContext};
use crate::state::AppState;

use super::identity::CurrentUser;
use super::money;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    /// Defaults to 1
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    /// Zero or less removes the line
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineResponse {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: String,
    pub quantity: i32,
    pub line_total: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartResponse {
    pub lines: Vec<CartLineResponse>,
    pub subtotal: String,
    pub tax: String,
    pub grand_total: String,
    /// Most recent order placed from this session
    pub last_order_id: Option<Uuid>,
}

impl From<&SessionContext> for CartResponse {
    fn from(session: &SessionContext) -> Self {
        let OrderTotals {
            subtotal,
            tax,
            grand_total,
        } = session.cart.totals();
        CartResponse {
            lines: session
                .cart
                .lines()
                .iter()
                .map(|l| CartLineResponse {
                    product_id: l.product_id,
                    name: l.name.clone(),
                    unit_price: money(&l.unit_price),
                    quantity: l.quantity,
                    line_total: money(&(&l.unit_price * BigDecimal::from(l.quantity))),
                })
                .collect(),
            subtotal: money(&subtotal),
            tax: money(&tax),
            grand_total: money(&grand_total),
            last_order_id: session.last_order_id,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// Live context of `user_id`, created only once the user is known.
pub(crate) async fn session_for(
    state: &web::Data<AppState>,
    user_id: Uuid,
) -> Result<SharedContext, AppError> {
    if let Some(context) = state.sessions.existing(user_id).await {
        return Ok(context);
    }
    let lookup = state.clone();
    web::block(move || lookup.carts.require_user(user_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    Ok(state.sessions.context(user_id).await)
}

#[utoipa::path(
    get,
    path = "/cart",
    params(("X-User-Id" = Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 200, description = "Current cart with totals", body = CartResponse),
        (status = 401, description = "Missing identity"),
    ),
    tag = "cart"
)]
pub async fn view_cart(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let cart = match state.sessions.existing(user.0).await {
        Some(context) => CartResponse::from(&*context.lock().await),
        None => CartResponse::from(&SessionContext::default()),
    };
    Ok(HttpResponse::Ok().json(cart))
}

/// POST /cart/items
///
/// Adds units of a product, merging with an existing line. The total
/// quantity may not exceed the product's stock.
#[utoipa::path(
    post,
    path = "/cart/items",
    request_body = AddItemRequest,
    params(("X-User-Id" = Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 400, description = "Quantity is not positive"),
        (status = 404, description = "Product or user not found"),
        (status = 409, description = "Not enough stock"),
    ),
    tag = "cart"
)]
pub async fn add_item(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let mut session = session_for(&state, user.0).await?.lock_owned().await;

    let cart = web::block(move || {
        state
            .carts
            .add_item(&mut session.cart, body.product_id, body.quantity)?;
        Ok::<_, DomainError>(CartResponse::from(&*session))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(cart))
}

/// PUT /cart/items/{product_id}
///
/// Re-checks stock. A product that sold out meanwhile is dropped from the
/// cart and reported as a conflict.
#[utoipa::path(
    put,
    path = "/cart/items/{product_id}",
    request_body = UpdateQuantityRequest,
    params(
        ("product_id" = Uuid, Path, description = "Product UUID"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 404, description = "Product is not in the cart"),
        (status = 409, description = "Not enough stock"),
    ),
    tag = "cart"
)]
pub async fn update_quantity(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateQuantityRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let quantity = body.into_inner().quantity;
    let context = state
        .sessions
        .existing(user.0)
        .await
        .ok_or(DomainError::NotFound("Cart line"))?;
    let mut session = context.lock_owned().await;

    let cart = web::block(move || {
        let change = state
            .carts
            .update_quantity(&mut session.cart, product_id, quantity)?;
        if change == CartChange::Removed {
            log::debug!("Removed {} from cart of {}", product_id, user.0);
        }
        Ok::<_, DomainError>(CartResponse::from(&*session))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(cart))
}

#[utoipa::path(
    delete,
    path = "/cart/items/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product UUID"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 404, description = "Product is not in the cart"),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let context = state
        .sessions
        .existing(user.0)
        .await
        .ok_or(DomainError::NotFound("Cart line"))?;
    let mut session = context.lock().await;
    state.carts.remove_item(&mut session.cart, product_id)?;
    Ok(HttpResponse::Ok().json(CartResponse::from(&*session)))
}
