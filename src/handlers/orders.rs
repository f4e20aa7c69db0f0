use actix_web::http::header::CONTENT_TYPE;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{OrderView, PlacedOrder, SubmittedProof};
use crate::domain::payment::MAX_PROOF_BYTES;
use crate::errors::AppError;
use crate::state::AppState;

use super::identity::CurrentUser;
use super::money;

// ── Response DTOs ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct PlacedOrderResponse {
    pub id: Uuid,
    pub status: String,
    pub subtotal: String,
    pub tax: String,
    pub grand_total: String,
    /// Mobile-money number the customer should pay to
    pub momo_number: Option<String>,
}

impl From<PlacedOrder> for PlacedOrderResponse {
    fn from(o: PlacedOrder) -> Self {
        PlacedOrderResponse {
            id: o.id,
            status: o.status.to_string(),
            subtotal: money(&o.totals.subtotal),
            tax: money(&o.totals.tax),
            grand_total: money(&o.totals.grand_total),
            momo_number: o.momo_number,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub unit_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub status: String,
    pub payment_method: String,
    pub subtotal: String,
    pub tax: String,
    pub grand_total: String,
    pub momo_number: Option<String>,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        OrderResponse {
            id: o.id,
            status: o.status.to_string(),
            payment_method: o.payment_method,
            subtotal: money(&o.totals.subtotal),
            tax: money(&o.totals.tax),
            grand_total: money(&o.totals.grand_total),
            momo_number: o.momo_number,
            created_at: o.created_at.to_rfc3339(),
            items: o
                .items
                .into_iter()
                .map(|i| OrderItemResponse {
                    id: i.id,
                    product_id: i.product_id,
                    product_name: i.product_name,
                    quantity: i.quantity,
                    unit_price: money(&i.unit_price),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentProofResponse {
    pub payment_id: Uuid,
    pub order_id: Uuid,
    pub order_status: String,
}

impl From<SubmittedProof> for PaymentProofResponse {
    fn from(p: SubmittedProof) -> Self {
        PaymentProofResponse {
            payment_id: p.payment_id,
            order_id: p.order_id,
            order_status: p.order_status.to_string(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /checkout
///
/// Turns the caller's cart into an order awaiting a mobile-money payment
/// proof. Stock is reserved in the same transaction; the cart is emptied
/// only when the order was created.
#[utoipa::path(
    post,
    path = "/checkout",
    params(("X-User-Id" = Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 201, description = "Order placed", body = PlacedOrderResponse),
        (status = 400, description = "Cart is empty"),
        (status = 409, description = "Not enough stock"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn checkout(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let context = state
        .sessions
        .existing(user.0)
        .await
        .ok_or(DomainError::EmptyCart)?;
    // Held until the order is placed so the cart cannot change underneath it.
    let mut session = context.lock_owned().await;

    let placed = web::block(move || {
        let placed = state.orders.checkout(user.0, &mut session.cart)?;
        session.last_order_id = Some(placed.id);
        Ok::<_, DomainError>(placed)
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(PlacedOrderResponse::from(placed)))
}

/// GET /orders
///
/// The caller's orders, newest first, without their items.
#[utoipa::path(
    get,
    path = "/orders",
    params(("X-User-Id" = Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 200, description = "Orders of the caller", body = [OrderResponse]),
        (status = 401, description = "Missing identity"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let orders = web::block(move || state.orders.list_orders(user.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<OrderResponse> = orders.into_iter().map(OrderResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /orders/{id}
///
/// Receipt view: the order with its items. Other users' orders are reported
/// as not found.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let order = web::block(move || state.orders.get_order(user.0, order_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// POST /orders/{id}/payment-proof
///
/// The raw image is the request body; its `Content-Type` must be
/// `image/jpeg`, `image/png` or `image/webp`.
#[utoipa::path(
    post,
    path = "/orders/{id}/payment-proof",
    request_body(content = Vec<u8>, content_type = "image/jpeg", description = "Screenshot of the transfer"),
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 201, description = "Proof recorded", body = PaymentProofResponse),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order no longer accepts proofs"),
        (status = 413, description = "Image too large"),
        (status = 415, description = "Not a JPEG, PNG or WebP image"),
    ),
    tag = "orders"
)]
pub async fn upload_payment_proof(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    req: HttpRequest,
    body: web::Payload,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let body = body
        .to_bytes_limited(MAX_PROOF_BYTES)
        .await
        .map_err(|_| DomainError::ProofTooLarge {
            max: MAX_PROOF_BYTES,
        })?
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let submitted = web::block(move || {
        state
            .orders
            .submit_payment_proof(user.0, order_id, &content_type, body.to_vec())
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(PaymentProofResponse::from(submitted)))
}
