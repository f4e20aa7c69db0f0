use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service::SalesReport;
use crate::domain::loyalty::PointsAdjustment;
use crate::domain::order::{
    InStorePurchase, PendingPaymentView, ReviewDecision, ReviewOutcome, SalesSummary,
};
use crate::errors::AppError;
use crate::state::AppState;

use super::identity::CurrentUser;
use super::money;
use super::orders::PlacedOrderResponse;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct PendingPaymentResponse {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    /// Path of the stored proof, relative to the upload directory
    pub image_path: String,
    pub created_at: String,
}

impl From<PendingPaymentView> for PendingPaymentResponse {
    fn from(p: PendingPaymentView) -> Self {
        PendingPaymentResponse {
            id: p.id,
            order_id: p.order_id,
            user_id: p.user_id,
            username: p.username,
            image_path: p.image_path,
            created_at: p.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewAction {
    Approve,
    Reject,
}

impl From<ReviewAction> for ReviewDecision {
    fn from(a: ReviewAction) -> Self {
        match a {
            ReviewAction::Approve => ReviewDecision::Approve,
            ReviewAction::Reject => ReviewDecision::Reject,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReviewRequest {
    pub decision: ReviewAction,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewResponse {
    pub payment_id: Uuid,
    pub order_id: Uuid,
    pub payment_status: String,
    pub order_status: String,
    pub points_awarded: i32,
}

impl From<ReviewOutcome> for ReviewResponse {
    fn from(o: ReviewOutcome) -> Self {
        ReviewResponse {
            payment_id: o.payment_id,
            order_id: o.order_id,
            payment_status: o.payment_status.as_str().to_string(),
            order_status: o.order_status.to_string(),
            points_awarded: o.points_awarded,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct InStorePurchaseRequest {
    pub customer_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Optional new cost price for the product, e.g. "31.50"
    pub cost_price: Option<String>,
}

/// Exactly one of `set` or `add` must be given.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustPointsRequest {
    pub set: Option<i32>,
    pub add: Option<i32>,
}

impl AdjustPointsRequest {
    fn into_adjustment(self) -> Result<PointsAdjustment, AppError> {
        match (self.set, self.add) {
            (Some(value), None) => Ok(PointsAdjustment::Set(value)),
            (None, Some(delta)) => Ok(PointsAdjustment::Add(delta)),
            _ => Err(AppError::BadRequest(
                "provide exactly one of 'set' or 'add'".to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdjustPointsResponse {
    pub user_id: Uuid,
    pub points: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesSummaryResponse {
    pub orders: i64,
    pub revenue: String,
    /// Selling price minus cost price over the sold units
    pub profit: String,
}

impl From<SalesSummary> for SalesSummaryResponse {
    fn from(s: SalesSummary) -> Self {
        SalesSummaryResponse {
            orders: s.orders,
            revenue: money(&s.revenue),
            profit: money(&s.profit),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalesReportResponse {
    pub today: SalesSummaryResponse,
    pub month: SalesSummaryResponse,
}

impl From<SalesReport> for SalesReportResponse {
    fn from(r: SalesReport) -> Self {
        SalesReportResponse {
            today: r.today.into(),
            month: r.month.into(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /admin/payments/pending
///
/// Proofs waiting for review, newest first. Cashiers do not see their own.
#[utoipa::path(
    get,
    path = "/admin/payments/pending",
    params(("X-User-Id" = Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 200, description = "Pending payments", body = [PendingPaymentResponse]),
        (status = 403, description = "Caller is not staff"),
    ),
    tag = "admin"
)]
pub async fn pending_payments(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let payments = web::block(move || state.orders.pending_payments(user.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let body: Vec<PendingPaymentResponse> =
        payments.into_iter().map(PendingPaymentResponse::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /admin/payments/{id}/review
///
/// Approving completes the order and awards one loyalty point; rejecting
/// closes it. A payment can be reviewed once.
#[utoipa::path(
    post,
    path = "/admin/payments/{id}/review",
    request_body = ReviewRequest,
    params(
        ("id" = Uuid, Path, description = "Payment UUID"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "Payment reviewed", body = ReviewResponse),
        (status = 403, description = "Caller may not review this payment"),
        (status = 404, description = "Payment not found"),
        (status = 409, description = "Payment already reviewed"),
    ),
    tag = "admin"
)]
pub async fn review_payment(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<ReviewRequest>,
) -> Result<HttpResponse, AppError> {
    let payment_id = path.into_inner();
    let decision = ReviewDecision::from(body.into_inner().decision);

    let outcome = web::block(move || state.orders.review_payment(user.0, payment_id, decision))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ReviewResponse::from(outcome)))
}

/// POST /admin/purchases
///
/// Records a walk-in sale at list price and awards the customer one point.
#[utoipa::path(
    post,
    path = "/admin/purchases",
    request_body = InStorePurchaseRequest,
    params(("X-User-Id" = Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 201, description = "Purchase recorded", body = PlacedOrderResponse),
        (status = 400, description = "Invalid quantity or cost price"),
        (status = 403, description = "Caller is not staff"),
        (status = 409, description = "Not enough stock"),
    ),
    tag = "admin"
)]
pub async fn record_in_store_purchase(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<InStorePurchaseRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let cost_price = body
        .cost_price
        .as_deref()
        .map(|raw| {
            BigDecimal::from_str(raw.trim())
                .map_err(|e| AppError::BadRequest(format!("Invalid cost_price '{}': {}", raw, e)))
        })
        .transpose()?;
    let purchase = InStorePurchase {
        customer_id: body.customer_id,
        product_id: body.product_id,
        quantity: body.quantity,
        cost_price,
    };

    let placed = web::block(move || state.orders.record_in_store_purchase(user.0, purchase))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(PlacedOrderResponse::from(placed)))
}

#[utoipa::path(
    post,
    path = "/admin/users/{id}/loyalty",
    request_body = AdjustPointsRequest,
    params(
        ("id" = Uuid, Path, description = "Customer UUID"),
        ("X-User-Id" = Uuid, Header, description = "Authenticated user"),
    ),
    responses(
        (status = 200, description = "New balance", body = AdjustPointsResponse),
        (status = 400, description = "Balance would become negative"),
        (status = 403, description = "Caller is not staff"),
        (status = 404, description = "User not found"),
    ),
    tag = "admin"
)]
pub async fn adjust_points(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<AdjustPointsRequest>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let adjustment = body.into_inner().into_adjustment()?;

    let points = web::block(move || state.loyalty.adjust_points(user.0, customer_id, adjustment))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(AdjustPointsResponse {
        user_id: customer_id,
        points,
    }))
}

/// GET /admin/reports/sales
///
/// Completed orders and revenue for today and for the month so far (UTC).
#[utoipa::path(
    get,
    path = "/admin/reports/sales",
    params(("X-User-Id" = Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 200, description = "Sales summary", body = SalesReportResponse),
        (status = 403, description = "Caller is not an admin"),
    ),
    tag = "admin"
)]
pub async fn sales_report(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let report = web::block(move || state.orders.sales_report(user.0, Utc::now()))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(SalesReportResponse::from(report)))
}
