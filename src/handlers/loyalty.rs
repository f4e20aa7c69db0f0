use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::loyalty_service::LoyaltyBalance;
use crate::domain::loyalty::Redemption;
use crate::errors::AppError;
use crate::state::AppState;

use super::identity::CurrentUser;

#[derive(Debug, Serialize, ToSchema)]
pub struct LoyaltyEntryResponse {
    pub order_id: Option<Uuid>,
    pub delta: i32,
    pub balance_after: i32,
    pub reason: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoyaltyResponse {
    pub points: i32,
    /// True once the balance is above 5
    pub can_redeem: bool,
    pub history: Vec<LoyaltyEntryResponse>,
}

impl From<LoyaltyBalance> for LoyaltyResponse {
    fn from(b: LoyaltyBalance) -> Self {
        LoyaltyResponse {
            points: b.points,
            can_redeem: b.can_redeem,
            history: b
                .history
                .into_iter()
                .map(|e| LoyaltyEntryResponse {
                    order_id: e.order_id,
                    delta: e.delta,
                    balance_after: e.balance_after,
                    reason: e.reason,
                    created_at: e.created_at.to_rfc3339(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RedeemRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RedemptionResponse {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub points: i32,
}

impl From<Redemption> for RedemptionResponse {
    fn from(r: Redemption) -> Self {
        RedemptionResponse {
            order_id: r.order_id,
            product_id: r.product_id,
            product_name: r.product_name,
            points: r.new_balance,
        }
    }
}

#[utoipa::path(
    get,
    path = "/loyalty",
    params(("X-User-Id" = Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 200, description = "Balance and recent ledger entries", body = LoyaltyResponse),
        (status = 404, description = "Unknown user"),
    ),
    tag = "loyalty"
)]
pub async fn balance(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, AppError> {
    let balance = web::block(move || state.loyalty.balance(user.0))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(LoyaltyResponse::from(balance)))
}

/// POST /loyalty/redeem
///
/// Spends 6 points on one unit of a product. Needs a balance above 5.
#[utoipa::path(
    post,
    path = "/loyalty/redeem",
    request_body = RedeemRequest,
    params(("X-User-Id" = Uuid, Header, description = "Authenticated user")),
    responses(
        (status = 201, description = "Free item ordered", body = RedemptionResponse),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Not enough points or stock"),
    ),
    tag = "loyalty"
)]
pub async fn redeem(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<RedeemRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = body.into_inner().product_id;
    let redemption = web::block(move || state.loyalty.redeem_free_item(user.0, product_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(RedemptionResponse::from(redemption)))
}
