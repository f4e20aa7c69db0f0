use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::catalog::list_products,
        crate::handlers::catalog::get_product,
        crate::handlers::catalog::low_stock,
        crate::handlers::catalog::expiring,
        crate::handlers::catalog::alerts,
        crate::handlers::cart::view_cart,
        crate::handlers::cart::add_item,
        crate::handlers::cart::update_quantity,
        crate::handlers::cart::remove_item,
        crate::handlers::orders::checkout,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::upload_payment_proof,
        crate::handlers::loyalty::balance,
        crate::handlers::loyalty::redeem,
        crate::handlers::admin::pending_payments,
        crate::handlers::admin::review_payment,
        crate::handlers::admin::record_in_store_purchase,
        crate::handlers::admin::adjust_points,
        crate::handlers::admin::sales_report
    ),
    components(
        schemas(
            crate::handlers::catalog::ProductResponse,
            crate::handlers::catalog::StockAlertsResponse,
            crate::handlers::cart::AddItemRequest,
            crate::handlers::cart::UpdateQuantityRequest,
            crate::handlers::cart::CartLineResponse,
            crate::handlers::cart::CartResponse,
            crate::handlers::orders::PlacedOrderResponse,
            crate::handlers::orders::OrderItemResponse,
            crate::handlers::orders::OrderResponse,
            crate::handlers::orders::PaymentProofResponse,
            crate::handlers::loyalty::LoyaltyEntryResponse,
            crate::handlers::loyalty::LoyaltyResponse,
            crate::handlers::loyalty::RedeemRequest,
            crate::handlers::loyalty::RedemptionResponse,
            crate::handlers::admin::PendingPaymentResponse,
            crate::handlers::admin::ReviewAction,
            crate::handlers::admin::ReviewRequest,
            crate::handlers::admin::ReviewResponse,
            crate::handlers::admin::InStorePurchaseRequest,
            crate::handlers::admin::AdjustPointsRequest,
            crate::handlers::admin::AdjustPointsResponse,
            crate::handlers::admin::SalesSummaryResponse,
            crate::handlers::admin::SalesReportResponse
        )
    ),
    tags(
        (name = "catalog", description = "Perfumes on sale"),
        (name = "cart", description = "Per-user shopping cart"),
        (name = "orders", description = "Checkout, receipts and payment proofs"),
        (name = "loyalty", description = "Loyalty points and free items"),
        (name = "admin", description = "Cashier and admin back office")
    )
)]
pub struct ApiDoc;
