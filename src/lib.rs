pub mod application;
pub mod config;
pub mod db;
pub mod docs;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;
pub mod session;
pub mod state;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::AppConfig;
pub use db::{create_pool, DbPool};
pub use state::AppState;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

pub type MigrationError = Box<dyn std::error::Error + Send + Sync>;

/// Applies pending migrations and logs each version that ran.
pub fn run_migrations(pool: &DbPool) -> Result<(), MigrationError> {
    let mut conn = pool.get()?;
    for version in conn.run_pending_migrations(MIGRATIONS)? {
        log::info!("Applied migration {}", version);
    }
    Ok(())
}

/// Registers every route together with extractor configs that report
/// failures as JSON errors.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(errors::json_error))
        .app_data(web::PathConfig::default().error_handler(errors::path_error))
        .app_data(web::QueryConfig::default().error_handler(errors::query_error))
        .service(
            web::scope("/products")
                .route("", web::get().to(handlers::catalog::list_products))
                .route("/{id}", web::get().to(handlers::catalog::get_product)),
        )
        .service(
            web::scope("/cart")
                .route("", web::get().to(handlers::cart::view_cart))
                .route("/items", web::post().to(handlers::cart::add_item))
                .route("/items/{product_id}", web::put().to(handlers::cart::update_quantity))
                .route("/items/{product_id}", web::delete().to(handlers::cart::remove_item)),
        )
        .route("/checkout", web::post().to(handlers::orders::checkout))
        .service(
            web::scope("/orders")
                .route("", web::get().to(handlers::orders::list_orders))
                .route("/{id}", web::get().to(handlers::orders::get_order))
                .route(
                    "/{id}/payment-proof",
                    web::post().to(handlers::orders::upload_payment_proof),
                ),
        )
        .service(
            web::scope("/loyalty")
                .route("", web::get().to(handlers::loyalty::balance))
                .route("/redeem", web::post().to(handlers::loyalty::redeem)),
        )
        .service(
            web::scope("/admin")
                .route("/payments/pending", web::get().to(handlers::admin::pending_payments))
                .route("/payments/{id}/review", web::post().to(handlers::admin::review_payment))
                .route("/purchases", web::post().to(handlers::admin::record_in_store_purchase))
                .route("/users/{id}/loyalty", web::post().to(handlers::admin::adjust_points))
                .route("/alerts", web::get().to(handlers::catalog::alerts))
                .route("/alerts/low-stock", web::get().to(handlers::catalog::low_stock))
                .route("/alerts/expiring", web::get().to(handlers::catalog::expiring))
                .route("/reports/sales", web::get().to(handlers::admin::sales_report)),
        );
}

/// Build and return an actix-web `Server` bound to `config.host:config.port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server. Must be called from within a tokio runtime: idle carts
/// are swept by a background task.
pub fn build_server(pool: DbPool, config: &AppConfig) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(AppState::new(pool, config));

    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweeper.sessions.idle_ttl());
        loop {
            interval.tick().await;
            sweeper.sessions.evict_idle().await;
        }
    });

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/docs/{_:.*}")
                    .url("/api-docs/openapi.json", docs::ApiDoc::openapi()),
            )
            .configure(configure)
    })
    .bind((config.host.clone(), config.port))?
    .run())
}
