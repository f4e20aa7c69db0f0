use crate::application::cart_service::CartService;
use crate::application::catalog_service::CatalogService;
use crate::application::loyalty_service::LoyaltyService;
use crate::application::order_service::OrderService;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::infrastructure::catalog_repo::DieselCatalogRepository;
use crate::infrastructure::loyalty_repo::DieselLoyaltyRepository;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::proof_store::FsProofStore;
use crate::infrastructure::user_repo::DieselUserRepository;
use crate::session::SessionStore;

pub type Catalog = CatalogService<DieselCatalogRepository, DieselUserRepository>;
pub type Carts = CartService<DieselCatalogRepository, DieselUserRepository>;
pub type Orders = OrderService<DieselOrderRepository, DieselUserRepository, FsProofStore>;
pub type Loyalty = LoyaltyService<DieselLoyaltyRepository, DieselUserRepository>;

/// Everything the handlers share, wired to Postgres and the upload directory.
pub struct AppState {
    pub catalog: Catalog,
    pub carts: Carts,
    pub orders: Orders,
    pub loyalty: Loyalty,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(pool: DbPool, config: &AppConfig) -> Self {
        Self {
            catalog: CatalogService::new(
                DieselCatalogRepository::new(pool.clone()),
                DieselUserRepository::new(pool.clone()),
            ),
            carts: CartService::new(
                DieselCatalogRepository::new(pool.clone()),
                DieselUserRepository::new(pool.clone()),
            ),
            orders: OrderService::new(
                DieselOrderRepository::new(pool.clone()),
                DieselUserRepository::new(pool.clone()),
                FsProofStore::new(&config.upload_dir),
                config.merchant_momo_number.clone(),
            ),
            loyalty: LoyaltyService::new(
                DieselLoyaltyRepository::new(pool.clone()),
                DieselUserRepository::new(pool),
            ),
            sessions: SessionStore::new(config.session_idle_ttl),
        }
    }
}
