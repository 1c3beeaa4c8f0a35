pub mod api;
pub mod cli;
pub mod cart;
pub mod config;
pub mod db;
pub mod engine;
pub mod payment;

pub use db::DbPool;

use config::Config;
use std::sync::Arc;

use crate::api::rate_limit::RateLimiter;
use crate::payment::PaymentClient;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub payments: PaymentClient,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, db: DbPool, payments: PaymentClient) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));
        Self {
            config,
            db,
            payments,
            rate_limiter,
        }
    }
}
