use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::auth::{
    jwt::JwtKeys,
    repo::{PgUserRepo, UserRepo},
    services::SessionService,
};
use crate::config::AppConfig;
use crate::expenses::{
    repo::{ExpenseRepo, PgExpenseRepo},
    services::ExpenseService,
};
use crate::memory::{MemoryExpenseRepo, MemoryUserRepo};

#[derive(Clone)]
pub struct AppState {
    pub keys: JwtKeys,
    pub sessions: SessionService,
    pub expenses: ExpenseService,
}

impl AppState {
    /// Connects to Postgres and applies pending migrations.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.db.max_connections)
            .acquire_timeout(config.db.acquire_timeout())
            .connect(&config.db.url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .context("run database migrations")?;
        tracing::info!("database connected and migrated");

        Ok(Self::with_pool(config, db))
    }

    pub fn with_pool(config: AppConfig, db: PgPool) -> Self {
        Self::from_parts(
            config,
            Arc::new(PgUserRepo::new(db.clone())),
            Arc::new(PgExpenseRepo::new(db)),
        )
    }

    pub fn from_parts(
        config: AppConfig,
        users: Arc<dyn UserRepo>,
        expenses: Arc<dyn ExpenseRepo>,
    ) -> Self {
        let keys = JwtKeys::from_config(&config.jwt);
        Self {
            sessions: SessionService::new(users, keys.clone()),
            expenses: ExpenseService::new(expenses),
            keys,
        }
    }

    /// Same routes and rules, backed by process memory instead of Postgres.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::from_parts(
            config,
            Arc::new(MemoryUserRepo::default()),
            Arc::new(MemoryExpenseRepo::default()),
        )
    }
}
