/**
 * Server Collaborators
 *
 * Builds the document store and the mailer from `AppConfig`.
 *
 * # Error Handling
 *
 * A missing `DATABASE_URL` or an unreachable database is not fatal: the
 * server logs a warning and runs on the in-memory store. Missing SMTP
 * settings fall back to a mailer that only logs.
 */

use std::sync::Arc;

use sqlx::PgPool;

use crate::backend::error::BackendResult;
use crate::backend::mail::{LogMailer, Mailer, SmtpMailer};
use crate::backend::store::{DocumentStore, MemoryStore, PgStore};
use crate::shared::AppConfig;

/// Connect to PostgreSQL and run migrations, or fall back to memory
pub async fn load_store(config: &AppConfig) -> Arc<dyn DocumentStore> {
    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set. Using the in-memory store; nothing will survive a restart.");
        return Arc::new(MemoryStore::new());
    };

    tracing::info!("Connecting to database...");
    let pool = match PgPool::connect(database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to create database connection pool: {:?}", e);
            tracing::warn!("Falling back to the in-memory store");
            return Arc::new(MemoryStore::new());
        }
    };

    tracing::info!("Running database migrations...");
    match sqlx::migrate!().run(&pool).await {
        Ok(_) => tracing::info!("Database migrations completed successfully"),
        Err(e) => {
            tracing::error!("Failed to run database migrations: {}", e);
            tracing::warn!("Continuing - the schema might already be up to date");
        }
    }

    Arc::new(PgStore::new(pool))
}

pub fn load_mailer(config: &AppConfig) -> BackendResult<Arc<dyn Mailer>> {
    match &config.smtp {
        Some(smtp) => {
            tracing::info!("Sending invitation email through {}", smtp.host);
            Ok(Arc::new(SmtpMailer::new(smtp)?))
        }
        None => {
            tracing::warn!("SMTP_HOST not set. Invitation emails will only be logged.");
            Ok(Arc::new(LogMailer))
        }
    }
}
