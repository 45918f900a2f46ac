//! 遥测库连接
//!
//! 数据库是可选的：只有 `database.enabled = true` 时 main 才会打开连接池，
//! 其余情况下管线使用进程内存储。

use crate::config::{DatabaseSettings, Settings};
use crate::errors::AppError;
use secrecy::{ExposeSecret, SecretString};
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// 遥测库连接池
#[derive(Clone)]
pub struct PostgresPool {
    pool: PgPool,
}

impl PostgresPool {
    /// 打开连接池，按配置执行迁移
    pub async fn open(settings: &Settings) -> Result<Self, AppError> {
        let url = Settings::database_url()
            .ok_or_else(|| AppError::ConfigError("已启用数据库但未设置 DATABASE_URL".to_string()))?;
        let db = &settings.database;

        let pool = PgPoolOptions::new()
            .max_connections(db.max_connections)
            .min_connections(db.min_connections)
            .acquire_timeout(Duration::from_secs(db.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(db.idle_timeout_seconds))
            .connect_with(connect_options(&url, db)?)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "遥测库连接失败");
                AppError::DatabaseError(e)
            })?;

        let pool = Self { pool };
        if db.run_migrations {
            pool.migrate().await?;
        }

        tracing::info!(max_connections = db.max_connections, "遥测库连接池已就绪");
        Ok(pool)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::DatabaseError)
    }

    async fn migrate(&self) -> Result<(), AppError> {
        MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| AppError::InternalError(format!("迁移失败: {}", e)))?;

        tracing::info!(migrations = MIGRATOR.iter().count(), "遥测库迁移完成");
        Ok(())
    }
}

/// 由 URL 与连接配置构造连接选项
fn connect_options(url: &SecretString, db: &DatabaseSettings) -> Result<PgConnectOptions, AppError> {
    let options = PgConnectOptions::from_str(url.expose_secret())
        .map_err(|e| AppError::ConfigError(format!("数据库 URL 无效: {}", e)))?
        .application_name("hydrowatch");

    Ok(if db.require_ssl {
        options.ssl_mode(PgSslMode::Require)
    } else {
        options
    })
}
