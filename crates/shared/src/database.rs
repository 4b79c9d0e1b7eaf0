//! 数据库连接管理模块
//!
//! 批处理任务启动时建立连接池：首次连接按退避策略重试，
//! 按配置执行 migrations/ 下的建表脚本，随后做一次连通性检查。

use crate::config::DatabaseConfig;
use crate::error::{Result, SharedError};
use crate::retry::{RetryPolicy, retry_with_policy};
use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

/// 积分引擎的建表脚本，编译期嵌入
static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

/// 数据库连接池包装
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 创建数据库连接池
    #[instrument(skip(config), fields(max_connections = config.max_connections))]
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await?;

        info!("数据库连接池已创建");
        Ok(Self { pool })
    }

    /// 带退避重试的连接，成功后按配置执行迁移
    ///
    /// 只有连接超时、网络错误这类瞬时故障会重试
    pub async fn connect_with_retry(config: &DatabaseConfig, policy: &RetryPolicy) -> Result<Self> {
        let db = retry_with_policy(
            policy,
            "database_connect",
            SharedError::is_retryable,
            || Self::connect(config),
        )
        .await?;

        if config.run_migrations {
            db.migrate().await?;
        }
        Ok(db)
    }

    /// 执行尚未应用的迁移
    #[instrument(skip(self))]
    pub async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await?;
        info!(migrations = MIGRATOR.iter().count(), "数据库迁移完成");
        Ok(())
    }

    /// 获取连接池引用
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 连通性检查
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// 关闭连接池
    pub async fn close(&self) {
        self.pool.close().await;
        info!("数据库连接池已关闭");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_embedded() {
        assert!(MIGRATOR.iter().any(|m| m.version == 1));
    }

    #[tokio::test]
    #[ignore] // 需要数据库连接
    async fn test_connect_migrate_and_check() {
        let config = crate::test_utils::test_database_config();
        let db = Database::connect_with_retry(&config, &RetryPolicy::default())
            .await
            .unwrap();
        // 重复执行是空操作
        db.migrate().await.unwrap();
        db.health_check().await.unwrap();
        db.close().await;
    }
}
