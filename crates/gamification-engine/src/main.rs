//! 成就批处理任务
//!
//! 对所有在职员工执行一次成就解锁判定。用法：
//!
//! ```text
//! gamification-batch [season_id]
//! ```
//!
//! 不指定赛季时使用当前时间所在的赛季。存在处理失败的员工时以非零状态退出。

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};

use gamification::{BatchUnlockResult, EngineSettings, GamificationEngine, PgRecordStore, RecordSource};
use gamification_shared::{config::AppConfig, database::Database, observability, retry::RetryPolicy};

const SERVICE_NAME: &str = "gamification-batch";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // 1. 加载配置（配置文件均为可选，非法取值直接退出）
    let config = AppConfig::load(SERVICE_NAME).context("加载配置失败")?;

    let obs_config = config.observability.clone().with_service_name(&config.service_name);
    let _guard = observability::init(&obs_config).await?;

    info!(environment = %config.environment, "配置加载完成");

    let season_arg: Option<i64> = std::env::args()
        .nth(1)
        .map(|arg| arg.parse().with_context(|| format!("无效的赛季 ID: {}", arg)))
        .transpose()?;

    // 2. 连接数据库
    let db = Database::connect_with_retry(&config.database, &RetryPolicy::default()).await?;
    db.health_check().await?;
    info!(run_migrations = config.database.run_migrations, "数据库连接已建立");

    // 3. 组装引擎
    let store = Arc::new(PgRecordStore::new(db.pool().clone()));
    let settings = EngineSettings::from_config(&config.scoring, &config.batch)?;
    let engine = GamificationEngine::new(store.clone(), store.clone(), settings);

    engine.validate_seasons().await?;
    let season = engine.resolve_season(season_arg).await?;
    info!(season_id = season.id, season = %season.name, "开始批量成就处理");

    // 4. 分块处理在职员工
    let started = Instant::now();
    let attendant_ids: Vec<i64> = store
        .list_active_attendants()
        .await?
        .into_iter()
        .map(|a| a.id)
        .collect();

    let mut summary = BatchUnlockResult::new(season.id);
    for (idx, chunk) in attendant_ids.chunks(config.batch.chunk_size).enumerate() {
        let result = engine.process_batch_for_season(chunk, &season).await;
        info!(
            chunk = idx + 1,
            attendants = chunk.len(),
            unlocked = result.total_unlocked,
            failed = result.failed.len(),
            "分块处理完成"
        );
        summary.merge(result);
    }

    info!(
        season_id = season.id,
        attendants = attendant_ids.len(),
        total_unlocked = summary.total_unlocked,
        total_xp_awarded = summary.total_xp_awarded,
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "批量成就处理结束"
    );

    db.close().await;

    if summary.is_partial_failure() {
        for failure in &summary.failed {
            for error in &failure.errors {
                warn!(
                    attendant_id = failure.attendant_id,
                    achievement_id = error.achievement_id,
                    code = %error.code,
                    message = %error.message,
                    "员工处理失败"
                );
            }
        }
        anyhow::bail!("{} 名员工处理失败", summary.failed.len());
    }

    Ok(())
}
