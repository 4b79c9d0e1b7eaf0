//! PostgreSQL 存储
//!
//! 解锁写入在单个事务中完成：先以 ON CONFLICT DO NOTHING 插入解锁记录，
//! 插入成功才追加奖励流水。唯一约束由
//! achievement_unlocks(attendant_id, achievement_id, season_id) 提供。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{debug, warn};

use super::traits::{RecordSink, RecordSource};
use crate::error::{EngineError, Result};
use crate::models::{
    AchievementConfig, AchievementRow, Attendant, Evaluation, Season, UnlockRecord,
    XpLedgerEntry,
};

const LEDGER_COLUMNS: &str = "id, attendant_id, base_points, multiplier, final_points, reason, \
     source_type, related_id, occurred_at, season_id";

const SEASON_COLUMNS: &str = "id, name, start_date, end_date, xp_multiplier, active";

/// 把成就行转换为配置
///
/// 无法解析的行（未知规则类型、参数格式错误）单独跳过，不影响其他成就
fn configs_from_rows(rows: Vec<AchievementRow>) -> Vec<AchievementConfig> {
    rows.into_iter()
        .filter_map(|row| {
            let achievement_id = row.id;
            let rule_kind = row.rule_kind.clone();
            match AchievementConfig::try_from(row) {
                Ok(config) => Some(config),
                Err(e) => {
                    warn!(achievement_id, rule_kind = %rule_kind, error = %e, "成就规则无法解析，跳过");
                    None
                }
            }
        })
        .collect()
}

/// PostgreSQL 记录存储
#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordSource for PgRecordStore {
    // ==================== 评价与流水 ====================

    async fn list_evaluations(
        &self,
        attendant_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Evaluation>> {
        let evaluations = sqlx::query_as::<_, Evaluation>(
            r#"
            SELECT id, attendant_id, rating, comment, occurred_at, base_points, final_points
            FROM evaluations
            WHERE attendant_id = $1 AND occurred_at >= $2 AND occurred_at < $3
            ORDER BY occurred_at ASC, id ASC
            "#,
        )
        .bind(attendant_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(evaluations)
    }

    async fn list_ledger_entries(
        &self,
        attendant_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<XpLedgerEntry>> {
        let sql = format!(
            "SELECT {LEDGER_COLUMNS} FROM xp_ledger \
             WHERE attendant_id = $1 AND occurred_at >= $2 AND occurred_at < $3 \
             ORDER BY occurred_at ASC, id ASC"
        );
        let entries = sqlx::query_as::<_, XpLedgerEntry>(&sql)
            .bind(attendant_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    // ==================== 赛季 ====================

    async fn list_seasons_at(&self, at: DateTime<Utc>) -> Result<Vec<Season>> {
        let sql = format!(
            "SELECT {SEASON_COLUMNS} FROM seasons \
             WHERE active = TRUE AND start_date <= $1 AND end_date >= $1 \
             ORDER BY id"
        );
        let seasons = sqlx::query_as::<_, Season>(&sql)
            .bind(at.date_naive())
            .fetch_all(&self.pool)
            .await?;

        Ok(seasons)
    }

    async fn get_season(&self, id: i64) -> Result<Option<Season>> {
        let sql = format!("SELECT {SEASON_COLUMNS} FROM seasons WHERE id = $1");
        let season = sqlx::query_as::<_, Season>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(season)
    }

    async fn list_active_seasons(&self) -> Result<Vec<Season>> {
        let sql = format!(
            "SELECT {SEASON_COLUMNS} FROM seasons WHERE active = TRUE ORDER BY start_date, id"
        );
        let seasons = sqlx::query_as::<_, Season>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(seasons)
    }

    // ==================== 成就 ====================

    async fn list_active_achievements(&self) -> Result<Vec<AchievementConfig>> {
        let rows = sqlx::query_as::<_, AchievementRow>(
            r#"
            SELECT id, title, xp_reward, active, rule_kind, rule_params
            FROM achievements
            WHERE active = TRUE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(configs_from_rows(rows))
    }

    async fn list_unlocks(&self, attendant_id: i64, season_id: i64) -> Result<Vec<UnlockRecord>> {
        let unlocks = sqlx::query_as::<_, UnlockRecord>(
            r#"
            SELECT id, attendant_id, achievement_id, season_id, unlocked_at, xp_gained
            FROM achievement_unlocks
            WHERE attendant_id = $1 AND season_id = $2
            ORDER BY id
            "#,
        )
        .bind(attendant_id)
        .bind(season_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(unlocks)
    }

    // ==================== 员工 ====================

    async fn list_active_attendants(&self) -> Result<Vec<Attendant>> {
        let attendants = sqlx::query_as::<_, Attendant>(
            r#"
            SELECT id, name, status
            FROM attendants
            WHERE status = 'active'
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(attendants)
    }
}

#[async_trait]
impl RecordSink for PgRecordStore {
    async fn append_ledger_entry(&self, entry: &XpLedgerEntry) -> Result<XpLedgerEntry> {
        let row = sqlx::query(
            r#"
            INSERT INTO xp_ledger (attendant_id, base_points, multiplier, final_points, reason,
                                   source_type, related_id, occurred_at, season_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(entry.attendant_id)
        .bind(entry.base_points)
        .bind(entry.multiplier)
        .bind(entry.final_points)
        .bind(&entry.reason)
        .bind(entry.source_type)
        .bind(entry.related_id)
        .bind(entry.occurred_at)
        .bind(entry.season_id)
        .fetch_one(&self.pool)
        .await?;

        let mut stored = entry.clone();
        stored.id = row.get("id");
        Ok(stored)
    }

    async fn insert_unlock(
        &self,
        unlock: &UnlockRecord,
        entry: &XpLedgerEntry,
    ) -> Result<(UnlockRecord, XpLedgerEntry)> {
        let mut tx = self.pool.begin().await?;

        let inserted: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO achievement_unlocks (attendant_id, achievement_id, season_id, unlocked_at, xp_gained)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (attendant_id, achievement_id, season_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(unlock.attendant_id)
        .bind(unlock.achievement_id)
        .bind(unlock.season_id)
        .bind(unlock.unlocked_at)
        .bind(unlock.xp_gained)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(unlock_id) = inserted else {
            // 事务随 tx drop 回滚，不产生任何写入
            debug!(
                attendant_id = unlock.attendant_id,
                achievement_id = unlock.achievement_id,
                season_id = unlock.season_id,
                "解锁记录已存在"
            );
            return Err(EngineError::DuplicateUnlock {
                attendant_id: unlock.attendant_id,
                achievement_id: unlock.achievement_id,
                season_id: unlock.season_id,
            });
        };

        let entry_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO xp_ledger (attendant_id, base_points, multiplier, final_points, reason,
                                   source_type, related_id, occurred_at, season_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(entry.attendant_id)
        .bind(entry.base_points)
        .bind(entry.multiplier)
        .bind(entry.final_points)
        .bind(&entry.reason)
        .bind(entry.source_type)
        .bind(unlock_id)
        .bind(entry.occurred_at)
        .bind(entry.season_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut stored_unlock = unlock.clone();
        stored_unlock.id = unlock_id;
        let mut stored_entry = entry.clone();
        stored_entry.id = entry_id;
        stored_entry.related_id = Some(unlock_id);

        Ok((stored_unlock, stored_entry))
    }
}
