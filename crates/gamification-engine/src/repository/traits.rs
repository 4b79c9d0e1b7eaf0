//! 仓储 Trait 定义
//!
//! 引擎只依赖这两个接口：读取原始记录和写入计算结果。
//! 时间范围参数均为半开区间 [from, to)。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::models::{
    AchievementConfig, Attendant, Evaluation, Season, UnlockRecord, XpLedgerEntry,
};

/// 记录读取接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordSource: Send + Sync {
    // 评价与流水
    async fn list_evaluations(
        &self,
        attendant_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Evaluation>>;
    async fn list_ledger_entries(
        &self,
        attendant_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<XpLedgerEntry>>;

    // 赛季（只返回启用的赛季）
    async fn list_seasons_at(&self, at: DateTime<Utc>) -> Result<Vec<Season>>;
    async fn get_season(&self, id: i64) -> Result<Option<Season>>;
    async fn list_active_seasons(&self) -> Result<Vec<Season>>;

    // 成就
    async fn list_active_achievements(&self) -> Result<Vec<AchievementConfig>>;
    async fn list_unlocks(&self, attendant_id: i64, season_id: i64) -> Result<Vec<UnlockRecord>>;

    // 员工
    async fn list_active_attendants(&self) -> Result<Vec<Attendant>>;
}

/// 结果写入接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// 追加一条 XP 流水，返回带 id 的记录
    async fn append_ledger_entry(&self, entry: &XpLedgerEntry) -> Result<XpLedgerEntry>;

    /// 原子地写入解锁记录及其奖励流水
    ///
    /// (attendant_id, achievement_id, season_id) 已存在时返回
    /// `EngineError::DuplicateUnlock`，且不写入任何流水
    async fn insert_unlock(
        &self,
        unlock: &UnlockRecord,
        entry: &XpLedgerEntry,
    ) -> Result<(UnlockRecord, XpLedgerEntry)>;
}
