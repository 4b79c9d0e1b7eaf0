//! 内存存储
//!
//! 参考数据（员工、评价、赛季、成就）放在 DashMap 中；流水和解锁记录
//! 放在同一把写锁后面，保证“解锁记录 + 奖励流水”要么同时写入，要么都不写。

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use parking_lot::RwLock;

use super::traits::{RecordSink, RecordSource};
use crate::error::{EngineError, Result};
use crate::models::{
    AchievementConfig, Attendant, Evaluation, Season, UnlockKey, UnlockRecord, XpLedgerEntry,
};

#[derive(Debug, Default)]
struct LedgerState {
    ledger: Vec<XpLedgerEntry>,
    unlocks: HashMap<UnlockKey, UnlockRecord>,
}

/// 内存记录存储
///
/// 同时实现 `RecordSource` 和 `RecordSink`，支持按员工注入写入失败
#[derive(Debug)]
pub struct MemoryRecordStore {
    attendants: DashMap<i64, Attendant>,
    evaluations: DashMap<i64, Evaluation>,
    seasons: DashMap<i64, Season>,
    achievements: DashMap<i64, AchievementConfig>,
    state: RwLock<LedgerState>,
    next_id: AtomicI64,
    failing_writes: DashSet<i64>,
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            attendants: DashMap::new(),
            evaluations: DashMap::new(),
            seasons: DashMap::new(),
            achievements: DashMap::new(),
            state: RwLock::new(LedgerState::default()),
            next_id: AtomicI64::new(1),
            failing_writes: DashSet::new(),
        }
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn check_writable(&self, attendant_id: i64) -> Result<()> {
        if self.failing_writes.contains(&attendant_id) {
            return Err(EngineError::Storage(format!(
                "写入被拒绝: attendant_id={}",
                attendant_id
            )));
        }
        Ok(())
    }

    // ==================== 数据准备 ====================

    pub fn insert_attendant(&self, attendant: Attendant) {
        self.attendants.insert(attendant.id, attendant);
    }

    /// 写入评价，id 为 0 时自动分配
    pub fn insert_evaluation(&self, mut evaluation: Evaluation) -> Evaluation {
        if evaluation.id == 0 {
            evaluation.id = self.allocate_id();
        }
        self.evaluations.insert(evaluation.id, evaluation.clone());
        evaluation
    }

    pub fn insert_season(&self, season: Season) {
        self.seasons.insert(season.id, season);
    }

    pub fn insert_achievement(&self, achievement: AchievementConfig) {
        self.achievements.insert(achievement.id, achievement);
    }

    // ==================== 故障注入 ====================

    /// 之后该员工的所有写入都返回存储错误
    pub fn fail_writes_for(&self, attendant_id: i64) {
        self.failing_writes.insert(attendant_id);
    }

    pub fn clear_write_failures(&self) {
        self.failing_writes.clear();
    }

    // ==================== 检查 ====================

    /// 员工的全部流水，按写入顺序
    pub fn ledger_entries(&self, attendant_id: i64) -> Vec<XpLedgerEntry> {
        self.state
            .read()
            .ledger
            .iter()
            .filter(|e| e.attendant_id == attendant_id)
            .cloned()
            .collect()
    }

    /// 员工在所有赛季的解锁记录，按 id 排序
    pub fn unlock_records(&self, attendant_id: i64) -> Vec<UnlockRecord> {
        let mut records: Vec<UnlockRecord> = self
            .state
            .read()
            .unlocks
            .values()
            .filter(|u| u.attendant_id == attendant_id)
            .cloned()
            .collect();
        records.sort_by_key(|u| u.id);
        records
    }
}

#[async_trait]
impl RecordSource for MemoryRecordStore {
    async fn list_evaluations(
        &self,
        attendant_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Evaluation>> {
        let mut evaluations: Vec<Evaluation> = self
            .evaluations
            .iter()
            .filter(|e| e.attendant_id == attendant_id && e.occurred_at >= from && e.occurred_at < to)
            .map(|e| e.value().clone())
            .collect();
        evaluations.sort_by_key(|e| (e.occurred_at, e.id));
        Ok(evaluations)
    }

    async fn list_ledger_entries(
        &self,
        attendant_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<XpLedgerEntry>> {
        let mut entries: Vec<XpLedgerEntry> = self
            .state
            .read()
            .ledger
            .iter()
            .filter(|e| e.attendant_id == attendant_id && e.occurred_at >= from && e.occurred_at < to)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.occurred_at, e.id));
        Ok(entries)
    }

    async fn list_seasons_at(&self, at: DateTime<Utc>) -> Result<Vec<Season>> {
        let mut seasons: Vec<Season> = self
            .seasons
            .iter()
            .filter(|s| s.active && s.contains(at))
            .map(|s| s.value().clone())
            .collect();
        seasons.sort_by_key(|s| s.id);
        Ok(seasons)
    }

    async fn get_season(&self, id: i64) -> Result<Option<Season>> {
        Ok(self.seasons.get(&id).map(|s| s.value().clone()))
    }

    async fn list_active_seasons(&self) -> Result<Vec<Season>> {
        let mut seasons: Vec<Season> = self
            .seasons
            .iter()
            .filter(|s| s.active)
            .map(|s| s.value().clone())
            .collect();
        seasons.sort_by_key(|s| (s.start_date, s.id));
        Ok(seasons)
    }

    async fn list_active_achievements(&self) -> Result<Vec<AchievementConfig>> {
        let mut achievements: Vec<AchievementConfig> = self
            .achievements
            .iter()
            .filter(|a| a.active)
            .map(|a| a.value().clone())
            .collect();
        achievements.sort_by_key(|a| a.id);
        Ok(achievements)
    }

    async fn list_unlocks(&self, attendant_id: i64, season_id: i64) -> Result<Vec<UnlockRecord>> {
        let mut unlocks: Vec<UnlockRecord> = self
            .state
            .read()
            .unlocks
            .values()
            .filter(|u| u.attendant_id == attendant_id && u.season_id == season_id)
            .cloned()
            .collect();
        unlocks.sort_by_key(|u| u.id);
        Ok(unlocks)
    }

    async fn list_active_attendants(&self) -> Result<Vec<Attendant>> {
        let mut attendants: Vec<Attendant> = self
            .attendants
            .iter()
            .filter(|a| a.is_active())
            .map(|a| a.value().clone())
            .collect();
        attendants.sort_by_key(|a| a.id);
        Ok(attendants)
    }
}

#[async_trait]
impl RecordSink for MemoryRecordStore {
    async fn append_ledger_entry(&self, entry: &XpLedgerEntry) -> Result<XpLedgerEntry> {
        self.check_writable(entry.attendant_id)?;

        let mut stored = entry.clone();
        stored.id = self.allocate_id();
        self.state.write().ledger.push(stored.clone());
        Ok(stored)
    }

    async fn insert_unlock(
        &self,
        unlock: &UnlockRecord,
        entry: &XpLedgerEntry,
    ) -> Result<(UnlockRecord, XpLedgerEntry)> {
        self.check_writable(unlock.attendant_id)?;

        // 检查和写入在同一把写锁内完成
        let mut state = self.state.write();
        let key = unlock.key();
        if state.unlocks.contains_key(&key) {
            return Err(EngineError::DuplicateUnlock {
                attendant_id: unlock.attendant_id,
                achievement_id: unlock.achievement_id,
                season_id: unlock.season_id,
            });
        }

        let mut stored_unlock = unlock.clone();
        stored_unlock.id = self.allocate_id();

        let mut stored_entry = entry.clone();
        stored_entry.id = self.allocate_id();
        stored_entry.related_id = Some(stored_unlock.id);

        state.unlocks.insert(key, stored_unlock.clone());
        state.ledger.push(stored_entry.clone());

        Ok((stored_unlock, stored_entry))
    }
}
