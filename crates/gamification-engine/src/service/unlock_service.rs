//! 成就解锁编排
//!
//! ## 单个员工的处理流程
//!
//! 1. 加载启用的成就配置
//! 2. 加载员工在该赛季已解锁的成就
//! 3. 加载赛季快照，对未解锁的成就逐个判定
//! 4. 满足条件的成就原子写入解锁记录和奖励流水
//!
//! 唯一键冲突（并发解锁）视为成功的空操作；其他单条失败记入结果后继续处理。
//! 第 1 ~ 3 步的加载失败会让整个员工的处理失败。

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use gamification_shared::observability::metrics;

use crate::criteria::{CriteriaEvaluator, load_snapshot};
use crate::error::Result;
use crate::models::{AchievementConfig, Season, UnlockRecord, XpLedgerEntry};
use crate::repository::{RecordSink, RecordSource};
use crate::service::dto::{BatchUnlockResult, UnlockFailure, UnlockResult};

/// 单条解锁的结果
enum UnlockOutcome {
    Unlocked(UnlockRecord),
    AlreadyUnlocked,
}

/// 成就解锁编排器
///
/// 引擎中除 XP 入账外唯一产生写入的组件
pub struct UnlockOrchestrator<S, K>
where
    S: RecordSource,
    K: RecordSink,
{
    source: Arc<S>,
    sink: Arc<K>,
    /// 批处理时同时处理的员工数
    concurrency: usize,
}

impl<S, K> UnlockOrchestrator<S, K>
where
    S: RecordSource,
    K: RecordSink,
{
    pub fn new(source: Arc<S>, sink: Arc<K>, concurrency: usize) -> Self {
        Self {
            source,
            sink,
            concurrency: concurrency.max(1),
        }
    }

    /// 处理单个员工在指定赛季的成就解锁
    #[instrument(skip(self, season), fields(attendant_id = attendant_id, season_id = season.id))]
    pub async fn process_attendant(&self, attendant_id: i64, season: &Season) -> Result<UnlockResult> {
        let mut result = UnlockResult::new(attendant_id, season.id);

        let achievements = self.source.list_active_achievements().await?;
        let unlocked: HashSet<i64> = self
            .source
            .list_unlocks(attendant_id, season.id)
            .await?
            .into_iter()
            .map(|u| u.achievement_id)
            .collect();

        let pending: Vec<&AchievementConfig> = achievements
            .iter()
            .filter(|a| !unlocked.contains(&a.id))
            .collect();
        if pending.is_empty() {
            debug!(attendant_id, season_id = season.id, "没有待判定的成就");
            return Ok(result);
        }

        let snapshot = load_snapshot(self.source.as_ref(), attendant_id, season).await?;

        for achievement in pending {
            // 配置不合法的成就跳过判定，作为失败记录
            if let Err(e) = achievement.validate() {
                warn!(
                    attendant_id,
                    achievement_id = achievement.id,
                    error = %e,
                    "成就配置无效，跳过"
                );
                result.errors.push(UnlockFailure::new(Some(achievement.id), &e));
                continue;
            }

            let eligible = CriteriaEvaluator::evaluate(&achievement.rule, &snapshot);
            metrics::record_achievement_evaluation(achievement.rule.kind().as_str(), eligible);
            if !eligible {
                continue;
            }

            match self.unlock(attendant_id, achievement, season).await {
                Ok(UnlockOutcome::Unlocked(record)) => {
                    result.xp_awarded += i64::from(record.xp_gained);
                    result.new_unlocks.push(record);
                }
                Ok(UnlockOutcome::AlreadyUnlocked) => {}
                Err(e) => {
                    warn!(
                        attendant_id,
                        achievement_id = achievement.id,
                        season_id = season.id,
                        error = %e,
                        "成就解锁写入失败"
                    );
                    result.errors.push(UnlockFailure::new(Some(achievement.id), &e));
                }
            }
        }

        if !result.new_unlocks.is_empty() || result.has_errors() {
            info!(
                attendant_id,
                season_id = season.id,
                new_unlocks = result.new_unlocks.len(),
                xp_awarded = result.xp_awarded,
                errors = result.errors.len(),
                "员工成就处理完成"
            );
        }

        Ok(result)
    }

    /// 批量处理多个员工
    ///
    /// 员工之间相互独立，单个失败不影响其他员工；重复的 id 只处理一次
    #[instrument(skip(self, attendant_ids, season), fields(attendant_count = attendant_ids.len(), season_id = season.id))]
    pub async fn process_batch(&self, attendant_ids: &[i64], season: &Season) -> BatchUnlockResult {
        let started = Instant::now();
        let mut batch = BatchUnlockResult::new(season.id);

        let mut seen = HashSet::with_capacity(attendant_ids.len());
        let ids: Vec<i64> = attendant_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        // 按并发度分片，每个分片内并发执行
        for chunk in ids.chunks(self.concurrency) {
            let tasks = chunk.iter().map(|&attendant_id| async move {
                (attendant_id, self.process_attendant(attendant_id, season).await)
            });

            for (attendant_id, outcome) in join_all(tasks).await {
                match outcome {
                    Ok(result) => batch.absorb(result),
                    Err(e) => {
                        warn!(attendant_id, error = %e, "员工成就处理失败");
                        let mut result = UnlockResult::new(attendant_id, season.id);
                        result.errors.push(UnlockFailure::new(None, &e));
                        batch.absorb(result);
                    }
                }
            }
        }

        metrics::record_unlock_batch(
            ids.len(),
            batch.failed.len(),
            started.elapsed().as_secs_f64(),
        );
        info!(
            season_id = season.id,
            attendants = ids.len(),
            total_unlocked = batch.total_unlocked,
            total_xp_awarded = batch.total_xp_awarded,
            succeeded = batch.succeeded.len(),
            failed = batch.failed.len(),
            "批量成就处理完成"
        );

        batch
    }

    /// 写入一条解锁记录及其奖励流水
    async fn unlock(
        &self,
        attendant_id: i64,
        achievement: &AchievementConfig,
        season: &Season,
    ) -> Result<UnlockOutcome> {
        let unlock = UnlockRecord::new(
            attendant_id,
            achievement.id,
            season.id,
            achievement.xp_reward,
            Utc::now(),
        );
        let entry = XpLedgerEntry::for_achievement(&unlock, &achievement.title);

        match self.sink.insert_unlock(&unlock, &entry).await {
            Ok((record, _)) => {
                metrics::record_achievement_unlock("unlocked");
                info!(
                    attendant_id,
                    achievement_id = achievement.id,
                    season_id = season.id,
                    xp_gained = record.xp_gained,
                    "成就已解锁"
                );
                Ok(UnlockOutcome::Unlocked(record))
            }
            Err(e) if e.is_duplicate_unlock() => {
                metrics::record_achievement_unlock("duplicate");
                debug!(
                    attendant_id,
                    achievement_id = achievement.id,
                    season_id = season.id,
                    "成就已被并发解锁，忽略"
                );
                Ok(UnlockOutcome::AlreadyUnlocked)
            }
            Err(e) => {
                metrics::record_achievement_unlock("failed");
                Err(e)
            }
        }
    }
}
