//! 积分引擎门面
//!
//! 对外暴露的唯一入口，组装评分表、赛季解析、XP 入账、解锁编排和进度查询。
//! 赛季在每次调用开始时解析一次，之后显式传给各组件。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use gamification_shared::config::{BatchConfig, ScoringConfig};

use crate::error::{EngineError, Result};
use crate::models::{Season, XpLedgerEntry};
use crate::repository::{RecordSink, RecordSource};
use crate::scoring::RatingScoreTable;
use crate::season::SeasonResolver;
use crate::service::{
    AttendantProgress, BatchUnlockResult, EvaluationOutcome, ProgressService, UnlockFailure,
    UnlockOrchestrator, UnlockResult, XpAccrualService,
};

/// 引擎运行参数
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub score_table: RatingScoreTable,
    pub global_multiplier: f64,
    /// 批处理并发度
    pub concurrency: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            score_table: RatingScoreTable::default(),
            global_multiplier: 1.0,
            concurrency: 4,
        }
    }
}

impl EngineSettings {
    /// 从配置构建，评分表或倍率不合法时返回配置错误
    pub fn from_config(scoring: &ScoringConfig, batch: &BatchConfig) -> Result<Self> {
        let multiplier = scoring.global_multiplier;
        if !(multiplier.is_finite() && multiplier > 0.0) {
            return Err(EngineError::InvalidScoreTable(format!(
                "global_multiplier 必须为正数: {}",
                multiplier
            )));
        }

        Ok(Self {
            score_table: RatingScoreTable::from_config(scoring)?,
            global_multiplier: multiplier,
            concurrency: batch.concurrency.max(1),
        })
    }
}

/// 积分引擎
pub struct GamificationEngine<S, K>
where
    S: RecordSource,
    K: RecordSink,
{
    seasons: SeasonResolver<S>,
    accrual: XpAccrualService<S, K>,
    orchestrator: UnlockOrchestrator<S, K>,
    progress: ProgressService<S>,
}

impl<S, K> GamificationEngine<S, K>
where
    S: RecordSource,
    K: RecordSink,
{
    pub fn new(source: Arc<S>, sink: Arc<K>, settings: EngineSettings) -> Self {
        Self {
            seasons: SeasonResolver::new(source.clone()),
            accrual: XpAccrualService::new(
                source.clone(),
                sink.clone(),
                settings.score_table,
                settings.global_multiplier,
            ),
            orchestrator: UnlockOrchestrator::new(source.clone(), sink, settings.concurrency),
            progress: ProgressService::new(source),
        }
    }

    // ==================== XP ====================

    /// 记录一次评价的 XP 流水
    pub async fn accrue_evaluation_xp(
        &self,
        attendant_id: i64,
        rating: i32,
        occurred_at: DateTime<Utc>,
        evaluation_id: i64,
    ) -> Result<XpLedgerEntry> {
        self.accrual
            .accrue(attendant_id, rating, occurred_at, evaluation_id)
            .await
    }

    /// 手工调整 XP（计入 XP 阈值成就）
    pub async fn adjust_xp(
        &self,
        attendant_id: i64,
        points: i32,
        reason: &str,
        occurred_at: DateTime<Utc>,
    ) -> Result<XpLedgerEntry> {
        self.accrual
            .adjust(attendant_id, points, reason, occurred_at)
            .await
    }

    /// 处理一次新评价：先入账 XP，再在评价所属赛季内重新判定成就
    ///
    /// 流水写入成功后不再返回错误，成就判定的失败记入 `unlocks.errors`，
    /// 调用方稍后重新处理该员工即可，不应重放本次评价
    #[instrument(skip(self), fields(attendant_id = attendant_id, evaluation_id = evaluation_id))]
    pub async fn record_evaluation(
        &self,
        attendant_id: i64,
        rating: i32,
        occurred_at: DateTime<Utc>,
        evaluation_id: i64,
    ) -> Result<EvaluationOutcome> {
        let ledger_entry = self
            .accrual
            .accrue(attendant_id, rating, occurred_at, evaluation_id)
            .await?;

        let unlocks = match ledger_entry.season_id {
            Some(season_id) => Some(self.unlock_after_accrual(attendant_id, season_id).await),
            None => None,
        };

        Ok(EvaluationOutcome {
            ledger_entry,
            unlocks,
        })
    }

    /// 入账之后的成就判定，任何失败都折叠进结果
    async fn unlock_after_accrual(&self, attendant_id: i64, season_id: i64) -> UnlockResult {
        let outcome = match self.seasons.get(season_id).await {
            Ok(season) => self.orchestrator.process_attendant(attendant_id, &season).await,
            Err(e) => Err(e),
        };

        outcome.unwrap_or_else(|e| {
            warn!(
                attendant_id,
                season_id,
                error = %e,
                "XP 已入账，成就判定失败"
            );
            let mut result = UnlockResult::new(attendant_id, season_id);
            result.errors.push(UnlockFailure::new(None, &e));
            result
        })
    }

    // ==================== 成就 ====================

    /// 处理单个员工的成就解锁
    ///
    /// 未指定赛季时按当前时间解析
    pub async fn process_attendant_achievements(
        &self,
        attendant_id: i64,
        season_id: Option<i64>,
    ) -> Result<UnlockResult> {
        let season = self.resolve_season(season_id).await?;
        self.orchestrator
            .process_attendant(attendant_id, &season)
            .await
    }

    /// 批量处理成就解锁
    ///
    /// 赛季解析失败时整体返回错误；之后的单个员工失败体现在结果中
    pub async fn process_batch_achievements(
        &self,
        attendant_ids: &[i64],
        season_id: Option<i64>,
    ) -> Result<BatchUnlockResult> {
        let season = self.resolve_season(season_id).await?;
        Ok(self.orchestrator.process_batch(attendant_ids, &season).await)
    }

    /// 在已解析的赛季上批量处理（分块执行时复用同一赛季）
    pub async fn process_batch_for_season(
        &self,
        attendant_ids: &[i64],
        season: &Season,
    ) -> BatchUnlockResult {
        self.orchestrator.process_batch(attendant_ids, season).await
    }

    // ==================== 查询 ====================

    /// 查询员工赛季进度
    pub async fn attendant_progress(
        &self,
        attendant_id: i64,
        season_id: Option<i64>,
    ) -> Result<AttendantProgress> {
        let season = self.resolve_season(season_id).await?;
        self.progress.progress(attendant_id, &season).await
    }

    // ==================== 赛季 ====================

    /// 解析赛季
    ///
    /// 指定 id 时按 id 查找（不存在返回 `UnknownSeason`，未启用返回 `InactiveSeason`），
    /// 否则取当前时间所在的赛季（没有时返回 `NoActiveSeason`）
    pub async fn resolve_season(&self, season_id: Option<i64>) -> Result<Season> {
        match season_id {
            Some(id) => self.seasons.get_active(id).await,
            None => self.seasons.require(Utc::now()).await,
        }
    }

    /// 校验启用赛季的时间窗口
    pub async fn validate_seasons(&self) -> Result<()> {
        self.seasons.validate_windows().await?;
        info!("赛季时间窗口校验通过");
        Ok(())
    }
}
