//! XP 累计服务
//!
//! 把一次评分换算成 XP 流水：
//! 最终分 = 基础分 × 全局倍率 × 赛季倍率（无赛季时为 1）
//!
//! 流水只追加不修改；评分非法时在任何写入之前失败，写入失败直接上报，不做重试

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use gamification_shared::observability::metrics;

use crate::error::{EngineError, Result};
use crate::models::{XpLedgerEntry, XpSourceType};
use crate::repository::{RecordSink, RecordSource};
use crate::scoring::RatingScoreTable;
use crate::season::SeasonResolver;

/// XP 累计服务
pub struct XpAccrualService<S, K>
where
    S: RecordSource,
    K: RecordSink,
{
    seasons: SeasonResolver<S>,
    sink: Arc<K>,
    score_table: RatingScoreTable,
    global_multiplier: f64,
}

impl<S, K> XpAccrualService<S, K>
where
    S: RecordSource,
    K: RecordSink,
{
    pub fn new(
        source: Arc<S>,
        sink: Arc<K>,
        score_table: RatingScoreTable,
        global_multiplier: f64,
    ) -> Self {
        Self {
            seasons: SeasonResolver::new(source),
            sink,
            score_table,
            global_multiplier,
        }
    }

    /// 记录一次评价的 XP
    #[instrument(skip(self), fields(attendant_id = attendant_id, evaluation_id = evaluation_id))]
    pub async fn accrue(
        &self,
        attendant_id: i64,
        rating: i32,
        occurred_at: DateTime<Utc>,
        evaluation_id: i64,
    ) -> Result<XpLedgerEntry> {
        let base_points = self.score_table.score(rating)?;
        let season = self.seasons.resolve(occurred_at).await?;

        let season_multiplier = season.as_ref().map_or(1.0, |s| s.xp_multiplier);
        let multiplier = self.global_multiplier * season_multiplier;

        let entry = XpLedgerEntry::for_evaluation(
            attendant_id,
            evaluation_id,
            rating,
            base_points,
            multiplier,
            occurred_at,
            season.as_ref().map(|s| s.id),
        );
        let stored = self.sink.append_ledger_entry(&entry).await?;

        metrics::record_xp_accrual(
            XpSourceType::Evaluation.as_str(),
            stored.season_id.is_some(),
            stored.final_points,
        );
        info!(
            attendant_id,
            rating,
            base_points,
            multiplier,
            final_points = stored.final_points,
            season_id = stored.season_id,
            "评价 XP 已入账"
        );

        Ok(stored)
    }

    /// 记录一次手工 XP 调整
    ///
    /// 调整值原样入账，不叠加倍率；所属赛季按发生时间解析
    #[instrument(skip(self, reason), fields(attendant_id = attendant_id))]
    pub async fn adjust(
        &self,
        attendant_id: i64,
        points: i32,
        reason: &str,
        occurred_at: DateTime<Utc>,
    ) -> Result<XpLedgerEntry> {
        if reason.trim().is_empty() {
            return Err(EngineError::Validation("手工调整必须填写原因".to_string()));
        }
        let season = self.seasons.resolve(occurred_at).await?;

        let entry = XpLedgerEntry {
            id: 0,
            attendant_id,
            base_points: points,
            multiplier: 1.0,
            final_points: f64::from(points),
            reason: reason.to_string(),
            source_type: XpSourceType::Manual,
            related_id: None,
            occurred_at,
            season_id: season.map(|s| s.id),
        };
        let stored = self.sink.append_ledger_entry(&entry).await?;

        metrics::record_xp_accrual(
            XpSourceType::Manual.as_str(),
            stored.season_id.is_some(),
            stored.final_points,
        );
        info!(attendant_id, points, season_id = stored.season_id, "手工 XP 调整已入账");

        Ok(stored)
    }
}
