//! 赛季解析器
//!
//! 重叠的启用赛季属于配置错误，任何时候都不会在多个候选中挑一个

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{EngineError, Result};
use crate::models::Season;
use crate::repository::RecordSource;

/// 从候选赛季中选出包含该时间点的唯一赛季
///
/// 只考虑启用的赛季；命中多个时返回 `OverlappingSeasons`
pub fn pick_season(candidates: &[Season], at: DateTime<Utc>) -> Result<Option<Season>> {
    let mut matched = candidates.iter().filter(|s| s.active && s.contains(at));

    let Some(first) = matched.next() else {
        return Ok(None);
    };
    if let Some(second) = matched.next() {
        return Err(EngineError::OverlappingSeasons {
            first: first.id.min(second.id),
            second: first.id.max(second.id),
        });
    }
    Ok(Some(first.clone()))
}

/// 找出所有时间窗口重叠的启用赛季对
///
/// 返回的每一对按 (较小 id, 较大 id) 排列
pub fn find_overlaps(seasons: &[Season]) -> Vec<(i64, i64)> {
    let active: Vec<&Season> = seasons.iter().filter(|s| s.active).collect();
    let mut pairs = Vec::new();

    for (i, a) in active.iter().enumerate() {
        for b in &active[i + 1..] {
            if a.overlaps(b) {
                pairs.push((a.id.min(b.id), a.id.max(b.id)));
            }
        }
    }
    pairs.sort_unstable();
    pairs
}

/// 赛季解析器
pub struct SeasonResolver<S: RecordSource> {
    source: Arc<S>,
}

impl<S: RecordSource> SeasonResolver<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// 查找时间点所属的启用赛季，没有时返回 None
    pub async fn resolve(&self, at: DateTime<Utc>) -> Result<Option<Season>> {
        let candidates = self.source.list_seasons_at(at).await?;
        let season = pick_season(&candidates, at)?;
        debug!(
            at = %at,
            season_id = season.as_ref().map(|s| s.id),
            "赛季解析完成"
        );
        Ok(season)
    }

    /// 查找时间点所属的启用赛季，没有时返回 `NoActiveSeason`
    pub async fn require(&self, at: DateTime<Utc>) -> Result<Season> {
        self.resolve(at)
            .await?
            .ok_or(EngineError::NoActiveSeason(at))
    }

    /// 按 id 获取赛季，不存在时返回 `UnknownSeason`
    pub async fn get(&self, season_id: i64) -> Result<Season> {
        self.source
            .get_season(season_id)
            .await?
            .ok_or(EngineError::UnknownSeason(season_id))
    }

    /// 按 id 获取启用的赛季，未启用时返回 `InactiveSeason`
    pub async fn get_active(&self, season_id: i64) -> Result<Season> {
        let season = self.get(season_id).await?;
        if !season.active {
            warn!(season_id, "指定的赛季未启用");
            return Err(EngineError::InactiveSeason(season_id));
        }
        Ok(season)
    }

    /// 校验所有启用赛季的时间窗口
    ///
    /// 先检查起止日期，再检查两两重叠；报告第一个问题，其余问题写入日志
    pub async fn validate_windows(&self) -> Result<()> {
        let seasons = self.source.list_active_seasons().await?;

        if let Some(bad) = seasons.iter().find(|s| !s.is_well_formed()) {
            return Err(EngineError::InvalidSeasonWindow {
                season_id: bad.id,
                start: bad.start_date,
                end: bad.end_date,
            });
        }

        let overlaps = find_overlaps(&seasons);
        for (first, second) in &overlaps {
            warn!(first, second, "启用赛季时间窗口重叠");
        }
        match overlaps.first() {
            Some(&(first, second)) => Err(EngineError::OverlappingSeasons { first, second }),
            None => Ok(()),
        }
    }
}
