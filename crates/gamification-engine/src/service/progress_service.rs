//! 员工进度查询
//!
//! 只读服务，汇总员工在某赛季内的评价统计、XP 和已解锁成就

use std::sync::Arc;

use tracing::instrument;

use crate::criteria::load_snapshot;
use crate::error::Result;
use crate::models::Season;
use crate::repository::RecordSource;
use crate::service::dto::AttendantProgress;

/// 进度查询服务
pub struct ProgressService<S: RecordSource> {
    source: Arc<S>,
}

impl<S: RecordSource> ProgressService<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// 查询员工在赛季内的进度
    ///
    /// 成就奖励 XP 按解锁记录汇总，与奖励流水的入账时间无关
    #[instrument(skip(self, season), fields(attendant_id = attendant_id, season_id = season.id))]
    pub async fn progress(&self, attendant_id: i64, season: &Season) -> Result<AttendantProgress> {
        let snapshot = load_snapshot(self.source.as_ref(), attendant_id, season).await?;
        let unlocks = self.source.list_unlocks(attendant_id, season.id).await?;

        let qualifying_xp = snapshot.qualifying_xp();
        let achievement_xp: f64 = unlocks.iter().map(|u| f64::from(u.xp_gained)).sum();
        let mut unlocked_achievement_ids: Vec<i64> =
            unlocks.iter().map(|u| u.achievement_id).collect();
        unlocked_achievement_ids.sort_unstable();

        Ok(AttendantProgress {
            attendant_id,
            season_id: season.id,
            evaluation_count: snapshot.evaluation_count(),
            average_rating: snapshot.average_rating(),
            best_five_star_streak: snapshot.max_five_star_streak(),
            qualifying_xp,
            achievement_xp,
            total_xp: qualifying_xp + achievement_xp,
            unlocked_achievement_ids,
        })
    }
}
