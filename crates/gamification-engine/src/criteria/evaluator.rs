//! 条件评估器
//!
//! 按规则类型分发到对应的判定逻辑

use chrono::{DateTime, Utc};

use super::snapshot::EvaluationSnapshot;
use crate::error::Result;
use crate::models::{AchievementConfig, AchievementRule, Season};
use crate::repository::RecordSource;

/// 条件评估器
pub struct CriteriaEvaluator;

impl CriteriaEvaluator {
    /// 判定快照是否满足规则
    pub fn evaluate(rule: &AchievementRule, snapshot: &EvaluationSnapshot) -> bool {
        match *rule {
            AchievementRule::CountThreshold { min_count } => {
                snapshot.evaluation_count() >= min_count as usize
            }
            AchievementRule::XpThreshold { min_xp } => snapshot.qualifying_xp() >= min_xp,
            AchievementRule::FiveStarStreak { length } => {
                snapshot.max_five_star_streak() >= length
            }
            AchievementRule::HighAverage {
                min_average,
                min_count,
            } => {
                // 次数不足时不看平均分
                if snapshot.evaluation_count() < min_count as usize {
                    return false;
                }
                snapshot
                    .average_rating()
                    .is_some_and(|avg| avg >= min_average)
            }
        }
    }

    /// 加载快照并判定员工在赛季内是否满足成就条件
    pub async fn is_eligible<S: RecordSource + ?Sized>(
        source: &S,
        attendant_id: i64,
        achievement: &AchievementConfig,
        season: &Season,
    ) -> Result<bool> {
        let snapshot = load_snapshot(source, attendant_id, season).await?;
        Ok(Self::evaluate(&achievement.rule, &snapshot))
    }
}

/// 加载员工在赛季窗口内的评价和流水
pub async fn load_snapshot<S: RecordSource + ?Sized>(
    source: &S,
    attendant_id: i64,
    season: &Season,
) -> Result<EvaluationSnapshot> {
    let (from, to): (DateTime<Utc>, DateTime<Utc>) = season.window();
    let evaluations = source.list_evaluations(attendant_id, from, to).await?;
    let ledger = source.list_ledger_entries(attendant_id, from, to).await?;
    Ok(EvaluationSnapshot::for_season(season, evaluations, ledger))
}
