//! XP 流水与成就解锁记录
//!
//! 两者都是只追加的数据：流水从不更新，解锁记录每个
//! (员工, 成就, 赛季) 至多一条。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::XpSourceType;

/// XP 流水
///
/// 记录每一次 XP 变动的来源和计算过程（基础分 × 倍率 = 最终分）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct XpLedgerEntry {
    pub id: i64,
    pub attendant_id: i64,
    pub base_points: i32,
    pub multiplier: f64,
    pub final_points: f64,
    /// 流水说明
    pub reason: String,
    pub source_type: XpSourceType,
    /// 关联的评价 ID 或解锁记录 ID
    #[sqlx(default)]
    pub related_id: Option<i64>,
    pub occurred_at: DateTime<Utc>,
    /// 所属赛季（评价不在任何赛季内时为空）
    #[sqlx(default)]
    pub season_id: Option<i64>,
}

impl XpLedgerEntry {
    /// 创建评价类流水
    ///
    /// 最终分 = 基础分 × 倍率，id 由存储层分配
    pub fn for_evaluation(
        attendant_id: i64,
        evaluation_id: i64,
        rating: i32,
        base_points: i32,
        multiplier: f64,
        occurred_at: DateTime<Utc>,
        season_id: Option<i64>,
    ) -> Self {
        Self {
            id: 0,
            attendant_id,
            base_points,
            multiplier,
            final_points: f64::from(base_points) * multiplier,
            reason: format!("{} 星评价", rating),
            source_type: XpSourceType::Evaluation,
            related_id: Some(evaluation_id),
            occurred_at,
            season_id,
        }
    }

    /// 创建成就奖励流水
    ///
    /// 奖励不叠加任何倍率；related_id 在解锁记录落库后由存储层回填
    pub fn for_achievement(unlock: &UnlockRecord, achievement_title: &str) -> Self {
        Self {
            id: 0,
            attendant_id: unlock.attendant_id,
            base_points: unlock.xp_gained,
            multiplier: 1.0,
            final_points: f64::from(unlock.xp_gained),
            reason: format!("解锁成就: {}", achievement_title),
            source_type: XpSourceType::Achievement,
            related_id: (unlock.id != 0).then_some(unlock.id),
            occurred_at: unlock.unlocked_at,
            season_id: Some(unlock.season_id),
        }
    }
}

/// 成就解锁记录
///
/// (attendant_id, achievement_id, season_id) 唯一，只由解锁编排器创建
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UnlockRecord {
    pub id: i64,
    pub attendant_id: i64,
    pub achievement_id: i64,
    pub season_id: i64,
    pub unlocked_at: DateTime<Utc>,
    /// 解锁时获得的 XP
    pub xp_gained: i32,
}

/// 解锁记录唯一键
pub type UnlockKey = (i64, i64, i64);

impl UnlockRecord {
    pub fn new(
        attendant_id: i64,
        achievement_id: i64,
        season_id: i64,
        xp_gained: i32,
        unlocked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: 0,
            attendant_id,
            achievement_id,
            season_id,
            unlocked_at,
            xp_gained,
        }
    }

    pub fn key(&self) -> UnlockKey {
        (self.attendant_id, self.achievement_id, self.season_id)
    }
}
