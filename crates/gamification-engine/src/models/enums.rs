//! 积分引擎枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use serde::{Deserialize, Serialize};

/// 员工状态
///
/// 由人事流程维护，引擎只读
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum AttendantStatus {
    /// 在职 - 参与评估和成就计算
    #[default]
    Active,
    /// 离职/停用 - 历史数据保留，不参与批处理
    Inactive,
}

/// XP 流水来源
///
/// 标识一条流水的触发来源，用于追溯以及 XP 阈值成就的口径计算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum XpSourceType {
    /// 满意度评价产生的 XP
    Evaluation,
    /// 成就解锁奖励的 XP（不计入 XP 阈值成就）
    Achievement,
    /// 管理员手工调整
    Manual,
}

impl XpSourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Evaluation => "evaluation",
            Self::Achievement => "achievement",
            Self::Manual => "manual",
        }
    }

    /// 是否计入 XP 阈值成就的累计口径
    ///
    /// 成就奖励计入会导致解锁一个成就后连锁解锁更多 XP 成就
    pub fn counts_toward_threshold(&self) -> bool {
        !matches!(self, Self::Achievement)
    }
}

/// 成就规则类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// 赛季内评价次数达到阈值
    CountThreshold,
    /// 赛季内 XP 累计达到阈值
    XpThreshold,
    /// 赛季内出现连续 N 次五星
    FiveStarStreak,
    /// 赛季内平均分达到阈值（且评价次数足够）
    HighAverage,
}

impl RuleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CountThreshold => "count_threshold",
            Self::XpThreshold => "xp_threshold",
            Self::FiveStarStreak => "five_star_streak",
            Self::HighAverage => "high_average",
        }
    }
}

impl std::fmt::Display for RuleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
