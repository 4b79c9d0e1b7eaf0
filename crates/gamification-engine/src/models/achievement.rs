//! 成就配置定义
//!
//! 规则类型和参数合并为一个带标签的枚举，序列化格式：
//! `{"kind": "five_star_streak", "params": {"length": 3}}`

use serde::{Deserialize, Serialize};

use super::enums::RuleKind;
use crate::error::{EngineError, Result};

/// 成就解锁规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "params", rename_all = "snake_case")]
pub enum AchievementRule {
    /// 赛季内评价次数 >= min_count
    CountThreshold { min_count: u32 },
    /// 赛季内 XP（不含成就奖励）>= min_xp
    XpThreshold { min_xp: f64 },
    /// 赛季内最长连续五星次数 >= length
    FiveStarStreak { length: u32 },
    /// 评价次数 >= min_count 且平均分 >= min_average
    HighAverage { min_average: f64, min_count: u32 },
}

impl AchievementRule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Self::CountThreshold { .. } => RuleKind::CountThreshold,
            Self::XpThreshold { .. } => RuleKind::XpThreshold,
            Self::FiveStarStreak { .. } => RuleKind::FiveStarStreak,
            Self::HighAverage { .. } => RuleKind::HighAverage,
        }
    }

    /// 校验规则参数
    ///
    /// 返回不合法原因，参数合法时返回 None
    pub fn validate(&self) -> Option<String> {
        match *self {
            Self::CountThreshold { min_count } if min_count == 0 => {
                Some("min_count 必须大于 0".to_string())
            }
            Self::XpThreshold { min_xp } if !(min_xp.is_finite() && min_xp > 0.0) => {
                Some(format!("min_xp 必须为正数: {}", min_xp))
            }
            Self::FiveStarStreak { length } if length == 0 => {
                Some("length 必须大于 0".to_string())
            }
            Self::HighAverage {
                min_average,
                min_count,
            } => {
                if !(1.0..=5.0).contains(&min_average) {
                    Some(format!("min_average 必须在 [1, 5] 之间: {}", min_average))
                } else if min_count == 0 {
                    Some("min_count 必须大于 0".to_string())
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// 成就配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementConfig {
    pub id: i64,
    pub title: String,
    /// 解锁奖励 XP
    pub xp_reward: i32,
    pub active: bool,
    pub rule: AchievementRule,
}

impl AchievementConfig {
    /// 校验配置，不合法时返回 InvalidRule
    pub fn validate(&self) -> Result<()> {
        if self.xp_reward < 0 {
            return Err(EngineError::InvalidRule {
                achievement_id: self.id,
                reason: format!("xp_reward 不能为负数: {}", self.xp_reward),
            });
        }
        match self.rule.validate() {
            Some(reason) => Err(EngineError::InvalidRule {
                achievement_id: self.id,
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// 成就配置数据库行
///
/// 规则以 rule_kind + rule_params(jsonb) 两列存储
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AchievementRow {
    pub id: i64,
    pub title: String,
    pub xp_reward: i32,
    pub active: bool,
    pub rule_kind: String,
    pub rule_params: serde_json::Value,
}

impl TryFrom<AchievementRow> for AchievementConfig {
    type Error = EngineError;

    fn try_from(row: AchievementRow) -> Result<Self> {
        let tagged = serde_json::json!({
            "kind": row.rule_kind,
            "params": row.rule_params,
        });
        let rule = serde_json::from_value(tagged).map_err(|e| EngineError::InvalidRule {
            achievement_id: row.id,
            reason: e.to_string(),
        })?;

        Ok(Self {
            id: row.id,
            title: row.title,
            xp_reward: row.xp_reward,
            active: row.active,
            rule,
        })
    }
}
