//! 评分表
//!
//! 构造时校验 1 ~ 5 星全部有映射，之后查表不会因配置缺失失败

use gamification_shared::config::ScoringConfig;

use crate::error::{EngineError, Result};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

/// 星级评分 -> 基础分
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingScoreTable {
    points: [i32; 5],
}

impl Default for RatingScoreTable {
    fn default() -> Self {
        Self {
            points: [-5, -2, 1, 3, 5],
        }
    }
}

impl RatingScoreTable {
    pub fn new(points: [i32; 5]) -> Self {
        Self { points }
    }

    /// 从配置构建评分表
    ///
    /// 配置键为 "1" ~ "5"，缺少任一星级或出现未知键都视为配置错误
    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        let mut points = [0i32; 5];
        let mut seen = [false; 5];

        for (key, value) in &config.rating_points {
            let rating: i32 = key
                .trim()
                .parse()
                .map_err(|_| EngineError::InvalidScoreTable(format!("无法识别的评分键: {}", key)))?;
            if !(MIN_RATING..=MAX_RATING).contains(&rating) {
                return Err(EngineError::InvalidScoreTable(format!(
                    "评分键超出范围 [1, 5]: {}",
                    key
                )));
            }
            let idx = (rating - MIN_RATING) as usize;
            points[idx] = *value;
            seen[idx] = true;
        }

        let missing: Vec<String> = seen
            .iter()
            .enumerate()
            .filter(|(_, present)| !**present)
            .map(|(idx, _)| (idx as i32 + MIN_RATING).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(EngineError::InvalidScoreTable(format!(
                "缺少评分映射: {}",
                missing.join(", ")
            )));
        }

        Ok(Self { points })
    }

    /// 查询评分对应的基础分
    pub fn score(&self, rating: i32) -> Result<i32> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(EngineError::InvalidRating(rating));
        }
        Ok(self.points[(rating - MIN_RATING) as usize])
    }
}
