//! 员工与评价实体定义
//!
//! 两者均由外部系统写入，引擎只读

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::AttendantStatus;

/// 员工（被评价的服务人员）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Attendant {
    pub id: i64,
    pub name: String,
    pub status: AttendantStatus,
}

impl Attendant {
    pub fn is_active(&self) -> bool {
        self.status == AttendantStatus::Active
    }
}

/// 满意度评价
///
/// 每次问卷回复生成一条，创建后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub id: i64,
    pub attendant_id: i64,
    /// 星级评分 1 ~ 5
    pub rating: i32,
    #[sqlx(default)]
    pub comment: Option<String>,
    pub occurred_at: DateTime<Utc>,
    /// 评分表换算的基础分
    pub base_points: i32,
    /// 叠加倍率后的最终分
    pub final_points: f64,
}

impl Evaluation {
    pub fn is_five_star(&self) -> bool {
        self.rating == 5
    }
}
