//! 赛季实体定义

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// 赛季
///
/// 有起止日期和独立 XP 倍率的竞赛周期。起止日期均为闭区间，
/// 结束日当天的评价仍属于该赛季。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub id: i64,
    pub name: String,
    /// 开始日期（含）
    pub start_date: NaiveDate,
    /// 结束日期（含）
    pub end_date: NaiveDate,
    /// 赛季 XP 倍率
    pub xp_multiplier: f64,
    /// 是否启用
    pub active: bool,
}

impl Season {
    /// 判断时间点是否落在赛季窗口内
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        let date = at.date_naive();
        self.start_date <= date && date <= self.end_date
    }

    /// 赛季窗口的半开时间区间 [start, end)
    ///
    /// 用于按时间范围查询评价和流水，结束边界为结束日次日零点
    pub fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start_date.and_time(NaiveTime::MIN).and_utc();
        let end = self
            .end_date
            .checked_add_days(Days::new(1))
            .unwrap_or(NaiveDate::MAX)
            .and_time(NaiveTime::MIN)
            .and_utc();
        (start, end)
    }

    /// 两个赛季的日期窗口是否有交集
    pub fn overlaps(&self, other: &Season) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }

    /// 窗口是否合法（开始不晚于结束）
    pub fn is_well_formed(&self) -> bool {
        self.start_date <= self.end_date
    }
}
