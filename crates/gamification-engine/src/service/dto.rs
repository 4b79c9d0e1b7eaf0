//! 服务层数据传输对象
//!
//! 解锁结果和进度视图，供调用方直接序列化返回

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::{UnlockRecord, XpLedgerEntry};

/// 单条解锁失败
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockFailure {
    /// 失败发生在具体成就上时有值；加载阶段的失败为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub achievement_id: Option<i64>,
    pub code: String,
    pub message: String,
}

impl UnlockFailure {
    pub fn new(achievement_id: Option<i64>, error: &EngineError) -> Self {
        Self {
            achievement_id,
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

/// 单个员工的解锁结果
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockResult {
    pub attendant_id: i64,
    pub season_id: i64,
    /// 本次新解锁的记录
    pub new_unlocks: Vec<UnlockRecord>,
    /// 本次获得的成就奖励 XP
    pub xp_awarded: i64,
    /// 逐条隔离的失败
    pub errors: Vec<UnlockFailure>,
}

impl UnlockResult {
    pub fn new(attendant_id: i64, season_id: i64) -> Self {
        Self {
            attendant_id,
            season_id,
            ..Default::default()
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn unlocked_count(&self) -> usize {
        self.new_unlocks.len()
    }
}

/// 批处理中失败的员工
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendantFailure {
    pub attendant_id: i64,
    pub errors: Vec<UnlockFailure>,
}

/// 批量解锁结果
///
/// 部分失败不会让整个批次失败，失败的员工列在 `failed` 中
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUnlockResult {
    pub season_id: i64,
    pub total_unlocked: usize,
    pub total_xp_awarded: i64,
    pub per_attendant: Vec<UnlockResult>,
    pub succeeded: Vec<i64>,
    pub failed: Vec<AttendantFailure>,
}

impl BatchUnlockResult {
    pub fn new(season_id: i64) -> Self {
        Self {
            season_id,
            ..Default::default()
        }
    }

    /// 归并单个员工的结果
    pub fn absorb(&mut self, result: UnlockResult) {
        self.total_unlocked += result.unlocked_count();
        self.total_xp_awarded += result.xp_awarded;
        if result.has_errors() {
            self.failed.push(AttendantFailure {
                attendant_id: result.attendant_id,
                errors: result.errors.clone(),
            });
        } else {
            self.succeeded.push(result.attendant_id);
        }
        self.per_attendant.push(result);
    }

    /// 合并另一个批次（分块执行时使用）
    pub fn merge(&mut self, other: BatchUnlockResult) {
        self.total_unlocked += other.total_unlocked;
        self.total_xp_awarded += other.total_xp_awarded;
        self.per_attendant.extend(other.per_attendant);
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }

    pub fn is_partial_failure(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// 一次评价的完整处理结果
///
/// 评价不在任何赛季内时不做成就判定，`unlocks` 为空
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationOutcome {
    pub ledger_entry: XpLedgerEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocks: Option<UnlockResult>,
}

/// 员工赛季进度
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendantProgress {
    pub attendant_id: i64,
    pub season_id: i64,
    pub evaluation_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    pub best_five_star_streak: u32,
    /// 评价与手工调整 XP（XP 阈值成就的口径）
    pub qualifying_xp: f64,
    /// 成就奖励 XP
    pub achievement_xp: f64,
    pub total_xp: f64,
    pub unlocked_achievement_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure() -> UnlockFailure {
        UnlockFailure::new(Some(3), &EngineError::Storage("down".to_string()))
    }

    #[test]
    fn test_failure_from_error() {
        let f = failure();
        assert_eq!(f.achievement_id, Some(3));
        assert_eq!(f.code, "PERSISTENCE_ERROR");
        assert!(f.message.contains("down"));
    }

    #[test]
    fn test_batch_absorb() {
        let mut batch = BatchUnlockResult::new(1);

        let mut ok = UnlockResult::new(10, 1);
        ok.xp_awarded = 50;
        ok.new_unlocks.push(UnlockRecord::new(10, 1, 1, 50, chrono::Utc::now()));
        batch.absorb(ok);

        let mut bad = UnlockResult::new(11, 1);
        bad.errors.push(failure());
        batch.absorb(bad);

        assert_eq!(batch.total_unlocked, 1);
        assert_eq!(batch.total_xp_awarded, 50);
        assert_eq!(batch.succeeded, vec![10]);
        assert_eq!(batch.failed.len(), 1);
        assert_eq!(batch.failed[0].attendant_id, 11);
        assert_eq!(batch.per_attendant.len(), 2);
        assert!(batch.is_partial_failure());
    }

    #[test]
    fn test_batch_serialization() {
        let batch = BatchUnlockResult::new(7);
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["seasonId"], 7);
        assert_eq!(json["totalUnlocked"], 0);
        assert!(json["failed"].as_array().unwrap().is_empty());
    }
}
