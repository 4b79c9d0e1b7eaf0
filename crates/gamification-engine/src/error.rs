//! 积分引擎错误类型
//!
//! 定义评分、赛季、成就解锁和持久化相关的错误

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// 积分引擎错误类型
#[derive(Debug, Error)]
pub enum EngineError {
    // === 评分相关错误 ===
    #[error("评分超出范围 [1, 5]: {0}")]
    InvalidRating(i32),

    #[error("评分表配置无效: {0}")]
    InvalidScoreTable(String),

    // === 赛季相关错误 ===
    #[error("赛季不存在: {0}")]
    UnknownSeason(i64),

    #[error("赛季未启用: {0}")]
    InactiveSeason(i64),

    #[error("该时间点没有进行中的赛季: {0}")]
    NoActiveSeason(DateTime<Utc>),

    #[error("赛季时间窗口重叠: season_id={first} 与 season_id={second}")]
    OverlappingSeasons { first: i64, second: i64 },

    #[error("赛季时间窗口无效: season_id={season_id}, {start} > {end}")]
    InvalidSeasonWindow {
        season_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    },

    // === 成就相关错误 ===
    #[error(
        "成就已解锁: attendant_id={attendant_id}, achievement_id={achievement_id}, season_id={season_id}"
    )]
    DuplicateUnlock {
        attendant_id: i64,
        achievement_id: i64,
        season_id: i64,
    },

    #[error("成就规则无效: achievement_id={achievement_id}, {reason}")]
    InvalidRule { achievement_id: i64, reason: String },

    // === 系统错误 ===
    #[error("持久化失败: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("存储不可用: {0}")]
    Storage(String),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 积分引擎 Result 类型别名
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// 唯一键冲突属于并发写入的正常结果，由编排器就地吸收
    pub fn is_duplicate_unlock(&self) -> bool {
        matches!(self, Self::DuplicateUnlock { .. })
    }

    /// 检查是否为存储层失败
    pub fn is_persistence_failure(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Storage(_))
    }

    /// 检查是否为可重试的错误
    ///
    /// 引擎本身不做重试，此标记供调用方决策。
    /// 只有连接池耗尽、网络抖动这类瞬时故障才值得重试，约束冲突和解码错误重试无用
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Persistence(e) => matches!(
                e,
                sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed
            ),
            Self::Storage(_) => true,
            _ => false,
        }
    }

    /// 检查是否为配置类错误（需要管理员介入）
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidScoreTable(_)
                | Self::OverlappingSeasons { .. }
                | Self::InvalidSeasonWindow { .. }
                | Self::InvalidRule { .. }
        )
    }

    /// 获取错误码（用于结构化结果和日志）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRating(_) => "INVALID_RATING",
            Self::InvalidScoreTable(_) => "INVALID_SCORE_TABLE",
            Self::UnknownSeason(_) => "UNKNOWN_SEASON",
            Self::InactiveSeason(_) => "INACTIVE_SEASON",
            Self::NoActiveSeason(_) => "NO_ACTIVE_SEASON",
            Self::OverlappingSeasons { .. } => "OVERLAPPING_SEASONS",
            Self::InvalidSeasonWindow { .. } => "INVALID_SEASON_WINDOW",
            Self::DuplicateUnlock { .. } => "DUPLICATE_UNLOCK",
            Self::InvalidRule { .. } => "INVALID_RULE",
            Self::Persistence(_) | Self::Storage(_) => "PERSISTENCE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_unlock_is_not_a_failure() {
        let err = EngineError::DuplicateUnlock {
            attendant_id: 1,
            achievement_id: 2,
            season_id: 3,
        };
        assert!(err.is_duplicate_unlock());
        assert!(!err.is_persistence_failure());
        assert!(!err.is_retryable());
        assert_eq!(err.error_code(), "DUPLICATE_UNLOCK");
    }

    #[test]
    fn test_persistence_errors() {
        let err = EngineError::Persistence(sqlx::Error::PoolTimedOut);
        assert!(err.is_persistence_failure());
        assert!(err.is_retryable());
        assert_eq!(err.error_code(), "PERSISTENCE_ERROR");

        let err = EngineError::Storage("disk full".to_string());
        assert!(err.is_persistence_failure());
        assert_eq!(err.error_code(), "PERSISTENCE_ERROR");
    }

    #[test]
    fn test_only_transient_sqlx_errors_are_retryable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(EngineError::Persistence(sqlx::Error::Io(io)).is_retryable());
        assert!(EngineError::Persistence(sqlx::Error::PoolClosed).is_retryable());

        // 约束冲突、解码失败、配置错误重试也不会成功
        assert!(!EngineError::Persistence(sqlx::Error::RowNotFound).is_retryable());
        assert!(!EngineError::Persistence(sqlx::Error::Decode("bad jsonb".into())).is_retryable());
        assert!(
            !EngineError::Persistence(sqlx::Error::Configuration("bad url".into())).is_retryable()
        );
        assert!(!EngineError::Persistence(sqlx::Error::Protocol("unexpected".to_string())).is_retryable());
    }

    #[test]
    fn test_configuration_errors() {
        assert!(EngineError::OverlappingSeasons { first: 1, second: 2 }.is_configuration_error());
        assert!(
            EngineError::InvalidRule {
                achievement_id: 1,
                reason: "min_count 必须大于 0".to_string()
            }
            .is_configuration_error()
        );
        assert!(!EngineError::InvalidRating(6).is_configuration_error());
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::InvalidRating(7);
        assert!(err.to_string().contains('7'));

        let err = EngineError::DuplicateUnlock {
            attendant_id: 11,
            achievement_id: 22,
            season_id: 33,
        };
        let msg = err.to_string();
        assert!(msg.contains("11") && msg.contains("22") && msg.contains("33"));
    }
}
