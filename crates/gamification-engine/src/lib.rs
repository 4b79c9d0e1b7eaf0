//! 员工积分引擎
//!
//! 为满意度评价系统提供 XP 累计、赛季竞赛和成就解锁能力。
//!
//! ## 核心功能
//!
//! - **评分换算**：星级评分按可配置的评分表换算为基础分
//! - **赛季解析**：按时间定位所属赛季，重叠的赛季窗口视为配置错误
//! - **XP 入账**：基础分 × 全局倍率 × 赛季倍率，写入只追加的 XP 流水
//! - **条件判定**：评价次数、XP 阈值、连续五星、高平均分四类规则
//! - **成就解锁**：逐个员工判定并原子写入解锁记录和奖励流水，同一赛季内每个成就至多解锁一次
//! - **批量处理**：员工之间相互隔离，部分失败以结构化结果返回
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `scoring`: 评分表
//! - `season`: 赛季解析
//! - `criteria`: 成就条件判定
//! - `repository`: 数据仓储层（PostgreSQL / 内存）
//! - `service`: 业务服务层
//! - `engine`: 对外门面

pub mod criteria;
pub mod engine;
pub mod error;
pub mod models;
pub mod repository;
pub mod scoring;
pub mod season;
pub mod service;

pub use criteria::{CriteriaEvaluator, EvaluationSnapshot};
pub use engine::{EngineSettings, GamificationEngine};
pub use error::{EngineError, Result};
pub use models::*;
pub use repository::{MemoryRecordStore, PgRecordStore, RecordSink, RecordSource};
pub use scoring::RatingScoreTable;
pub use season::SeasonResolver;
pub use service::{
    AttendantFailure, AttendantProgress, BatchUnlockResult, EvaluationOutcome, ProgressService,
    UnlockFailure, UnlockOrchestrator, UnlockResult, XpAccrualService,
};
