//! 积分引擎领域模型
//!
//! 包含员工、评价、赛季、成就配置、XP 流水和解锁记录

pub mod achievement;
pub mod attendant;
pub mod enums;
pub mod ledger;
pub mod season;

// 重新导出常用类型
pub use achievement::{AchievementConfig, AchievementRow, AchievementRule};
pub use attendant::{Attendant, Evaluation};
pub use enums::{AttendantStatus, RuleKind, XpSourceType};
pub use ledger::{UnlockKey, UnlockRecord, XpLedgerEntry};
pub use season::Season;
