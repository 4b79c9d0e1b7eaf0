//! 成就条件判定
//!
//! - `snapshot`: 员工在某赛季内的评价和流水快照，提供各项统计
//! - `evaluator`: 规则分发，纯同步函数
//!
//! 判定只看快照，从不查询解锁表，相同输入总是得到相同结果

mod evaluator;
mod snapshot;

pub use evaluator::{CriteriaEvaluator, load_snapshot};
pub use snapshot::EvaluationSnapshot;
