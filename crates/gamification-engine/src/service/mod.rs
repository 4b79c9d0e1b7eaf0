//! 服务层
//!
//! 实现积分业务逻辑，协调仓储层。
//!
//! ## 模块结构
//!
//! - `dto`: 数据传输对象定义
//! - `accrual_service`: 评价 XP 入账
//! - `unlock_service`: 成就解锁编排（单个员工 / 批量）
//! - `progress_service`: 员工赛季进度查询（只读）

pub mod accrual_service;
pub mod dto;
pub mod progress_service;
pub mod unlock_service;

pub use accrual_service::XpAccrualService;
pub use dto::*;
pub use progress_service::ProgressService;
pub use unlock_service::UnlockOrchestrator;
