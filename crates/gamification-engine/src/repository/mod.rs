//! 数据仓储层
//!
//! 提供引擎所需的读写接口及两种实现：
//!
//! - `PgRecordStore`: PostgreSQL 实现，生产环境使用
//! - `MemoryRecordStore`: 内存实现，用于测试和嵌入式场景
//!
//! 解锁唯一性由存储层保证，服务层不做额外加锁

mod memory_store;
mod pg_store;
mod traits;

pub use memory_store::MemoryRecordStore;
pub use pg_store::PgRecordStore;
pub use traits::*;
