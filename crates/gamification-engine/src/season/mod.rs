//! 赛季解析
//!
//! 按时间点定位所属赛季，并校验启用赛季的时间窗口互不重叠

mod resolver;

pub use resolver::{SeasonResolver, find_overlaps, pick_season};
