//! 评分换算
//!
//! 星级评分到基础分的映射表

mod score_table;

pub use score_table::{RatingScoreTable, MAX_RATING, MIN_RATING};
