//! test_utils 模块的集成测试
//!
//! 验证测试工具模块的功能正确性

use gamification_shared::test_utils::*;

#[test]
fn test_database_config_for_tests_uses_small_pool() {
    let config = test_database_config();
    assert_eq!(config.max_connections, 5);
    assert_eq!(config.min_connections, 1);
    assert!(config.url.starts_with("postgres://"));
}

#[test]
fn test_id_generation_is_unique_within_process() {
    let ids: Vec<i64> = (0..100).map(|_| test_id()).collect();
    let mut deduped = ids.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len());
}

#[test]
fn test_attendant_name_is_unique() {
    assert_ne!(test_attendant_name(), test_attendant_name());
    assert!(test_attendant_name().starts_with("test-attendant-"));
}

#[test]
fn test_utc_ordering() {
    assert!(utc(2026, 1, 1, 0) < utc(2026, 1, 1, 1));
    assert!(utc(2025, 12, 31, 23) < utc(2026, 1, 1, 0));
}
