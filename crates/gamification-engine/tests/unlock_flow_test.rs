//! 积分与成就解锁流程集成测试
//!
//! 基于内存存储走完整的引擎流程，无需外部依赖

mod common;

use std::sync::Arc;

use chrono::{Days, Utc};

use common::*;
use gamification::{AchievementRule, EngineError, MemoryRecordStore, XpSourceType};
use gamification_shared::test_utils::utc;

// ==================== XP 入账 ====================

#[tokio::test]
async fn test_xp_composition_with_season_and_global_multiplier() {
    let store = seeded_store(&[1]);
    let engine = engine(&store, 2.0);

    // 春季倍率 1.5，全局倍率 2.0，五星基础分 5
    let entry = engine
        .accrue_evaluation_xp(1, 5, utc(2026, 4, 1, 10), 100)
        .await
        .unwrap();

    assert_eq!(entry.base_points, 5);
    assert_eq!(entry.multiplier, 3.0);
    assert_eq!(entry.final_points, 15.0);
    assert_eq!(entry.season_id, Some(SPRING));
    assert_eq!(entry.related_id, Some(100));
    assert_eq!(store.ledger_entries(1).len(), 1);
}

#[tokio::test]
async fn test_accrual_outside_any_season() {
    let store = seeded_store(&[1]);
    let engine = engine(&store, 1.0);

    let entry = engine
        .accrue_evaluation_xp(1, 1, utc(2026, 12, 1, 10), 1)
        .await
        .unwrap();
    assert_eq!(entry.final_points, -5.0);
    assert_eq!(entry.multiplier, 1.0);
    assert!(entry.season_id.is_none());
}

#[tokio::test]
async fn test_season_boundary_days_are_inclusive() {
    let store = seeded_store(&[1]);
    let engine = engine(&store, 1.0);

    let last_spring = engine
        .accrue_evaluation_xp(1, 5, utc(2026, 5, 31, 23), 1)
        .await
        .unwrap();
    let first_summer = engine
        .accrue_evaluation_xp(1, 5, utc(2026, 6, 1, 0), 2)
        .await
        .unwrap();

    assert_eq!(last_spring.season_id, Some(SPRING));
    assert_eq!(first_summer.season_id, Some(SUMMER));
}

#[tokio::test]
async fn test_invalid_rating_leaves_ledger_untouched() {
    let store = seeded_store(&[1]);
    let engine = engine(&store, 1.0);

    let err = engine
        .accrue_evaluation_xp(1, 6, utc(2026, 4, 1, 10), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRating(6)));
    assert!(store.ledger_entries(1).is_empty());
}

#[tokio::test]
async fn test_overlapping_seasons_block_accrual() {
    let store = seeded_store(&[1]);
    store.insert_season(season(3, date(2026, 5, 15), date(2026, 6, 15), 2.0));
    let engine = engine(&store, 1.0);

    let err = engine
        .accrue_evaluation_xp(1, 5, utc(2026, 5, 20, 10), 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::OverlappingSeasons { first: 1, second: 3 }
    ));
    assert!(store.ledger_entries(1).is_empty());

    let err = engine.validate_seasons().await.unwrap_err();
    assert!(err.is_configuration_error());
}

// ==================== 成就解锁 ====================

#[tokio::test]
async fn test_count_threshold_boundary() {
    let store = seeded_store(&[1]);
    store.insert_achievement(achievement(
        10,
        25,
        AchievementRule::CountThreshold { min_count: 10 },
    ));
    let engine = engine(&store, 1.0);

    rate_many(&store, &engine, 1, &[4; 9], utc(2026, 3, 2, 8)).await;
    let result = engine
        .process_attendant_achievements(1, Some(SPRING))
        .await
        .unwrap();
    assert!(result.new_unlocks.is_empty());

    rate(&store, &engine, 1, 4, utc(2026, 3, 3, 8)).await;
    let result = engine
        .process_attendant_achievements(1, Some(SPRING))
        .await
        .unwrap();
    assert_eq!(result.new_unlocks.len(), 1);
    assert_eq!(result.xp_awarded, 25);
}

#[tokio::test]
async fn test_repeated_processing_is_idempotent() {
    let store = seeded_store(&[1]);
    store.insert_achievement(achievement(
        10,
        50,
        AchievementRule::FiveStarStreak { length: 3 },
    ));
    let engine = engine(&store, 1.0);

    rate_many(&store, &engine, 1, &[5, 5, 4, 5, 5, 5, 3, 5, 5], utc(2026, 4, 1, 8)).await;

    let first = engine
        .process_attendant_achievements(1, Some(SPRING))
        .await
        .unwrap();
    assert_eq!(first.new_unlocks.len(), 1);

    for _ in 0..3 {
        let again = engine
            .process_attendant_achievements(1, Some(SPRING))
            .await
            .unwrap();
        assert!(again.new_unlocks.is_empty());
        assert_eq!(again.xp_awarded, 0);
        assert!(again.errors.is_empty());
    }

    let achievement_entries: Vec<_> = store
        .ledger_entries(1)
        .into_iter()
        .filter(|e| e.source_type == XpSourceType::Achievement)
        .collect();
    assert_eq!(achievement_entries.len(), 1);
    assert_eq!(store.unlock_records(1).len(), 1);

    // 奖励流水关联到解锁记录
    let unlock = &store.unlock_records(1)[0];
    assert_eq!(achievement_entries[0].related_id, Some(unlock.id));
    assert_eq!(achievement_entries[0].multiplier, 1.0);
    assert_eq!(achievement_entries[0].final_points, 50.0);
}

#[tokio::test]
async fn test_streak_must_reach_length() {
    let store = seeded_store(&[1]);
    store.insert_achievement(achievement(
        10,
        50,
        AchievementRule::FiveStarStreak { length: 4 },
    ));
    let engine = engine(&store, 1.0);

    rate_many(&store, &engine, 1, &[5, 5, 4, 5, 5, 5, 3, 5, 5], utc(2026, 4, 1, 8)).await;
    let result = engine
        .process_attendant_achievements(1, Some(SPRING))
        .await
        .unwrap();
    assert!(result.new_unlocks.is_empty());
}

#[tokio::test]
async fn test_achievement_xp_does_not_count_toward_xp_threshold() {
    let store = seeded_store(&[1]);
    store.insert_achievement(achievement(
        1,
        1000,
        AchievementRule::CountThreshold { min_count: 1 },
    ));
    store.insert_achievement(achievement(
        2,
        10,
        AchievementRule::XpThreshold { min_xp: 100.0 },
    ));
    let engine = engine(&store, 1.0);

    // 春季倍率 1.5：4 次五星 = 30 XP
    rate_many(&store, &engine, 1, &[5; 4], utc(2026, 4, 1, 8)).await;

    let first = engine
        .process_attendant_achievements(1, Some(SPRING))
        .await
        .unwrap();
    let ids: Vec<i64> = first.new_unlocks.iter().map(|u| u.achievement_id).collect();
    assert_eq!(ids, vec![1]);

    // 再处理一次，1000 XP 的成就奖励仍不计入
    let second = engine
        .process_attendant_achievements(1, Some(SPRING))
        .await
        .unwrap();
    assert!(second.new_unlocks.is_empty());
}

#[tokio::test]
async fn test_manual_adjustment_counts_toward_xp_threshold() {
    let store = seeded_store(&[1]);
    store.insert_achievement(achievement(
        2,
        10,
        AchievementRule::XpThreshold { min_xp: 100.0 },
    ));
    let engine = engine(&store, 1.0);

    rate_many(&store, &engine, 1, &[5; 4], utc(2026, 4, 1, 8)).await;
    engine
        .adjust_xp(1, 70, "季度活动补偿", utc(2026, 4, 2, 8))
        .await
        .unwrap();

    let result = engine
        .process_attendant_achievements(1, Some(SPRING))
        .await
        .unwrap();
    assert_eq!(result.new_unlocks.len(), 1);
}

#[tokio::test]
async fn test_unlocks_are_scoped_per_season() {
    let store = seeded_store(&[1]);
    store.insert_achievement(achievement(
        10,
        20,
        AchievementRule::CountThreshold { min_count: 2 },
    ));
    let engine = engine(&store, 1.0);

    rate_many(&store, &engine, 1, &[3, 3], utc(2026, 4, 1, 8)).await;
    let spring = engine
        .process_attendant_achievements(1, Some(SPRING))
        .await
        .unwrap();
    assert_eq!(spring.new_unlocks.len(), 1);

    // 春季的评价不计入夏季
    let summer = engine
        .process_attendant_achievements(1, Some(SUMMER))
        .await
        .unwrap();
    assert!(summer.new_unlocks.is_empty());

    rate_many(&store, &engine, 1, &[3, 3], utc(2026, 7, 1, 8)).await;
    let summer = engine
        .process_attendant_achievements(1, Some(SUMMER))
        .await
        .unwrap();
    assert_eq!(summer.new_unlocks.len(), 1);
    assert_eq!(store.unlock_records(1).len(), 2);
}

#[tokio::test]
async fn test_high_average_recomputed_each_call() {
    let store = seeded_store(&[1]);
    store.insert_achievement(achievement(
        10,
        30,
        AchievementRule::HighAverage {
            min_average: 4.5,
            min_count: 4,
        },
    ));
    let engine = engine(&store, 1.0);

    rate_many(&store, &engine, 1, &[5, 4, 4, 4], utc(2026, 4, 1, 8)).await;
    let result = engine
        .process_attendant_achievements(1, Some(SPRING))
        .await
        .unwrap();
    assert!(result.new_unlocks.is_empty());

    rate_many(&store, &engine, 1, &[5, 5, 5, 5], utc(2026, 4, 2, 8)).await;
    let result = engine
        .process_attendant_achievements(1, Some(SPRING))
        .await
        .unwrap();
    assert_eq!(result.new_unlocks.len(), 1);
}

#[tokio::test]
async fn test_inactive_achievement_is_ignored() {
    let store = seeded_store(&[1]);
    let mut config = achievement(10, 30, AchievementRule::CountThreshold { min_count: 1 });
    config.active = false;
    store.insert_achievement(config);
    let engine = engine(&store, 1.0);

    rate(&store, &engine, 1, 5, utc(2026, 4, 1, 8)).await;
    let result = engine
        .process_attendant_achievements(1, Some(SPRING))
        .await
        .unwrap();
    assert!(result.new_unlocks.is_empty());
}

#[tokio::test]
async fn test_record_evaluation_accrues_then_unlocks() {
    let store = seeded_store(&[1]);
    store.insert_achievement(achievement(
        10,
        15,
        AchievementRule::CountThreshold { min_count: 1 },
    ));
    let engine = engine(&store, 1.0);

    let at = utc(2026, 4, 1, 8);
    let in_season = store.insert_evaluation(evaluation(1, 4, at));
    let outcome = engine
        .record_evaluation(1, 4, at, in_season.id)
        .await
        .unwrap();
    assert_eq!(outcome.ledger_entry.final_points, 4.5);
    assert_eq!(outcome.ledger_entry.related_id, Some(in_season.id));
    let unlocks = outcome.unlocks.unwrap();
    assert_eq!(unlocks.season_id, SPRING);
    assert_eq!(unlocks.new_unlocks.len(), 1);
    assert!(unlocks.errors.is_empty());
    assert_eq!(store.ledger_entries(1).len(), 2);

    // 赛季外的评价只入账
    let at = utc(2026, 12, 1, 8);
    let off_season = store.insert_evaluation(evaluation(1, 4, at));
    let outcome = engine
        .record_evaluation(1, 4, at, off_season.id)
        .await
        .unwrap();
    assert!(outcome.unlocks.is_none());
    assert_eq!(store.ledger_entries(1).len(), 3);
}

// ==================== 赛季解析 ====================

#[tokio::test]
async fn test_unknown_season_id() {
    let store = seeded_store(&[1]);
    let engine = engine(&store, 1.0);

    let err = engine
        .process_attendant_achievements(1, Some(404))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownSeason(404)));

    let err = engine
        .process_batch_achievements(&[1], Some(404))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownSeason(404)));
}

#[tokio::test]
async fn test_inactive_season_id_is_rejected() {
    let store = seeded_store(&[1]);
    let mut archived = season(7, date(2025, 1, 1), date(2025, 3, 31), 2.0);
    archived.active = false;
    store.insert_season(archived);
    store.insert_achievement(achievement(
        10,
        30,
        AchievementRule::CountThreshold { min_count: 1 },
    ));
    let engine = engine(&store, 1.0);

    let err = engine
        .process_attendant_achievements(1, Some(7))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InactiveSeason(7)));

    let err = engine.attendant_progress(1, Some(7)).await.unwrap_err();
    assert_eq!(err.error_code(), "INACTIVE_SEASON");
    assert!(store.unlock_records(1).is_empty());
}

#[tokio::test]
async fn test_default_season_resolved_from_now() {
    // 没有任何赛季
    let empty = Arc::new(MemoryRecordStore::new());
    let err = engine(&empty, 1.0)
        .process_attendant_achievements(1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NoActiveSeason(_)));

    // 覆盖今天的赛季
    let today = Utc::now().date_naive();
    let current = Arc::new(MemoryRecordStore::new());
    current.insert_season(season(
        99,
        today.checked_sub_days(Days::new(1)).unwrap(),
        today.checked_add_days(Days::new(1)).unwrap(),
        1.0,
    ));
    let result = engine(&current, 1.0)
        .process_attendant_achievements(1, None)
        .await
        .unwrap();
    assert_eq!(result.season_id, 99);
}

// ==================== 批量处理 ====================

#[tokio::test]
async fn test_partial_batch_failure_is_isolated() {
    let store = seeded_store(&[1, 2, 3]);
    store.insert_achievement(achievement(
        10,
        20,
        AchievementRule::CountThreshold { min_count: 1 },
    ));
    let engine = engine(&store, 1.0);

    for attendant_id in [1, 2, 3] {
        rate(&store, &engine, attendant_id, 5, utc(2026, 4, 1, 8)).await;
    }
    store.fail_writes_for(2);

    let batch = engine
        .process_batch_achievements(&[1, 2, 3], Some(SPRING))
        .await
        .unwrap();

    assert_eq!(batch.succeeded, vec![1, 3]);
    assert_eq!(batch.failed.len(), 1);
    assert_eq!(batch.failed[0].attendant_id, 2);
    assert_eq!(batch.failed[0].errors[0].achievement_id, Some(10));
    assert_eq!(batch.total_unlocked, 2);
    assert_eq!(batch.total_xp_awarded, 40);
    assert!(batch.is_partial_failure());

    // 失败的员工没有留下任何解锁或奖励流水
    assert!(store.unlock_records(2).is_empty());
    assert!(
        store
            .ledger_entries(2)
            .iter()
            .all(|e| e.source_type != XpSourceType::Achievement)
    );

    // 故障恢复后重跑，只补上失败的员工
    store.clear_write_failures();
    let retry = engine
        .process_batch_achievements(&[1, 2, 3], Some(SPRING))
        .await
        .unwrap();
    assert_eq!(retry.total_unlocked, 1);
    assert_eq!(retry.per_attendant[1].attendant_id, 2);
    assert_eq!(retry.per_attendant[1].new_unlocks.len(), 1);
    assert!(!retry.is_partial_failure());
}

// ==================== 进度查询 ====================

#[tokio::test]
async fn test_attendant_progress() {
    let store = seeded_store(&[1]);
    store.insert_achievement(achievement(
        10,
        40,
        AchievementRule::FiveStarStreak { length: 2 },
    ));
    let engine = engine(&store, 1.0);

    rate_many(&store, &engine, 1, &[5, 5, 3, 5], utc(2026, 4, 1, 8)).await;
    engine
        .process_attendant_achievements(1, Some(SPRING))
        .await
        .unwrap();

    let progress = engine.attendant_progress(1, Some(SPRING)).await.unwrap();
    assert_eq!(progress.evaluation_count, 4);
    assert_eq!(progress.average_rating, Some(4.5));
    assert_eq!(progress.best_five_star_streak, 2);
    // (5 + 5 + 1 + 5) × 1.5
    assert_eq!(progress.qualifying_xp, 24.0);
    assert_eq!(progress.achievement_xp, 40.0);
    assert_eq!(progress.total_xp, 64.0);
    assert_eq!(progress.unlocked_achievement_ids, vec![10]);
}
