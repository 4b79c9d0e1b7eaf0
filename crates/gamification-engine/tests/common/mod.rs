//! 集成测试共用的数据准备

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use gamification::{
    AchievementConfig, AchievementRule, Attendant, AttendantStatus, EngineSettings, Evaluation,
    GamificationEngine, MemoryRecordStore, Season,
};

pub type MemoryEngine = GamificationEngine<MemoryRecordStore, MemoryRecordStore>;

pub const SPRING: i64 = 1;
pub const SUMMER: i64 = 2;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn season(id: i64, start: NaiveDate, end: NaiveDate, xp_multiplier: f64) -> Season {
    Season {
        id,
        name: format!("Season {}", id),
        start_date: start,
        end_date: end,
        xp_multiplier,
        active: true,
    }
}

pub fn achievement(id: i64, xp_reward: i32, rule: AchievementRule) -> AchievementConfig {
    AchievementConfig {
        id,
        title: format!("Achievement {}", id),
        xp_reward,
        active: true,
        rule,
    }
}

/// 两个相邻赛季：春季（倍率 1.5）和夏季（倍率 1.0）
pub fn seeded_store(attendants: &[i64]) -> Arc<MemoryRecordStore> {
    let store = Arc::new(MemoryRecordStore::new());
    store.insert_season(season(SPRING, date(2026, 3, 1), date(2026, 5, 31), 1.5));
    store.insert_season(season(SUMMER, date(2026, 6, 1), date(2026, 8, 31), 1.0));
    for &id in attendants {
        store.insert_attendant(Attendant {
            id,
            name: format!("attendant-{}", id),
            status: AttendantStatus::Active,
        });
    }
    store
}

pub fn engine(store: &Arc<MemoryRecordStore>, global_multiplier: f64) -> MemoryEngine {
    let settings = EngineSettings {
        global_multiplier,
        ..Default::default()
    };
    GamificationEngine::new(store.clone(), store.clone(), settings)
}

/// 未落库的评价，id 由存储分配
pub fn evaluation(attendant_id: i64, rating: i32, occurred_at: DateTime<Utc>) -> Evaluation {
    Evaluation {
        id: 0,
        attendant_id,
        rating,
        comment: None,
        occurred_at,
        base_points: 0,
        final_points: 0.0,
    }
}

/// 写入一条评价并入账 XP
pub async fn rate(
    store: &MemoryRecordStore,
    engine: &MemoryEngine,
    attendant_id: i64,
    rating: i32,
    occurred_at: DateTime<Utc>,
) -> Evaluation {
    let stored = store.insert_evaluation(evaluation(attendant_id, rating, occurred_at));
    engine
        .accrue_evaluation_xp(attendant_id, rating, occurred_at, stored.id)
        .await
        .unwrap();
    stored
}

/// 按小时递增写入一串评价
pub async fn rate_many(
    store: &MemoryRecordStore,
    engine: &MemoryEngine,
    attendant_id: i64,
    ratings: &[i32],
    start: DateTime<Utc>,
) {
    for (i, &rating) in ratings.iter().enumerate() {
        let at = start + chrono::Duration::hours(i as i64);
        rate(store, engine, attendant_id, rating, at).await;
    }
}
