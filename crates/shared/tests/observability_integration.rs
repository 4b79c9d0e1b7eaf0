//! 可观测性模块集成测试
//!
//! 验证指标记录函数在无 recorder 时可安全调用，以及配置反序列化的默认值。

mod metrics_tests {
    use gamification_shared::observability::metrics::{
        record_achievement_evaluation, record_achievement_unlock, record_unlock_batch,
        record_xp_accrual,
    };

    #[test]
    fn test_record_xp_accrual() {
        record_xp_accrual("evaluation", true, 15.0);
        record_xp_accrual("evaluation", false, 5.0);
        record_xp_accrual("achievement", true, 100.0);
        // 负分计入扣分计数
        record_xp_accrual("evaluation", true, -7.5);
    }

    #[test]
    fn test_record_achievement_metrics() {
        for kind in ["count_threshold", "xp_threshold", "five_star_streak", "high_average"] {
            record_achievement_evaluation(kind, true);
            record_achievement_evaluation(kind, false);
        }
        record_achievement_unlock("unlocked");
        record_achievement_unlock("duplicate");
        record_achievement_unlock("failed");
    }

    #[test]
    fn test_record_unlock_batch() {
        record_unlock_batch(0, 0, 0.0);
        record_unlock_batch(500, 3, 1.25);
    }
}

mod config_tests {
    use gamification_shared::config::AppConfig;
    use gamification_shared::observability::ObservabilityConfig;

    #[test]
    fn test_observability_defaults_through_app_config() {
        let config = AppConfig::default();
        let obs: ObservabilityConfig = config.observability;
        assert!(obs.metrics_enabled);
        assert_eq!(obs.metrics_port, 9090);
    }
}
