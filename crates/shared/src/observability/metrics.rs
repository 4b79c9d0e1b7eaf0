//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册积分引擎的业务指标描述
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("xp_accruals_total", "Total number of XP ledger appends");
    metrics::describe_counter!(
        "xp_points_awarded_total",
        "Sum of positive final XP points appended to the ledger"
    );
    metrics::describe_counter!(
        "xp_points_deducted_total",
        "Sum of negative final XP points appended to the ledger"
    );
    metrics::describe_counter!(
        "achievement_evaluations_total",
        "Total number of achievement criteria evaluations"
    );
    metrics::describe_counter!(
        "achievement_unlocks_total",
        "Total number of achievement unlock attempts by outcome"
    );
    metrics::describe_histogram!(
        "unlock_batch_duration_seconds",
        "Batch achievement processing duration in seconds"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

// ============================================================================
// 业务指标记录函数
// ============================================================================

/// 记录一次 XP 入账
#[inline]
pub fn record_xp_accrual(source: &str, seasonal: bool, final_points: f64) {
    let seasonal = if seasonal { "true" } else { "false" };
    metrics::counter!(
        "xp_accruals_total",
        "source" => source.to_string(),
        "seasonal" => seasonal
    )
    .increment(1);

    // counter 只能递增，扣分单独计数
    if final_points > 0.0 {
        metrics::counter!("xp_points_awarded_total", "source" => source.to_string())
            .increment(final_points.round() as u64);
    } else if final_points < 0.0 {
        metrics::counter!("xp_points_deducted_total", "source" => source.to_string())
            .increment((-final_points).round() as u64);
    }
}

/// 记录一次成就条件评估
#[inline]
pub fn record_achievement_evaluation(rule_kind: &str, eligible: bool) {
    metrics::counter!(
        "achievement_evaluations_total",
        "rule_kind" => rule_kind.to_string(),
        "eligible" => if eligible { "true" } else { "false" }
    )
    .increment(1);
}

/// 记录一次成就解锁尝试
///
/// outcome 取值：unlocked / duplicate / failed
#[inline]
pub fn record_achievement_unlock(outcome: &str) {
    metrics::counter!("achievement_unlocks_total", "outcome" => outcome.to_string()).increment(1);
}

/// 记录批处理耗时与结果
#[inline]
pub fn record_unlock_batch(attendants: usize, failed: usize, duration_secs: f64) {
    metrics::histogram!(
        "unlock_batch_duration_seconds",
        "status" => if failed == 0 { "ok" } else { "partial" }
    )
    .record(duration_secs);
    metrics::gauge!("unlock_batch_last_size").set(attendants as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_functions_without_recorder() {
        // 未安装 recorder 时所有调用都是空操作
        record_xp_accrual("evaluation", true, 15.0);
        record_xp_accrual("evaluation", false, -5.0);
        record_achievement_evaluation("five_star_streak", true);
        record_achievement_unlock("duplicate");
        record_unlock_batch(3, 1, 0.2);
    }
}
