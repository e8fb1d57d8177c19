use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    // Backend (Supabase REST) Metrics
    pub static ref BACKEND_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "backend_operations_total",
        "Total number of backend operations",
        &["operation", "status"]
    )
    .unwrap();

    pub static ref BACKEND_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "backend_operation_duration_seconds",
        "Backend operation duration in seconds",
        &["operation"],
        vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Business Metrics
    pub static ref TASK_SESSIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "task_sessions_total",
        "Task session transitions",
        &["status"]
    )
    .unwrap();

    pub static ref ANSWERS_EVALUATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_evaluated_total",
        "Total number of answers evaluated",
        &["question_type", "result"]
    )
    .unwrap();

    pub static ref STREAK_UPDATES_TOTAL: IntCounterVec = register_int_counter_vec!(
        "streak_updates_total",
        "Streak calculator updates by outcome",
        &["outcome"]
    )
    .unwrap();

    pub static ref POINTS_AWARDED_TOTAL: IntCounter = register_int_counter!(
        "points_awarded_total",
        "Points (and equal XP) awarded for tasks and daily rewards"
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track a backend call with metrics
pub async fn track_backend_operation<F, T>(operation: &str, future: F) -> Result<T, anyhow::Error>
where
    F: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    BACKEND_OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();

    BACKEND_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration);

    result
}
