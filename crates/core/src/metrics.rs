//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `minewatch_`
//! - 모듈명: `log_pipeline_`, `dispatcher_`, `daemon_`
//! - 접미어: `_total` (counter), `_seconds` (gauge/latency)
//!
//! # 사용 예시
//!
//! ```ignore
//! use minewatch_core::metrics as m;
//!
//! metrics::counter!(m::LOG_PIPELINE_LINES_READ_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 이벤트 종류 레이블 키 (login, logout, advancement, death)
pub const LABEL_KIND: &str = "kind";

/// 외부 협력자 레이블 키 (store, notifier)
pub const LABEL_SINK: &str = "sink";

// ─── Log Pipeline 메트릭 ────────────────────────────────────────────

/// Log Pipeline: 로그 파일에서 읽은 라인 수 (counter)
pub const LOG_PIPELINE_LINES_READ_TOTAL: &str = "minewatch_log_pipeline_lines_read_total";

/// Log Pipeline: 추출된 게임 이벤트 수 (counter, label: kind)
pub const LOG_PIPELINE_EVENTS_TOTAL: &str = "minewatch_log_pipeline_events_total";

/// Log Pipeline: 로테이션/truncation으로 파일을 다시 연 횟수 (counter)
pub const LOG_PIPELINE_ROTATIONS_TOTAL: &str = "minewatch_log_pipeline_rotations_total";

/// Log Pipeline: 통계 파일 읽기 실패 수 (counter)
pub const LOG_PIPELINE_STATS_READ_FAILURES_TOTAL: &str =
    "minewatch_log_pipeline_stats_read_failures_total";

/// Log Pipeline: 발생한 킬 스트릭 알림 수 (counter, label: kind)
pub const LOG_PIPELINE_STREAK_NOTICES_TOTAL: &str = "minewatch_log_pipeline_streak_notices_total";

// ─── Dispatcher 메트릭 ──────────────────────────────────────────────

/// Dispatcher: 외부 협력자에 전달 완료된 이벤트 수 (counter)
pub const DISPATCHER_EVENTS_DELIVERED_TOTAL: &str = "minewatch_dispatcher_events_delivered_total";

/// Dispatcher: 외부 협력자 호출 실패 수 (counter, label: sink)
pub const DISPATCHER_FAILURES_TOTAL: &str = "minewatch_dispatcher_failures_total";

// ─── Daemon 메트릭 ──────────────────────────────────────────────────

/// Daemon: 가동 시간 (gauge, 초)
pub const DAEMON_UPTIME_SECONDS: &str = "minewatch_daemon_uptime_seconds";

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    // Log Pipeline
    describe_counter!(
        LOG_PIPELINE_LINES_READ_TOTAL,
        "Total number of log lines read from the server log"
    );
    describe_counter!(
        LOG_PIPELINE_EVENTS_TOTAL,
        "Game events extracted from log lines, by kind"
    );
    describe_counter!(
        LOG_PIPELINE_ROTATIONS_TOTAL,
        "Number of times the log file was reopened after rotation or truncation"
    );
    describe_counter!(
        LOG_PIPELINE_STATS_READ_FAILURES_TOTAL,
        "Statistics snapshot reads that fell back to zero counts"
    );
    describe_counter!(
        LOG_PIPELINE_STREAK_NOTICES_TOTAL,
        "Kill-streak notices attached to death events, by kind"
    );

    // Dispatcher
    describe_counter!(
        DISPATCHER_EVENTS_DELIVERED_TOTAL,
        "Events handed to the store and notifier"
    );
    describe_counter!(
        DISPATCHER_FAILURES_TOTAL,
        "Failed calls to external collaborators, by sink"
    );

    // Daemon
    describe_gauge!(DAEMON_UPTIME_SECONDS, "Daemon uptime in seconds");
}
