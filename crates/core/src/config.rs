//! 설정 관리 — minewatch.toml 파싱 및 런타임 설정
//!
//! [`MinewatchConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`MINEWATCH_LOG_PIPELINE_LOG_PATH=/srv/mc/logs/latest.log` 형식)
//! 3. 설정 파일 (`minewatch.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), minewatch_core::error::MinewatchError> {
//! use minewatch_core::config::MinewatchConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = MinewatchConfig::load("minewatch.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = MinewatchConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::{Component, Path};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, MinewatchError};

/// `log_pipeline.poll_interval_ms` 상한 (밀리초)
pub const MAX_POLL_INTERVAL_MS: u64 = 60_000;

/// `log_pipeline.channel_capacity` 상한
pub const MAX_CHANNEL_CAPACITY: usize = 1_000_000;

/// 파싱에 실패해 무시된 환경변수 오버라이드
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedOverride {
    /// 환경변수 이름
    pub env_key: String,
    /// 거부된 값
    pub value: String,
    /// 기대한 타입
    pub expected: &'static str,
}

impl std::fmt::Display for RejectedOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}={:?} is not a valid {}, ignoring",
            self.env_key, self.value, self.expected
        )
    }
}

/// Minewatch 통합 설정
///
/// `minewatch.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MinewatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 로그 파이프라인 설정
    #[serde(default)]
    pub log_pipeline: LogPipelineConfig,
    /// 알림 채널 설정
    #[serde(default)]
    pub notify: NotifyConfig,
    /// 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 메트릭 설정
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl MinewatchConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, MinewatchError> {
        let mut config = Self::from_file(path).await?;
        for rejected in config.apply_env_overrides() {
            warn!(
                env_key = %rejected.env_key,
                value = %rejected.value,
                expected = rejected.expected,
                "failed to parse env var, ignoring"
            );
        }
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, MinewatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MinewatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                MinewatchError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, MinewatchError> {
        toml::from_str(toml_str).map_err(|e| {
            MinewatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `MINEWATCH_{SECTION}_{FIELD}`
    ///
    /// 파싱할 수 없는 값은 적용하지 않고 반환합니다. 이 함수는 로그를 남기지 않으므로
    /// 호출자가 tracing 초기화 이후에 반환값을 보고해야 합니다.
    pub fn apply_env_overrides(&mut self) -> Vec<RejectedOverride> {
        let mut rejected = Vec::new();
        let r = &mut rejected;

        // General
        override_string(&mut self.general.log_level, "MINEWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "MINEWATCH_GENERAL_LOG_FORMAT");

        // Log Pipeline
        override_parsed(&mut self.log_pipeline.enabled, "MINEWATCH_LOG_PIPELINE_ENABLED", "bool", r);
        override_string(&mut self.log_pipeline.log_path, "MINEWATCH_LOG_PIPELINE_LOG_PATH");
        override_string(
            &mut self.log_pipeline.usercache_path,
            "MINEWATCH_LOG_PIPELINE_USERCACHE_PATH",
        );
        override_string(&mut self.log_pipeline.stats_dir, "MINEWATCH_LOG_PIPELINE_STATS_DIR");
        override_parsed(
            &mut self.log_pipeline.poll_interval_ms,
            "MINEWATCH_LOG_PIPELINE_POLL_INTERVAL_MS",
            "u64",
            r,
        );
        override_parsed(
            &mut self.log_pipeline.wait_backoff_secs,
            "MINEWATCH_LOG_PIPELINE_WAIT_BACKOFF_SECS",
            "u64",
            r,
        );
        override_parsed(
            &mut self.log_pipeline.max_line_length,
            "MINEWATCH_LOG_PIPELINE_MAX_LINE_LENGTH",
            "usize",
            r,
        );
        override_parsed(
            &mut self.log_pipeline.channel_capacity,
            "MINEWATCH_LOG_PIPELINE_CHANNEL_CAPACITY",
            "usize",
            r,
        );

        // Notify
        override_parsed(&mut self.notify.enabled, "MINEWATCH_NOTIFY_ENABLED", "bool", r);
        override_string(&mut self.notify.channel, "MINEWATCH_NOTIFY_CHANNEL");

        // Storage
        override_string(&mut self.storage.journal_path, "MINEWATCH_STORAGE_JOURNAL_PATH");

        // Metrics
        override_parsed(&mut self.metrics.enabled, "MINEWATCH_METRICS_ENABLED", "bool", r);
        override_string(&mut self.metrics.listen_addr, "MINEWATCH_METRICS_LISTEN_ADDR");
        override_parsed(&mut self.metrics.port, "MINEWATCH_METRICS_PORT", "u16", r);
        override_string(&mut self.metrics.endpoint, "MINEWATCH_METRICS_ENDPOINT");

        rejected
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), MinewatchError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", valid_levels.join(", ")),
            ));
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", valid_formats.join(", ")),
            ));
        }

        if self.log_pipeline.enabled {
            validate_path("log_pipeline.log_path", &self.log_pipeline.log_path)?;
            validate_path(
                "log_pipeline.usercache_path",
                &self.log_pipeline.usercache_path,
            )?;
            validate_path("log_pipeline.stats_dir", &self.log_pipeline.stats_dir)?;

            if self.log_pipeline.poll_interval_ms == 0
                || self.log_pipeline.poll_interval_ms > MAX_POLL_INTERVAL_MS
            {
                return Err(invalid(
                    "log_pipeline.poll_interval_ms",
                    format!("must be 1-{MAX_POLL_INTERVAL_MS}"),
                ));
            }
            if self.log_pipeline.wait_backoff_secs == 0 {
                return Err(invalid(
                    "log_pipeline.wait_backoff_secs",
                    "must be greater than 0",
                ));
            }
            if self.log_pipeline.channel_capacity == 0
                || self.log_pipeline.channel_capacity > MAX_CHANNEL_CAPACITY
            {
                return Err(invalid(
                    "log_pipeline.channel_capacity",
                    format!("must be 1-{MAX_CHANNEL_CAPACITY}"),
                ));
            }
            if self.log_pipeline.max_line_length == 0 {
                return Err(invalid(
                    "log_pipeline.max_line_length",
                    "must be greater than 0",
                ));
            }
        }

        if self.notify.enabled && self.notify.channel.trim().is_empty() {
            return Err(invalid(
                "notify.channel",
                "channel must not be empty when notify is enabled",
            ));
        }

        validate_path("storage.journal_path", &self.storage.journal_path)?;

        Ok(())
    }
}

// Default는 derive 매크로로 자동 생성 (각 필드가 Default를 구현하므로)

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 로그 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogPipelineConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 감시할 서버 로그 파일 경로
    pub log_path: String,
    /// 플레이어 이름→UUID 스냅샷 파일 (usercache.json)
    pub usercache_path: String,
    /// 플레이어별 통계 파일 디렉토리 (`<uuid>.json`)
    pub stats_dir: String,
    /// 빈 폴링 사이 대기 시간 (밀리초)
    pub poll_interval_ms: u64,
    /// 로그 파일이 없을 때 재확인 간격 (초)
    pub wait_backoff_secs: u64,
    /// 최대 라인 길이 (바이트)
    pub max_line_length: usize,
    /// 이벤트 전달 채널 용량
    pub channel_capacity: usize,
}

impl Default for LogPipelineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_path: "/mc-logs/logs/latest.log".to_owned(),
            usercache_path: "/mc-logs/usercache.json".to_owned(),
            stats_dir: "/mc-logs/world/stats".to_owned(),
            poll_interval_ms: 100,
            wait_backoff_secs: 5,
            max_line_length: 64 * 1024, // 64KB
            channel_capacity: 1024,
        }
    }
}

/// 알림 채널 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 메시지를 보낼 대상 채널 식별자
    pub channel: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: "minecraft-events".to_owned(),
        }
    }
}

/// 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// 통계 갱신 저널 파일 경로 (JSON lines)
    pub journal_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            journal_path: "/var/lib/minewatch/stats.jsonl".to_owned(),
        }
    }
}

/// 메트릭 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 리슨 주소
    pub listen_addr: String,
    /// 리슨 포트
    pub port: u16,
    /// 스크레이프 경로
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: "127.0.0.1".to_owned(),
            port: 9100,
            endpoint: "/metrics".to_owned(),
        }
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> MinewatchError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.into(),
    }
    .into()
}

/// 경로가 비어있지 않고 ".." 컴포넌트를 포함하지 않는지 검증합니다.
fn validate_path(field: &str, path_str: &str) -> Result<(), MinewatchError> {
    if path_str.is_empty() {
        return Err(invalid(field, "path must not be empty"));
    }
    if Path::new(path_str)
        .components()
        .any(|c| c == Component::ParentDir)
    {
        return Err(invalid(
            field,
            format!("path '{path_str}' contains path traversal pattern '..'"),
        ));
    }
    Ok(())
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_parsed<T: std::str::FromStr>(
    target: &mut T,
    env_key: &str,
    expected: &'static str,
    rejected: &mut Vec<RejectedOverride>,
) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => rejected.push(RejectedOverride {
                env_key: env_key.to_owned(),
                value: val,
                expected,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn default_config_has_sane_values() {
        let config = MinewatchConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert!(config.log_pipeline.enabled);
        assert_eq!(config.log_pipeline.log_path, "/mc-logs/logs/latest.log");
        assert_eq!(config.log_pipeline.poll_interval_ms, 100);
        assert_eq!(config.log_pipeline.wait_backoff_secs, 5);
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn default_config_passes_validation() {
        MinewatchConfig::default().validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = MinewatchConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.log_pipeline.stats_dir, "/mc-logs/world/stats");
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[log_pipeline]
log_path = "/srv/mc/logs/latest.log"
"#;
        let config = MinewatchConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        // log_format은 기본값 유지
        assert_eq!(config.general.log_format, "json");
        assert_eq!(config.log_pipeline.log_path, "/srv/mc/logs/latest.log");
        assert_eq!(config.log_pipeline.usercache_path, "/mc-logs/usercache.json");
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let err = MinewatchConfig::parse("invalid = [[[toml").unwrap_err();
        assert!(matches!(
            err,
            MinewatchError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = MinewatchConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_zero_poll_interval() {
        let mut config = MinewatchConfig::default();
        config.log_pipeline.poll_interval_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("poll_interval_ms"));
    }

    #[test]
    fn validate_rejects_path_traversal() {
        let mut config = MinewatchConfig::default();
        config.log_pipeline.stats_dir = "/mc-logs/../etc".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("stats_dir"));
    }

    #[test]
    fn validate_rejects_empty_channel_when_notify_enabled() {
        let mut config = MinewatchConfig::default();
        config.notify.channel = "  ".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("notify.channel"));

        // 비활성화 상태면 채널 검증을 건너뜀
        config.notify.enabled = false;
        config.validate().unwrap();
    }

    #[test]
    fn validate_skips_pipeline_fields_when_disabled() {
        let mut config = MinewatchConfig::default();
        config.log_pipeline.enabled = false;
        config.log_pipeline.log_path = String::new();
        config.validate().unwrap();
    }

    #[test]
    #[serial]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_MINEWATCH_STR", "overridden") };
        override_string(&mut val, "TEST_MINEWATCH_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_MINEWATCH_STR") };
    }

    #[test]
    #[serial]
    fn env_override_invalid_number_keeps_original() {
        let mut val = 100u64;
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_MINEWATCH_U64_BAD", "fast") };
        let mut rejected = Vec::new();
        override_parsed(&mut val, "TEST_MINEWATCH_U64_BAD", "u64", &mut rejected);
        assert_eq!(val, 100); // 원래 값 유지
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].env_key, "TEST_MINEWATCH_U64_BAD");
        assert_eq!(rejected[0].value, "fast");
        unsafe { std::env::remove_var("TEST_MINEWATCH_U64_BAD") };
    }

    #[test]
    #[serial]
    fn apply_env_overrides_updates_pipeline_section() {
        let mut config = MinewatchConfig::default();
        // SAFETY: serial 테스트로 실행되므로 환경변수 조작이 안전합니다.
        unsafe {
            std::env::set_var("MINEWATCH_LOG_PIPELINE_LOG_PATH", "/tmp/latest.log");
            std::env::set_var("MINEWATCH_LOG_PIPELINE_POLL_INTERVAL_MS", "250");
        }
        unsafe {
            std::env::set_var("MINEWATCH_LOG_PIPELINE_MAX_LINE_LENGTH", "4096");
            std::env::set_var("MINEWATCH_METRICS_ENDPOINT", "/stats");
        }
        let rejected = config.apply_env_overrides();
        unsafe {
            std::env::remove_var("MINEWATCH_LOG_PIPELINE_LOG_PATH");
            std::env::remove_var("MINEWATCH_LOG_PIPELINE_POLL_INTERVAL_MS");
            std::env::remove_var("MINEWATCH_LOG_PIPELINE_MAX_LINE_LENGTH");
            std::env::remove_var("MINEWATCH_METRICS_ENDPOINT");
        }
        assert!(rejected.is_empty());
        assert_eq!(config.log_pipeline.log_path, "/tmp/latest.log");
        assert_eq!(config.log_pipeline.poll_interval_ms, 250);
        assert_eq!(config.log_pipeline.max_line_length, 4096);
        assert_eq!(config.metrics.endpoint, "/stats");
    }

    #[test]
    fn validate_rejects_poll_interval_above_pipeline_limit() {
        let mut config = MinewatchConfig::default();
        config.log_pipeline.poll_interval_ms = MAX_POLL_INTERVAL_MS + 1;
        assert!(config.validate().is_err());

        config.log_pipeline.poll_interval_ms = MAX_POLL_INTERVAL_MS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = MinewatchConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = MinewatchConfig::parse(&toml_str).unwrap();
        assert_eq!(config.log_pipeline.log_path, parsed.log_pipeline.log_path);
        assert_eq!(config.notify.channel, parsed.notify.channel);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let err = MinewatchConfig::from_file("/nonexistent/path/minewatch.toml")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MinewatchError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
