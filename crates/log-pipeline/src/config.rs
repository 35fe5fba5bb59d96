//! 로그 파이프라인 설정
//!
//! [`PipelineConfig`]는 core의 [`LogPipelineConfig`](minewatch_core::config::LogPipelineConfig)를
//! 기반으로 로그 파이프라인 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use minewatch_core::config::MinewatchConfig;
//! use minewatch_log_pipeline::config::PipelineConfig;
//!
//! let core_config = MinewatchConfig::default();
//! let config = PipelineConfig::from_core(&core_config.log_pipeline);
//! ```

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use minewatch_core::config::{MAX_CHANNEL_CAPACITY, MAX_POLL_INTERVAL_MS};
use serde::{Deserialize, Serialize};

use crate::collector::file::TailerConfig;
use crate::error::LogPipelineError;

/// 로그 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// 감시할 서버 로그 파일 경로
    pub log_path: PathBuf,
    /// 플레이어 디렉토리 스냅샷 (usercache.json)
    pub usercache_path: PathBuf,
    /// 플레이어별 통계 파일 디렉토리
    pub stats_dir: PathBuf,
    /// 빈 폴링 사이 대기 시간 (밀리초)
    pub poll_interval_ms: u64,
    /// 로그 파일이 없을 때 재확인 간격 (초)
    pub wait_backoff_secs: u64,
    /// 최대 라인 길이 (바이트)
    pub max_line_length: usize,
    /// 이벤트 전달 채널 용량
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            log_path: PathBuf::from("/mc-logs/logs/latest.log"),
            usercache_path: PathBuf::from("/mc-logs/usercache.json"),
            stats_dir: PathBuf::from("/mc-logs/world/stats"),
            poll_interval_ms: 100,
            wait_backoff_secs: 5,
            max_line_length: 64 * 1024,
            channel_capacity: 1024,
        }
    }
}

impl PipelineConfig {
    /// core의 `LogPipelineConfig`에서 파이프라인 설정을 생성합니다.
    pub fn from_core(core: &minewatch_core::config::LogPipelineConfig) -> Self {
        Self {
            log_path: PathBuf::from(&core.log_path),
            usercache_path: PathBuf::from(&core.usercache_path),
            stats_dir: PathBuf::from(&core.stats_dir),
            poll_interval_ms: core.poll_interval_ms,
            wait_backoff_secs: core.wait_backoff_secs,
            max_line_length: core.max_line_length,
            channel_capacity: core.channel_capacity,
        }
    }

    /// 테일러 설정을 생성합니다.
    pub fn tailer_config(&self) -> TailerConfig {
        TailerConfig {
            path: self.log_path.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            wait_backoff: Duration::from_secs(self.wait_backoff_secs),
            max_line_length: self.max_line_length,
        }
    }

    /// 경로가 안전한지 검증합니다 (path traversal 방지).
    fn validate_path(field: &str, path: &Path) -> Result<(), LogPipelineError> {
        if path.as_os_str().is_empty() {
            return Err(LogPipelineError::Config {
                field: field.to_owned(),
                reason: "path must not be empty".to_owned(),
            });
        }

        if path.components().any(|c| c == Component::ParentDir) {
            return Err(LogPipelineError::Config {
                field: field.to_owned(),
                reason: format!(
                    "path '{}' contains path traversal pattern '..'",
                    path.display()
                ),
            });
        }

        Ok(())
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogPipelineError> {
        Self::validate_path("log_path", &self.log_path)?;
        Self::validate_path("usercache_path", &self.usercache_path)?;
        Self::validate_path("stats_dir", &self.stats_dir)?;

        if self.poll_interval_ms == 0 || self.poll_interval_ms > MAX_POLL_INTERVAL_MS {
            return Err(LogPipelineError::Config {
                field: "poll_interval_ms".to_owned(),
                reason: format!("must be 1-{MAX_POLL_INTERVAL_MS}"),
            });
        }

        if self.wait_backoff_secs == 0 {
            return Err(LogPipelineError::Config {
                field: "wait_backoff_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.max_line_length == 0 {
            return Err(LogPipelineError::Config {
                field: "max_line_length".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.channel_capacity == 0 || self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(LogPipelineError::Config {
                field: "channel_capacity".to_owned(),
                reason: format!("must be 1-{MAX_CHANNEL_CAPACITY}"),
            });
        }

        Ok(())
    }
}

/// 파이프라인 설정 빌더
#[derive(Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 로그 파일 경로를 설정합니다.
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.log_path = path.into();
        self
    }

    /// usercache 경로를 설정합니다.
    pub fn usercache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.usercache_path = path.into();
        self
    }

    /// 통계 디렉토리를 설정합니다.
    pub fn stats_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.stats_dir = dir.into();
        self
    }

    /// 폴링 간격(밀리초)을 설정합니다.
    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms;
        self
    }

    /// 파일 대기 간격(초)을 설정합니다.
    pub fn wait_backoff_secs(mut self, secs: u64) -> Self {
        self.config.wait_backoff_secs = secs;
        self
    }

    /// 채널 용량을 설정합니다.
    pub fn channel_capacity(mut self, capacity: usize) -> Self {
        self.config.channel_capacity = capacity;
        self
    }

    /// 설정을 검증하고 `PipelineConfig`를 생성합니다.
    pub fn build(self) -> Result<PipelineConfig, LogPipelineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
