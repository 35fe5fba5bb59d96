//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 로그 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<LogPipelineError> for MinewatchError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use minewatch_core::error::{MinewatchError, PipelineError};

/// 로그 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 로그 파일 열기 실패 (존재 확인 후에도 열 수 없음, 치명적)
    #[error("tailer error: {path}: {reason}")]
    Tailer {
        /// 로그 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 플레이어 디렉토리(usercache) 로딩 실패
    #[error("directory error: {path}: {reason}")]
    Directory {
        /// 스냅샷 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 통계 스냅샷 읽기 실패
    #[error("stats error: {path}: {reason}")]
    Stats {
        /// 통계 파일 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// 정지 신호로 작업이 중단됨
    #[error("cancelled")]
    Cancelled,

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<LogPipelineError> for MinewatchError {
    fn from(err: LogPipelineError) -> Self {
        MinewatchError::Pipeline(PipelineError::InitFailed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tailer_error_display() {
        let err = LogPipelineError::Tailer {
            path: "/mc-logs/logs/latest.log".to_owned(),
            reason: "permission denied".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("latest.log"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn converts_to_minewatch_error() {
        let err = LogPipelineError::Channel("receiver closed".to_owned());
        let top: MinewatchError = err.into();
        assert!(matches!(top, MinewatchError::Pipeline(_)));
    }
}
