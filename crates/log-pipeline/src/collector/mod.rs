//! 로그 수집 모듈 -- 서버 로그 파일에서 새로 추가된 라인을 수집합니다.
//!
//! - [`FileTailer`]: 파일 감시 (tail -F 방식, 로테이션/truncation 감지)
//!
//! # 아키텍처
//! 테일러는 블로킹 I/O로 동작하며 파이프라인 워커 스레드 안에서만 사용됩니다.
//! 읽은 라인은 [`LogLine`]으로 분류기에 전달된 뒤 버려집니다.

pub mod file;

pub use file::{FileTailer, TailerConfig};

use std::time::SystemTime;

/// 수집된 로그 라인
///
/// 도착 순서 자체가 타임스탬프 역할을 합니다. 분류기가 소비한 뒤 버려집니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// 개행 문자를 제거한 라인 텍스트
    pub text: String,
    /// 수집 소스 식별자 (예: "file:/mc-logs/logs/latest.log")
    pub source: String,
    /// 수집 시각
    pub received_at: SystemTime,
}

impl LogLine {
    /// 새 LogLine을 생성합니다.
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            received_at: SystemTime::now(),
        }
    }
}

/// 수집기 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorStatus {
    /// 실행 대기 중
    Idle,
    /// 로그 파일이 생길 때까지 대기 중
    WaitingForFile,
    /// 실행 중
    Running,
    /// 에러로 중단됨
    Error(String),
    /// 정상 종료됨
    Stopped,
}
