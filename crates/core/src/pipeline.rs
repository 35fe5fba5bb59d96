//! 파이프라인 trait — 모듈 생명주기와 외부 협력자 인터페이스 정의
//!
//! - [`Pipeline`]: 데몬이 관리하는 모듈의 start/stop/health_check 생명주기
//! - [`StatStore`]: 플레이어 통계를 저장하는 영속 계층의 좁은 쓰기 API
//! - [`Notifier`]: 형식화된 메시지를 받는 알림 채널

use std::fmt;
use std::future::Future;

use crate::error::MinewatchError;
use crate::types::{Notification, StatUpdate};

/// 모듈 건강 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 동작하지만 성능 저하
    Degraded(String),
    /// 비정상
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 상태인지 확인합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 비정상 상태인지 확인합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded(reason) => write!(f, "degraded: {reason}"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
        }
    }
}

/// 모든 모듈이 구현하는 생명주기 trait
///
/// # 생명주기
/// ```text
/// Initialized → start() → Running → stop() → Stopped
/// ```
pub trait Pipeline: Send {
    /// 모듈을 시작합니다.
    fn start(&mut self) -> impl Future<Output = Result<(), MinewatchError>> + Send;

    /// 모듈을 정지합니다. 처리 중인 단위 작업은 완료한 뒤 반환합니다.
    fn stop(&mut self) -> impl Future<Output = Result<(), MinewatchError>> + Send;

    /// 모듈의 건강 상태를 확인합니다.
    fn health_check(&self) -> impl Future<Output = HealthStatus> + Send;
}

/// 플레이어 통계 저장소
///
/// 증가(increment), 절대값 설정(set), 타임스탬프 갱신(touch) 세 가지 쓰기만 받습니다.
/// 전달은 최소 1회(at-least-once)이므로 필요한 경우 저장소가 멱등성을 보장해야 합니다.
pub trait StatStore: Send + Sync {
    /// 단일 갱신을 적용합니다.
    fn apply(&self, update: &StatUpdate) -> impl Future<Output = Result<(), MinewatchError>> + Send;
}

/// 알림 채널
pub trait Notifier: Send + Sync {
    /// 형식화된 메시지를 전송합니다.
    fn send(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), MinewatchError>> + Send;
}
