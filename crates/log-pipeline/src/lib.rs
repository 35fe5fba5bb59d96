#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`collector`]: 서버 로그 파일 테일링 (로테이션/truncation 감지)
//! - [`classifier`]: 로그 라인 → 접속/종료/발전과제/사망 분류 (원인 문구 테이블)
//! - [`disambiguator`]: "slain by" 사망의 PvP 여부 판별
//! - [`stats`]: 플레이어 디렉토리 및 통계 스냅샷 읽기
//! - [`streak`]: 킬 스트릭 상태 머신
//! - [`processor`]: 라인 하나 → 전달 단위 하나 변환
//! - [`pipeline`]: 워커 스레드 생명주기 (Pipeline trait 구현)
//! - [`dispatch`]: 저장소/알림 협력자로 전달
//! - [`notify`]: 알림 메시지 렌더링
//! - [`config`]: 파이프라인 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! FileTailer -> EventClassifier -> Disambiguator -> StatsReader -> KillStreakTracker
//!    |              (워커 스레드, 라인 도착 순서대로 동기 처리)
//!    v
//! mpsc (bounded) -> EventDispatcher -> StatStore / Notifier
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod processor;

pub mod classifier;
pub mod collector;
pub mod disambiguator;
pub mod dispatch;
pub mod notify;
pub mod stats;
pub mod streak;

// --- 주요 타입 re-export ---

// 파이프라인
pub use pipeline::{LogPipeline, LogPipelineBuilder};
pub use processor::EventProcessor;

// 설정
pub use config::{PipelineConfig, PipelineConfigBuilder};

// 에러
pub use error::LogPipelineError;

// 분류기
pub use classifier::{ClassifiedLine, EventClassifier};
pub use disambiguator::{KnownPlayers, PvpResolution};

// 수집기
pub use collector::{FileTailer, LogLine, TailerConfig};

// 통계
pub use stats::{PlayerDirectory, StatsReader};

// 킬 스트릭
pub use streak::KillStreakTracker;

// 전달
pub use dispatch::{EventDispatcher, stat_updates};
