//! 파이프라인 오케스트레이션 -- 테일링/분류/보강/스트릭/전달의 전체 흐름을 관리합니다.
//!
//! [`LogPipeline`]은 core의 [`Pipeline`](minewatch_core::pipeline::Pipeline) trait을 구현하여
//! `minewatch-daemon`에서 생명주기(start/stop/health_check)를 관리합니다.
//!
//! # 내부 아키텍처
//! ```text
//! [minewatch-tailer 스레드]                              [async 런타임]
//! FileTailer -> EventProcessor -> blocking_send --mpsc--> EventDispatcher -> StatStore / Notifier
//! ```
//!
//! 워커 스레드는 테일러와 모든 파생 상태를 소유하고 라인 도착 순서대로 처리합니다.
//! `blocking_send`는 채널 여유 공간만 기다리며 협력자의 처리 완료는 기다리지 않습니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use minewatch_core::PlayerEvent;
use minewatch_core::error::{MinewatchError, PipelineError};
use minewatch_core::pipeline::{HealthStatus, Pipeline};

use crate::collector::FileTailer;
use crate::config::PipelineConfig;
use crate::error::LogPipelineError;
use crate::processor::EventProcessor;

/// 워커 스레드 이름
const WORKER_THREAD_NAME: &str = "minewatch-tailer";

/// 채널 사용률이 이 값을 넘으면 Degraded
const DEGRADED_QUEUE_UTILIZATION: f64 = 0.9;

/// 파이프라인 실행 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum PipelineState {
    /// 초기화됨, 아직 시작하지 않음
    Initialized,
    /// 실행 중
    Running,
    /// 정지됨
    Stopped,
}

/// 로그 파이프라인
///
/// # 사용 예시
/// ```ignore
/// use minewatch_log_pipeline::{LogPipeline, LogPipelineBuilder};
///
/// let (mut pipeline, event_rx) = LogPipelineBuilder::new()
///     .config(config)
///     .build()?;
///
/// pipeline.start().await?;
/// ```
pub struct LogPipeline {
    /// 파이프라인 설정
    config: PipelineConfig,
    /// 현재 상태
    state: PipelineState,
    /// 이벤트 전송 채널 (워커 -> 디스패처)
    event_tx: mpsc::Sender<PlayerEvent>,
    /// 워커 정지 토큰 (start마다 새로 생성)
    cancel: CancellationToken,
    /// 워커 스레드 핸들
    worker: Option<JoinHandle<Result<(), LogPipelineError>>>,
    /// 전달된 이벤트 카운터
    processed: Arc<AtomicU64>,
}

impl LogPipeline {
    /// 현재 상태를 반환합니다.
    pub fn state_name(&self) -> &str {
        match self.state {
            PipelineState::Initialized => "initialized",
            PipelineState::Running => "running",
            PipelineState::Stopped => "stopped",
        }
    }

    /// 채널로 전달된 이벤트 수를 반환합니다.
    pub fn processed_count(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// 파이프라인 설정
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 실행 중에 워커 스레드가 스스로 종료했는지 확인합니다.
    ///
    /// 로그 파일을 열 수 없는 치명적 에러 후에 true가 됩니다.
    /// 워커는 재시작하지 않으므로 호출자가 프로세스를 종료해야 합니다.
    pub fn worker_exited(&self) -> bool {
        self.state == PipelineState::Running
            && self.worker.as_ref().is_none_or(|h| h.is_finished())
    }

    /// 이벤트 채널 사용률 (0.0 ~ 1.0)
    pub fn queue_utilization(&self) -> f64 {
        let max = self.event_tx.max_capacity();
        if max == 0 {
            return 0.0;
        }
        let used = max.saturating_sub(self.event_tx.capacity());
        used as f64 / max as f64
    }
}

impl Pipeline for LogPipeline {
    async fn start(&mut self) -> Result<(), MinewatchError> {
        if self.state == PipelineState::Running {
            return Err(PipelineError::AlreadyRunning.into());
        }

        tracing::info!(
            log_path = %self.config.log_path.display(),
            usercache_path = %self.config.usercache_path.display(),
            stats_dir = %self.config.stats_dir.display(),
            "starting log pipeline"
        );

        let processor = EventProcessor::from_config(&self.config)?;
        tracing::info!(
            known_players = processor.known_players().len(),
            "event processor ready"
        );

        self.cancel = CancellationToken::new();
        let tailer = FileTailer::new(self.config.tailer_config(), self.cancel.clone());
        let tx = self.event_tx.clone();
        let processed = Arc::clone(&self.processed);

        let handle = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_owned())
            .spawn(move || run_worker(tailer, processor, tx, processed))
            .map_err(|e| PipelineError::InitFailed(format!("failed to spawn tailer thread: {e}")))?;

        self.worker = Some(handle);
        self.state = PipelineState::Running;
        tracing::info!("log pipeline started");
        Ok(())
    }

    async fn stop(&mut self) -> Result<(), MinewatchError> {
        if self.state != PipelineState::Running {
            return Err(PipelineError::NotRunning.into());
        }

        tracing::info!("stopping log pipeline");
        self.cancel.cancel();

        if let Some(handle) = self.worker.take() {
            // 현재 라인의 전달이 끝날 때까지 런타임 밖에서 대기
            match tokio::task::spawn_blocking(move || handle.join()).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => tracing::warn!(error = %e, "tailer worker exited with error"),
                Ok(Err(_)) => tracing::error!("tailer worker panicked"),
                Err(e) => tracing::error!(error = %e, "failed to join tailer worker"),
            }
        }

        self.state = PipelineState::Stopped;
        tracing::info!(
            processed = self.processed_count(),
            "log pipeline stopped"
        );
        Ok(())
    }

    async fn health_check(&self) -> HealthStatus {
        match self.state {
            PipelineState::Running => {
                if self.worker_exited() {
                    return HealthStatus::Unhealthy("tailer worker exited".to_owned());
                }

                let utilization = self.queue_utilization();
                if utilization > DEGRADED_QUEUE_UTILIZATION {
                    HealthStatus::Degraded(format!(
                        "event queue utilization high: {:.1}%",
                        utilization * 100.0
                    ))
                } else {
                    HealthStatus::Healthy
                }
            }
            PipelineState::Initialized => HealthStatus::Unhealthy("not started".to_owned()),
            PipelineState::Stopped => HealthStatus::Unhealthy("stopped".to_owned()),
        }
    }
}

/// 워커 스레드 본체
///
/// 로그 파일을 연 뒤 라인마다 처리하고 결과를 순서대로 채널에 보냅니다.
/// 파일을 열 수 없는 치명적 에러는 한 번 로그로 남기고 종료합니다.
fn run_worker(
    mut tailer: FileTailer,
    mut processor: EventProcessor,
    tx: mpsc::Sender<PlayerEvent>,
    processed: Arc<AtomicU64>,
) -> Result<(), LogPipelineError> {
    match tailer.open() {
        Ok(()) => {}
        Err(LogPipelineError::Cancelled) => {
            tracing::info!("log pipeline stopped before log file appeared");
            return Ok(());
        }
        Err(e) => {
            tracing::error!(error = %e, "log tailer failed to open log file");
            return Err(e);
        }
    }

    for line in tailer.by_ref() {
        let Some(event) = processor.process_line(&line.text) else {
            continue;
        };

        tracing::trace!(event = %event, "publishing event");
        if tx.blocking_send(event).is_err() {
            tracing::warn!("event receiver closed, stopping tailer");
            return Err(LogPipelineError::Channel("event receiver closed".to_owned()));
        }
        processed.fetch_add(1, Ordering::Relaxed);
    }

    tracing::info!("log tailer stopped");
    Ok(())
}

/// 로그 파이프라인 빌더
///
/// 파이프라인을 구성하고 필요한 채널을 생성합니다.
pub struct LogPipelineBuilder {
    config: PipelineConfig,
    event_tx: Option<mpsc::Sender<PlayerEvent>>,
}

impl LogPipelineBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            event_tx: None,
        }
    }

    /// 파이프라인 설정을 지정합니다.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// 외부 이벤트 전송 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 `channel_capacity` 크기의 새 채널을 생성합니다.
    pub fn event_sender(mut self, tx: mpsc::Sender<PlayerEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// 파이프라인을 빌드합니다.
    ///
    /// # Returns
    /// - `LogPipeline`: 파이프라인 인스턴스
    /// - `Option<mpsc::Receiver<PlayerEvent>>`: 이벤트 수신 채널
    ///   (외부 event_sender를 설정한 경우 None)
    pub fn build(
        self,
    ) -> Result<(LogPipeline, Option<mpsc::Receiver<PlayerEvent>>), LogPipelineError> {
        self.config.validate()?;

        let (event_tx, event_rx) = if let Some(tx) = self.event_tx {
            (tx, None)
        } else {
            let (tx, rx) = mpsc::channel(self.config.channel_capacity);
            (tx, Some(rx))
        };

        let pipeline = LogPipeline {
            config: self.config,
            state: PipelineState::Initialized,
            event_tx,
            cancel: CancellationToken::new(),
            worker: None,
            processed: Arc::new(AtomicU64::new(0)),
        };

        Ok((pipeline, event_rx))
    }
}

impl Default for LogPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
