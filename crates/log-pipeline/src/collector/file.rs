//! 파일 기반 로그 테일러
//!
//! 로그 파일 끝에서부터 새로 추가되는 라인을 무한히 읽습니다.
//! 블로킹 I/O 기반이므로 전용 스레드에서 실행해야 합니다.
//!
//! # 로테이션 감지
//! - 파일 식별자 변경 감지 (device + inode, Unix 전용)
//! - 파일 크기 축소 감지 (truncation)
//! - 감지 시 이전 핸들을 닫고 새 파일을 처음부터 읽음 (이전 오프셋은 버림)

use std::collections::VecDeque;
use std::fs::{File, Metadata};
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use minewatch_core::metrics as m;

use super::{CollectorStatus, LogLine};
use crate::error::LogPipelineError;

/// 테일러 설정
#[derive(Debug, Clone)]
pub struct TailerConfig {
    /// 감시할 파일 경로
    pub path: PathBuf,
    /// 빈 폴링 사이 대기 시간
    pub poll_interval: Duration,
    /// 파일이 없을 때 재확인 간격
    pub wait_backoff: Duration,
    /// 최대 라인 길이 (바이트), 초과분은 잘림
    pub max_line_length: usize,
}

impl Default for TailerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/mc-logs/logs/latest.log"),
            poll_interval: Duration::from_millis(100),
            wait_backoff: Duration::from_secs(5),
            max_line_length: 64 * 1024, // 64KB
        }
    }
}

/// 파일 식별자 (device + inode)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileIdentity {
    dev: u64,
    ino: u64,
}

impl FileIdentity {
    #[cfg(unix)]
    fn of(meta: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: meta.dev(),
            ino: meta.ino(),
        })
    }

    // 식별자를 얻을 수 없는 플랫폼에서는 truncation 감지만 동작합니다.
    #[cfg(not(unix))]
    fn of(_meta: &Metadata) -> Option<Self> {
        None
    }
}

/// 열린 파일의 추적 상태
///
/// 파일 식별자가 바뀔 때마다 새로 만들어지며 테일러 밖으로 노출되지 않습니다.
struct TailerCursor {
    reader: BufReader<File>,
    identity: Option<FileIdentity>,
    /// 지금까지 읽은 바이트 오프셋 (미완성 라인 포함)
    offset: u64,
    /// 아직 개행을 만나지 못한 라인 조각
    partial: Vec<u8>,
}

/// 파일 테일러
///
/// [`open`](Self::open)으로 파일 끝에 위치한 뒤, [`poll`](Self::poll)을 반복 호출하거나
/// `Iterator`로 사용하여 새 라인을 받습니다. 취소 토큰이 취소되면 반복이 끝납니다.
pub struct FileTailer {
    config: TailerConfig,
    cancel: CancellationToken,
    cursor: Option<TailerCursor>,
    pending: VecDeque<LogLine>,
    status: CollectorStatus,
    source: String,
}

impl FileTailer {
    /// 새 테일러를 생성합니다. 파일은 [`open`](Self::open) 시점에 열립니다.
    pub fn new(config: TailerConfig, cancel: CancellationToken) -> Self {
        let source = format!("file:{}", config.path.display());
        Self {
            config,
            cancel,
            cursor: None,
            pending: VecDeque::new(),
            status: CollectorStatus::Idle,
            source,
        }
    }

    /// 현재 상태를 반환합니다.
    pub fn status(&self) -> &CollectorStatus {
        &self.status
    }

    /// 현재 읽기 오프셋을 반환합니다. 파일이 열려있지 않으면 None입니다.
    pub fn offset(&self) -> Option<u64> {
        self.cursor.as_ref().map(|c| c.offset)
    }

    /// 로그 파일을 열고 끝으로 이동합니다.
    ///
    /// 파일이 없으면 `wait_backoff` 간격으로 생길 때까지 기다립니다 (에러 아님).
    /// 대기 중 취소되면 [`LogPipelineError::Cancelled`]를 반환합니다.
    /// 존재가 확인된 뒤에도 열 수 없으면 치명적 에러([`LogPipelineError::Tailer`])입니다.
    pub fn open(&mut self) -> Result<(), LogPipelineError> {
        self.status = CollectorStatus::WaitingForFile;
        self.wait_for_file()?;

        let cursor = self.open_cursor(SeekFrom::End(0)).map_err(|e| {
            let err = LogPipelineError::Tailer {
                path: self.config.path.display().to_string(),
                reason: e.to_string(),
            };
            self.status = CollectorStatus::Error(err.to_string());
            err
        })?;

        tracing::info!(
            path = %self.config.path.display(),
            offset = cursor.offset,
            "log file opened, tailing from end"
        );
        self.cursor = Some(cursor);
        self.status = CollectorStatus::Running;
        Ok(())
    }

    /// 한 번의 비차단 폴링 사이클을 수행합니다.
    ///
    /// 먼저 경로의 파일 식별자와 크기를 확인하여 로테이션/truncation이면
    /// 새 파일을 처음부터 다시 엽니다. 그 다음 현재 읽을 수 있는 완성된 라인을
    /// 모두 반환합니다. 일시적 I/O 에러는 로그만 남기고 빈 배치를 반환합니다.
    pub fn poll(&mut self) -> Vec<LogLine> {
        if !self.check_rotation() {
            return Vec::new();
        }

        let lines = self.read_available();
        if !lines.is_empty() {
            metrics::counter!(m::LOG_PIPELINE_LINES_READ_TOTAL).increment(lines.len() as u64);
        }
        lines
    }

    /// 파일이 생길 때까지 대기합니다.
    fn wait_for_file(&self) -> Result<(), LogPipelineError> {
        let mut announced = false;
        while !self.config.path.exists() {
            if announced {
                tracing::debug!(path = %self.config.path.display(), "still waiting for log file");
            } else {
                tracing::info!(path = %self.config.path.display(), "waiting for log file");
                announced = true;
            }
            if !self.sleep(self.config.wait_backoff) {
                return Err(LogPipelineError::Cancelled);
            }
        }
        Ok(())
    }

    /// 취소를 감지하며 대기합니다. 취소되면 false를 반환합니다.
    ///
    /// 긴 대기도 `poll_interval` 단위로 나누어 취소 신호를 놓치지 않습니다.
    fn sleep(&self, total: Duration) -> bool {
        let slice = self.config.poll_interval.max(Duration::from_millis(1));
        let deadline = Instant::now() + total;
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(slice.min(deadline - now));
        }
    }

    fn open_cursor(&self, pos: SeekFrom) -> io::Result<TailerCursor> {
        let file = File::open(&self.config.path)?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            ));
        }
        let identity = FileIdentity::of(&meta);
        let mut reader = BufReader::new(file);
        let offset = reader.seek(pos)?;
        Ok(TailerCursor {
            reader,
            identity,
            offset,
            partial: Vec::new(),
        })
    }

    /// 로테이션 여부를 확인하고 필요하면 다시 엽니다.
    ///
    /// 읽기를 진행해도 되면 true를 반환합니다.
    fn check_rotation(&mut self) -> bool {
        let meta = match std::fs::metadata(&self.config.path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // 로테이션 도중: 이전 파일은 더 읽지 않고 새 파일을 기다림
                tracing::debug!(path = %self.config.path.display(), "log file missing, waiting for replacement");
                return false;
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.config.path.display(),
                    error = %e,
                    "failed to stat log file, retrying on next poll"
                );
                return false;
            }
        };

        let Some(cursor) = &self.cursor else {
            // 이전 재오픈이 실패한 경우
            return self.reopen("retry");
        };

        let current = FileIdentity::of(&meta);
        if cursor.identity.is_some() && current != cursor.identity {
            return self.reopen("rotated");
        }
        if meta.len() < cursor.offset {
            return self.reopen("truncated");
        }
        true
    }

    fn reopen(&mut self, reason: &'static str) -> bool {
        match self.open_cursor(SeekFrom::Start(0)) {
            Ok(cursor) => {
                tracing::info!(
                    path = %self.config.path.display(),
                    reason,
                    "log file replaced, reading new file from start"
                );
                metrics::counter!(m::LOG_PIPELINE_ROTATIONS_TOTAL).increment(1);
                self.cursor = Some(cursor);
                true
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.config.path.display(),
                    reason,
                    error = %e,
                    "failed to reopen log file, retrying on next poll"
                );
                self.cursor = None;
                false
            }
        }
    }

    /// 현재 읽을 수 있는 완성된 라인을 모두 읽습니다.
    ///
    /// 개행으로 끝나지 않은 마지막 조각은 다음 폴링까지 보류합니다.
    fn read_available(&mut self) -> Vec<LogLine> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Vec::new();
        };

        let max_len = self.config.max_line_length;
        let mut lines = Vec::new();
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match cursor.reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    cursor.offset += n as u64;
                    let complete = buf.last() == Some(&b'\n');
                    let room = max_len.saturating_sub(cursor.partial.len());
                    cursor
                        .partial
                        .extend_from_slice(&buf[..buf.len().min(room)]);

                    if !complete {
                        // EOF 도달, 나머지는 다음 폴링에서
                        break;
                    }

                    let raw = std::mem::take(&mut cursor.partial);
                    lines.push(LogLine::new(decode_line(&raw), self.source.clone()));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!(
                        path = %self.config.path.display(),
                        error = %e,
                        "read error, retrying on next poll"
                    );
                    break;
                }
            }
        }

        lines
    }
}

impl Iterator for FileTailer {
    type Item = LogLine;

    /// 다음 라인을 반환합니다. 새 라인이 없으면 `poll_interval`만큼 대기 후 다시 확인합니다.
    ///
    /// 취소되면 `None`을 반환합니다. 열리지 않은 상태라면 먼저 [`open`](FileTailer::open)을 시도합니다.
    fn next(&mut self) -> Option<LogLine> {
        if self.status == CollectorStatus::Idle {
            match self.open() {
                Ok(()) => {}
                Err(LogPipelineError::Cancelled) => {
                    self.status = CollectorStatus::Stopped;
                    return None;
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to open log file");
                    return None;
                }
            }
        }

        loop {
            if let Some(line) = self.pending.pop_front() {
                return Some(line);
            }
            if self.cancel.is_cancelled() {
                self.status = CollectorStatus::Stopped;
                return None;
            }

            let batch = self.poll();
            if batch.is_empty() {
                if !self.sleep(self.config.poll_interval) {
                    self.status = CollectorStatus::Stopped;
                    return None;
                }
            } else {
                self.pending.extend(batch);
            }
        }
    }
}

/// 원시 바이트를 라인 텍스트로 변환합니다.
///
/// 후행 개행(`\n`, `\r\n`)을 제거하고 잘못된 UTF-8 바이트는 버립니다.
fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    while end > 0 && matches!(raw[end - 1], b'\n' | b'\r') {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end])
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER)
        .collect()
}
