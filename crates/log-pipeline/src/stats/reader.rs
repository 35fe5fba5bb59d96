//! 통계 스냅샷 리더
//!
//! `{stats_dir}/{uuid}.json` 파일의 `stats["minecraft:mined"]` 섹션에서
//! 자원별 채굴 수를 합산합니다. 어떤 실패도 이벤트 전달을 막지 않도록
//! 0 카운트로 대체됩니다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use minewatch_core::metrics as m;
use minewatch_core::{MinedCounts, ResourceKind};

use super::directory::PlayerDirectory;
use crate::error::LogPipelineError;

/// 통계 스냅샷 파일 (필요한 부분만)
///
/// `minecraft:mined` 외의 섹션은 역직렬화하지 않으므로 다른 섹션에
/// 음수나 실수 값이 있어도 채굴 수를 읽을 수 있습니다.
#[derive(Debug, Deserialize)]
struct StatsSnapshot {
    #[serde(default)]
    stats: StatSections,
}

#[derive(Debug, Default, Deserialize)]
struct StatSections {
    #[serde(rename = "minecraft:mined", default)]
    mined: HashMap<String, u64>,
}

impl StatsSnapshot {
    fn mined_counts(&self) -> MinedCounts {
        let mined = &self.stats.mined;
        let mut counts = MinedCounts::zero();
        for kind in ResourceKind::ALL {
            let total = kind
                .block_ids()
                .iter()
                .filter_map(|id| mined.get(*id))
                .fold(0u64, |acc, v| acc.saturating_add(*v));
            counts.set(kind, total);
        }
        counts
    }
}

/// 통계 리더
///
/// 플레이어 디렉토리를 소유하며 파이프라인 워커 스레드에서만 사용됩니다.
pub struct StatsReader {
    stats_dir: PathBuf,
    directory: PlayerDirectory,
}

impl StatsReader {
    pub fn new(stats_dir: impl Into<PathBuf>, directory: PlayerDirectory) -> Self {
        Self {
            stats_dir: stats_dir.into(),
            directory,
        }
    }

    /// 통계 디렉토리 경로
    pub fn stats_dir(&self) -> &Path {
        &self.stats_dir
    }

    /// 플레이어 디렉토리
    pub fn directory(&self) -> &PlayerDirectory {
        &self.directory
    }

    /// 플레이어의 자원별 누적 채굴 수를 반환합니다.
    ///
    /// 디렉토리에 없거나 통계 파일이 없으면 0 카운트입니다 (정상 경우).
    /// 파일을 읽거나 파싱할 수 없으면 경고를 남기고 0 카운트를 반환합니다.
    pub fn mined_counts(&mut self, player: &str) -> MinedCounts {
        match self.try_mined_counts(player) {
            Ok(counts) => counts,
            Err(e) => {
                tracing::warn!(player, error = %e, "failed to read statistics, using zero counts");
                metrics::counter!(m::LOG_PIPELINE_STATS_READ_FAILURES_TOTAL).increment(1);
                MinedCounts::zero()
            }
        }
    }

    /// 다이아몬드 채굴 수만 반환합니다.
    pub fn diamond_count(&mut self, player: &str) -> u64 {
        self.mined_counts(player).get(ResourceKind::Diamonds)
    }

    fn try_mined_counts(&mut self, player: &str) -> Result<MinedCounts, LogPipelineError> {
        let Some(uuid) = self.directory.resolve(player) else {
            tracing::debug!(player, "player not in directory, no statistics");
            return Ok(MinedCounts::zero());
        };

        let path = self.stats_dir.join(format!("{uuid}.json"));
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(player, path = %path.display(), "no statistics file yet");
                return Ok(MinedCounts::zero());
            }
            Err(e) => {
                return Err(LogPipelineError::Stats {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let snapshot: StatsSnapshot =
            serde_json::from_str(&content).map_err(|e| LogPipelineError::Stats {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(snapshot.mined_counts())
    }
}
