//! 플레이어 디렉토리 -- 이름 → UUID 매핑
//!
//! 서버가 관리하는 `usercache.json` 스냅샷을 읽습니다.
//!
//! ```json
//! [{"name": "Steve", "uuid": "8667ba71-b85a-4004-af54-457a9734eed7", "expiresOn": "..."}]
//! ```
//!
//! 프로세스 수명 동안 무효화되지 않는 캐시이며, 조회 실패 시 한 번만 다시 읽습니다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::LogPipelineError;

/// usercache.json 항목 (필요한 필드만, `expiresOn` 등은 무시)
#[derive(Debug, Deserialize)]
struct UsercacheEntry {
    name: String,
    uuid: String,
}

/// 플레이어 디렉토리
#[derive(Debug, Clone)]
pub struct PlayerDirectory {
    path: PathBuf,
    players: HashMap<String, String>,
}

impl PlayerDirectory {
    /// 스냅샷 파일에서 디렉토리를 읽습니다.
    ///
    /// 파일이 없거나 읽을 수 없으면 경고를 남기고 빈 디렉토리로 시작합니다.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let mut directory = Self {
            path: path.into(),
            players: HashMap::new(),
        };

        match directory.refresh() {
            Ok(count) => tracing::info!(
                path = %directory.path.display(),
                players = count,
                "player directory loaded"
            ),
            Err(e) => tracing::warn!(
                error = %e,
                "player directory unavailable, starting empty"
            ),
        }
        directory
    }

    /// 디렉토리 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 스냅샷 파일을 다시 읽습니다. 실패하면 기존 매핑을 유지합니다.
    pub fn refresh(&mut self) -> Result<usize, LogPipelineError> {
        let content =
            std::fs::read_to_string(&self.path).map_err(|e| LogPipelineError::Directory {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        let entries: Vec<UsercacheEntry> =
            serde_json::from_str(&content).map_err(|e| LogPipelineError::Directory {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })?;

        self.players = entries.into_iter().map(|e| (e.name, e.uuid)).collect();
        Ok(self.players.len())
    }

    /// 플레이어 이름으로 UUID를 조회합니다.
    ///
    /// 없으면 스냅샷을 한 번 다시 읽은 뒤 재조회합니다.
    pub fn resolve(&mut self, name: &str) -> Option<String> {
        if let Some(uuid) = self.players.get(name) {
            return Some(uuid.clone());
        }

        if let Err(e) = self.refresh() {
            tracing::debug!(player = name, error = %e, "directory refresh failed");
            return None;
        }
        self.players.get(name).cloned()
    }

    /// 디렉토리에 등록된 플레이어 이름
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.players.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
