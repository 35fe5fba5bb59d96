//! 이벤트 시스템 — 모듈 간 통신의 기본 단위
//!
//! 로그 라인에서 추출한 게임 이벤트([`GameEvent`])는 메타데이터와 킬 스트릭 알림을
//! 함께 담은 [`PlayerEvent`]로 포장되어 하나의 전달 단위로 외부 협력자에게 전달됩니다.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::types::MinedCounts;

// --- 이벤트 타입 상수 ---

/// 접속 이벤트 타입
pub const EVENT_TYPE_LOGIN: &str = "login";
/// 접속 종료 이벤트 타입
pub const EVENT_TYPE_LOGOUT: &str = "logout";
/// 발전과제 이벤트 타입
pub const EVENT_TYPE_ADVANCEMENT: &str = "advancement";
/// 사망 이벤트 타입
pub const EVENT_TYPE_DEATH: &str = "death";

/// 사망 원인 분류
///
/// 사망 메시지의 원인 문구(cause-phrase)를 분류한 결과입니다.
/// 알림 메시지의 문구는 이 분류에 따라 달라집니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// "was slain by" — 플레이어 또는 몹에게 처치됨
    SlainBy,
    Cactus,
    Fire,
    Drowned,
    Fall,
    Lava,
    Explosion,
    Shot,
    Wither,
    Starved,
    Suffocated,
    Anvil,
    /// 월드 밖으로 떨어짐
    Void,
    KineticEnergy,
    Lightning,
    Impaled,
    Frozen,
    Stung,
    /// "was killed by" 형태의 일반 처치
    KilledBy,
    /// 분류되지 않은 일반 사망 ("died")
    Generic,
}

/// 로그에서 추출한 게임 이벤트
///
/// 하나의 로그 라인은 최대 하나의 이벤트를 생성합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameEvent {
    /// 플레이어 접속
    Login { player: String },
    /// 플레이어 접속 종료 (통계 파일의 절대 채굴 수 포함)
    Logout {
        player: String,
        mined_counts: MinedCounts,
    },
    /// 발전과제/목표/도전과제 달성
    Advancement { player: String, name: String },
    /// 플레이어 사망
    ///
    /// `killer`는 `is_pvp`가 true일 때만 존재합니다. [`GameEvent::death`]로 생성하세요.
    Death {
        victim: String,
        killer: Option<String>,
        is_pvp: bool,
        cause: DeathCause,
        reason: String,
    },
}

impl GameEvent {
    /// 사망 이벤트를 생성합니다.
    ///
    /// 처치자가 주어지면 PvP 사망으로 기록됩니다.
    pub fn death(
        victim: impl Into<String>,
        killer: Option<String>,
        cause: DeathCause,
        reason: impl Into<String>,
    ) -> Self {
        Self::Death {
            victim: victim.into(),
            is_pvp: killer.is_some(),
            killer,
            cause,
            reason: reason.into(),
        }
    }

    /// 이벤트 타입명
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Login { .. } => EVENT_TYPE_LOGIN,
            Self::Logout { .. } => EVENT_TYPE_LOGOUT,
            Self::Advancement { .. } => EVENT_TYPE_ADVANCEMENT,
            Self::Death { .. } => EVENT_TYPE_DEATH,
        }
    }

    /// 이벤트의 주체 플레이어 (사망 이벤트는 피해자)
    pub fn player(&self) -> &str {
        match self {
            Self::Login { player }
            | Self::Logout { player, .. }
            | Self::Advancement { player, .. } => player,
            Self::Death { victim, .. } => victim,
        }
    }
}

/// 킬 스트릭 상태 변화 알림
///
/// 별도 이벤트가 아니라 사망 이벤트에 부가 정보로 첨부됩니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StreakNotice {
    /// 처치자의 연속 킬이 기념 수치에 도달함
    Milestone { player: String, streak: u32 },
    /// 피해자의 연속 킬이 끊김 (`ended_by`는 처치자 이름 또는 사망 사유)
    Broken {
        player: String,
        streak: u32,
        ended_by: String,
    },
}

/// 외부 협력자에게 전달되는 이벤트 단위
///
/// 사망 이벤트와 그에 따른 킬 스트릭 알림은 하나의 단위로 순서대로 전달되어
/// 다른 플레이어의 사망 처리와 섞이지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerEvent {
    /// 이벤트 고유 ID (UUID v4), 저장소 실패와 알림 실패 로그를 연결합니다
    pub id: String,
    /// 로그 라인을 읽은 시각
    pub received_at: SystemTime,
    /// 게임 이벤트 본문
    pub event: GameEvent,
    /// 첨부된 킬 스트릭 알림 (발생 순서)
    pub streak: Vec<StreakNotice>,
}

impl PlayerEvent {
    pub fn new(event: GameEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            received_at: SystemTime::now(),
            event,
            streak: Vec::new(),
        }
    }

    /// 킬 스트릭 알림을 첨부합니다.
    pub fn with_streak(mut self, notices: Vec<StreakNotice>) -> Self {
        self.streak = notices;
        self
    }
}

impl fmt::Display for PlayerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PlayerEvent[{}] kind={} player={} notices={}",
            &self.id[..8.min(self.id.len())],
            self.event.kind(),
            self.event.player(),
            self.streak.len(),
        )
    }
}
