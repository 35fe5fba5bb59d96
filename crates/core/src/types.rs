//! 도메인 타입 — 자원 종류, 채굴 카운트, 저장소 갱신, 알림 메시지

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// --- 저장소 컬럼명 상수 ---

/// 킬 수 카운터
pub const COUNTER_KILLS: &str = "kills";
/// 데스 수 카운터
pub const COUNTER_DEATHS: &str = "deaths";
/// 발전과제 달성 수 카운터
pub const COUNTER_ADVANCEMENTS: &str = "advancements";
/// 마지막 접속 시각 컬럼
pub const COLUMN_LAST_LOGIN: &str = "last_login";
/// 마지막 접속 종료 시각 컬럼
pub const COLUMN_LAST_LOGOUT: &str = "last_logout";

/// 추적하는 채굴 자원 종류
///
/// 각 자원은 일반 광석과 심층암 변종을 합산한 하나의 카운터로 집계됩니다.
/// 금은 네더 금 광석까지 포함하며, 네더라이트는 고대 잔해 하나로만 집계합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Diamonds,
    Coal,
    Iron,
    Gold,
    Emerald,
    Lapis,
    Redstone,
    Netherite,
}

impl ResourceKind {
    /// 추적 대상 자원 전체 (저장 순서)
    pub const ALL: [ResourceKind; 8] = [
        Self::Diamonds,
        Self::Coal,
        Self::Iron,
        Self::Gold,
        Self::Emerald,
        Self::Lapis,
        Self::Redstone,
        Self::Netherite,
    ];

    /// 통계 파일의 채굴 카운터에서 합산할 블록 ID 목록
    pub fn block_ids(self) -> &'static [&'static str] {
        match self {
            Self::Diamonds => &["minecraft:diamond_ore", "minecraft:deepslate_diamond_ore"],
            Self::Coal => &["minecraft:coal_ore", "minecraft:deepslate_coal_ore"],
            Self::Iron => &["minecraft:iron_ore", "minecraft:deepslate_iron_ore"],
            Self::Gold => &[
                "minecraft:gold_ore",
                "minecraft:deepslate_gold_ore",
                "minecraft:nether_gold_ore",
            ],
            Self::Emerald => &["minecraft:emerald_ore", "minecraft:deepslate_emerald_ore"],
            Self::Lapis => &["minecraft:lapis_ore", "minecraft:deepslate_lapis_ore"],
            Self::Redstone => &["minecraft:redstone_ore", "minecraft:deepslate_redstone_ore"],
            Self::Netherite => &["minecraft:ancient_debris"],
        }
    }

    /// 저장소 카운터 이름 (예: `diamonds_mined`)
    pub fn counter_name(self) -> &'static str {
        match self {
            Self::Diamonds => "diamonds_mined",
            Self::Coal => "coal_mined",
            Self::Iron => "iron_mined",
            Self::Gold => "gold_mined",
            Self::Emerald => "emerald_mined",
            Self::Lapis => "lapis_mined",
            Self::Redstone => "redstone_mined",
            Self::Netherite => "netherite_mined",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.counter_name())
    }
}

/// 자원별 누적 채굴 수
///
/// 통계 파일에서 읽은 절대값(평생 누적)이며, 직전 값과의 차이가 아닙니다.
/// 저장소는 이 값을 증가가 아니라 덮어쓰기로 반영해야 합니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinedCounts(BTreeMap<ResourceKind, u64>);

impl MinedCounts {
    /// 모든 자원이 0인 카운트를 생성합니다.
    pub fn zero() -> Self {
        Self(ResourceKind::ALL.iter().map(|kind| (*kind, 0)).collect())
    }

    /// 자원의 카운트를 반환합니다. 기록이 없으면 0입니다.
    pub fn get(&self, kind: ResourceKind) -> u64 {
        self.0.get(&kind).copied().unwrap_or(0)
    }

    /// 자원의 카운트를 설정합니다.
    pub fn set(&mut self, kind: ResourceKind, value: u64) {
        self.0.insert(kind, value);
    }

    /// 모든 카운트가 0인지 확인합니다.
    pub fn is_zero(&self) -> bool {
        self.0.values().all(|v| *v == 0)
    }

    /// 자원 순서대로 (종류, 카운트)를 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceKind, u64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }
}

/// 저장소로 전달되는 단일 갱신 요청
///
/// 저장소 협력자의 좁은 쓰기 API(증가, 설정, 타임스탬프 갱신)에 대응합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StatUpdate {
    /// 카운터를 1 증가
    Increment { player: String, counter: String },
    /// 카운터를 절대값으로 설정
    Set {
        player: String,
        counter: String,
        value: u64,
    },
    /// 타임스탬프 컬럼을 현재 시각으로 갱신
    Touch { player: String, column: String },
}

impl StatUpdate {
    /// 갱신 대상 플레이어 이름
    pub fn player(&self) -> &str {
        match self {
            Self::Increment { player, .. } | Self::Set { player, .. } | Self::Touch { player, .. } => {
                player
            }
        }
    }
}

impl fmt::Display for StatUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increment { player, counter } => write!(f, "increment({player}.{counter})"),
            Self::Set {
                player,
                counter,
                value,
            } => write!(f, "set({player}.{counter}={value})"),
            Self::Touch { player, column } => write!(f, "touch({player}.{column})"),
        }
    }
}

/// 알림 채널로 전달되는 메시지
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// 대상 채널 식별자
    pub channel: String,
    /// 메시지 본문
    pub text: String,
}

impl Notification {
    /// 새 알림 메시지를 생성합니다.
    pub fn new(channel: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            text: text.into(),
        }
    }
}
