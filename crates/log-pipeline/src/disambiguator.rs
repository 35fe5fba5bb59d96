//! PvP 판별기
//!
//! 사망 라인의 원인 문구와 나머지 텍스트를 보고 처치자가 알려진 플레이어인지 판단합니다.
//! `"was slain by"` 문구만 PvP 후보이며, 나머지 텍스트가 알려진 플레이어 이름과
//! 정확히 같거나 `"이름 "`으로 시작할 때만 PvP로 분류합니다
//! (예: `Alex using [Diamond Sword]`).

use std::collections::HashSet;

use crate::classifier::cause::SLAIN_BY;

/// 알려진 플레이어 이름 집합
///
/// 플레이어 디렉토리로 초기화되고 접속 이벤트마다 추가됩니다.
/// 파이프라인 워커 스레드만 접근합니다.
#[derive(Debug, Clone, Default)]
pub struct KnownPlayers(HashSet<String>);

impl KnownPlayers {
    /// 빈 집합을 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 플레이어를 추가합니다. 새로 추가되었으면 true를 반환합니다.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.0.insert(name.into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `remainder`의 앞부분과 일치하는 알려진 플레이어를 찾습니다.
    fn leading_player<'a>(&'a self, remainder: &str) -> Option<&'a str> {
        self.0
            .iter()
            .map(String::as_str)
            .filter(|name| {
                remainder == *name
                    || remainder
                        .strip_prefix(*name)
                        .is_some_and(|rest| rest.starts_with(' '))
            })
            // 접두어가 겹치는 이름은 더 긴 쪽을 선택 (예: "Alex"와 "Alex2")
            .max_by_key(|name| name.len())
    }
}

impl<S: Into<String>> FromIterator<S> for KnownPlayers {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for KnownPlayers {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

/// PvP 판별 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvpResolution {
    pub is_pvp: bool,
    /// `is_pvp`가 true일 때만 존재
    pub killer: Option<String>,
}

impl PvpResolution {
    fn environmental() -> Self {
        Self {
            is_pvp: false,
            killer: None,
        }
    }
}

/// 사망 원인을 PvP 또는 환경 사망으로 판별합니다.
pub fn resolve(phrase: &str, remainder: &str, known: &KnownPlayers) -> PvpResolution {
    if phrase != SLAIN_BY {
        return PvpResolution::environmental();
    }

    match known.leading_player(remainder.trim()) {
        Some(name) => PvpResolution {
            is_pvp: true,
            killer: Some(name.to_owned()),
        },
        None => PvpResolution::environmental(),
    }
}
