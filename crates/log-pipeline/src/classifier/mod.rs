//! 이벤트 분류기 -- 로그 라인을 게임 이벤트 후보로 분류합니다.
//!
//! 서버 로그 라인은 `[시각] [스레드/레벨]: 메시지` 형식입니다.
//! 첫 번째 `"]: "` 뒤의 메시지 본문만 분류 대상이며, 아래 순서로 검사합니다.
//!
//! 1. 접속: `<player> joined the game`
//! 2. 접속 종료: `<player> left the game`
//! 3. 발전과제: `<player> has made the advancement [<name>]` (goal, challenge 포함)
//! 4. 사망: `<victim> <cause-phrase> <remainder?>` ([`cause::CAUSE_TABLE`] 참조)
//!
//! 플레이어 이름은 `[\w.]+`로 매칭하므로 `<Steve> ...` 형태의 채팅 라인은 분류되지 않습니다.

pub mod cause;

use regex::Regex;

use minewatch_core::DeathCause;

use crate::error::LogPipelineError;

/// 로그 라인 앞부분과 메시지 본문을 구분하는 구분자
const BODY_SEPARATOR: &str = "]: ";

/// 발전과제 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancementKind {
    /// "has made the advancement"
    Advancement,
    /// "has reached the goal"
    Goal,
    /// "has completed the challenge"
    Challenge,
}

impl AdvancementKind {
    fn from_verb(verb: &str) -> Option<Self> {
        match verb {
            "made the advancement" => Some(Self::Advancement),
            "reached the goal" => Some(Self::Goal),
            "completed the challenge" => Some(Self::Challenge),
            _ => None,
        }
    }
}

/// 분류 결과
///
/// 분류기는 PvP 여부를 판단하지 않습니다. 사망 라인의 `phrase`와 `remainder`는
/// [`crate::disambiguator::resolve`]에 그대로 전달됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedLine {
    Login {
        player: String,
    },
    Logout {
        player: String,
    },
    Advancement {
        player: String,
        kind: AdvancementKind,
        title: String,
    },
    Death {
        victim: String,
        cause: DeathCause,
        /// 매칭된 원인 문구 (테이블 원본)
        phrase: &'static str,
        /// 원인 문구 뒤의 나머지 텍스트 (없으면 빈 문자열)
        remainder: String,
        /// 피해자 이름을 제외한 사망 메시지 전체
        reason: String,
    },
}

/// 이벤트 분류기
///
/// 모든 정규식은 생성 시 한 번만 컴파일됩니다.
pub struct EventClassifier {
    login: Regex,
    logout: Regex,
    advancement: Regex,
    death: Regex,
}

impl EventClassifier {
    /// 분류기를 생성합니다.
    pub fn new() -> Result<Self, LogPipelineError> {
        let alternation = cause::CAUSE_TABLE
            .iter()
            .map(|r| regex::escape(r.phrase))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            login: Regex::new(r"^([\w.]+) joined the game$")?,
            logout: Regex::new(r"^([\w.]+) left the game$")?,
            advancement: Regex::new(
                r"^([\w.]+) has (made the advancement|reached the goal|completed the challenge) \[(.+)\]$",
            )?,
            death: Regex::new(&format!(
                r"^(?P<victim>[\w.]+?) (?P<phrase>{alternation})(?: (?P<rest>.*))?$"
            ))?,
        })
    }

    /// 로그 라인을 분류합니다. 관심 없는 라인이면 `None`을 반환합니다.
    pub fn classify(&self, line: &str) -> Option<ClassifiedLine> {
        let body = message_body(line)?;

        if let Some(caps) = self.login.captures(body) {
            return Some(ClassifiedLine::Login {
                player: caps[1].to_owned(),
            });
        }

        if let Some(caps) = self.logout.captures(body) {
            return Some(ClassifiedLine::Logout {
                player: caps[1].to_owned(),
            });
        }

        if let Some(caps) = self.advancement.captures(body) {
            let kind = AdvancementKind::from_verb(&caps[2])?;
            return Some(ClassifiedLine::Advancement {
                player: caps[1].to_owned(),
                kind,
                title: caps[3].to_owned(),
            });
        }

        let caps = self.death.captures(body)?;
        let victim = caps.name("victim")?;
        let rule = cause::lookup(caps.name("phrase")?.as_str())?;
        let remainder = caps.name("rest").map(|m| m.as_str()).unwrap_or_default();
        let reason = body[victim.end()..].trim_start();

        Some(ClassifiedLine::Death {
            victim: victim.as_str().to_owned(),
            cause: rule.cause,
            phrase: rule.phrase,
            remainder: remainder.to_owned(),
            reason: reason.to_owned(),
        })
    }
}

/// 라인 앞부분(`[시각] [스레드/레벨]: `)을 제거하고 메시지 본문을 반환합니다.
///
/// 구분자가 없는 라인은 `None`입니다.
pub fn message_body(line: &str) -> Option<&str> {
    line.split_once(BODY_SEPARATOR).map(|(_, body)| body.trim_end())
}
