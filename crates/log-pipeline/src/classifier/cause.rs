//! 사망 원인 문구 테이블
//!
//! 원인 문구(cause-phrase)와 [`DeathCause`] 분류의 대응을 우선순위 순서로 정의합니다.
//! 새 사망 메시지를 지원하려면 이 테이블에 행을 추가하면 됩니다.
//!
//! 앞쪽 행이 우선합니다. 한 문구가 다른 문구의 접두어인 경우
//! (예: "fell out of the world"와 "fell off") 더 구체적인 문구를 먼저 둡니다.

use minewatch_core::DeathCause;

/// "slain by" 문구 -- PvP 판별 대상이 되는 유일한 원인 문구
pub const SLAIN_BY: &str = "was slain by";

/// 원인 문구 → 분류 규칙 한 행
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CauseRule {
    /// 피해자 이름 바로 뒤에 오는 고정 문구
    pub phrase: &'static str,
    /// 분류 결과
    pub cause: DeathCause,
}

const fn rule(phrase: &'static str, cause: DeathCause) -> CauseRule {
    CauseRule { phrase, cause }
}

/// 사망 원인 문구 테이블 (우선순위 순)
pub const CAUSE_TABLE: &[CauseRule] = &[
    rule(SLAIN_BY, DeathCause::SlainBy),
    rule("was pricked to death", DeathCause::Cactus),
    rule("walked into a cactus", DeathCause::Cactus),
    rule("was poked to death by a sweet berry bush", DeathCause::Cactus),
    rule("burned to death", DeathCause::Fire),
    rule("went up in flames", DeathCause::Fire),
    rule("was burnt to a crisp", DeathCause::Fire),
    rule("walked into fire", DeathCause::Fire),
    rule("was fireballed by", DeathCause::Fire),
    rule("drowned", DeathCause::Drowned),
    rule("fell out of the world", DeathCause::Void),
    rule("didn't want to live in the same world as", DeathCause::Void),
    rule("fell from a high place", DeathCause::Fall),
    rule("hit the ground too hard", DeathCause::Fall),
    rule("fell off", DeathCause::Fall),
    rule("fell while climbing", DeathCause::Fall),
    rule("fell too far and was finished by", DeathCause::Fall),
    rule("was doomed to fall", DeathCause::Fall),
    rule("tried to swim in lava", DeathCause::Lava),
    rule("discovered the floor was lava", DeathCause::Lava),
    rule("walked into the danger zone due to", DeathCause::Lava),
    rule("was blown up by", DeathCause::Explosion),
    rule("blew up", DeathCause::Explosion),
    rule("was obliterated by a sonically-charged shriek", DeathCause::Explosion),
    rule("was killed by [Intentional Game Design]", DeathCause::Explosion),
    rule("was shot by", DeathCause::Shot),
    rule("withered away", DeathCause::Wither),
    rule("starved to death", DeathCause::Starved),
    rule("suffocated in a wall", DeathCause::Suffocated),
    rule("was squished too much", DeathCause::Suffocated),
    rule("was squashed by a falling anvil", DeathCause::Anvil),
    rule("was squashed by a falling block", DeathCause::Anvil),
    rule("was squashed by", DeathCause::Anvil),
    rule("experienced kinetic energy", DeathCause::KineticEnergy),
    rule("was struck by lightning", DeathCause::Lightning),
    rule("was impaled on a stalagmite", DeathCause::Impaled),
    rule("was skewered by a falling stalactite", DeathCause::Impaled),
    rule("was impaled by", DeathCause::Impaled),
    rule("froze to death", DeathCause::Frozen),
    rule("was frozen to death by", DeathCause::Frozen),
    rule("was stung to death", DeathCause::Stung),
    rule("was pummeled by", DeathCause::KilledBy),
    rule("was killed by", DeathCause::KilledBy),
    rule("was killed", DeathCause::KilledBy),
    rule("died", DeathCause::Generic),
];

/// 매칭된 문구에 해당하는 규칙을 찾습니다.
pub fn lookup(phrase: &str) -> Option<&'static CauseRule> {
    CAUSE_TABLE.iter().find(|r| r.phrase == phrase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn phrases_are_unique() {
        let unique: HashSet<_> = CAUSE_TABLE.iter().map(|r| r.phrase).collect();
        assert_eq!(unique.len(), CAUSE_TABLE.len());
    }

    #[test]
    fn slain_by_is_first() {
        assert_eq!(CAUSE_TABLE[0].phrase, SLAIN_BY);
        assert_eq!(CAUSE_TABLE[0].cause, DeathCause::SlainBy);
    }

    #[test]
    fn longer_phrase_precedes_its_prefix() {
        // 접두어 관계인 문구는 더 긴 쪽이 먼저 와야 함
        for (i, earlier) in CAUSE_TABLE.iter().enumerate() {
            for later in &CAUSE_TABLE[i + 1..] {
                assert!(
                    !later.phrase.starts_with(earlier.phrase) || later.phrase == earlier.phrase,
                    "'{}' shadows '{}'",
                    earlier.phrase,
                    later.phrase
                );
            }
        }
    }

    #[test]
    fn lookup_finds_rule() {
        assert_eq!(lookup("drowned").map(|r| r.cause), Some(DeathCause::Drowned));
        assert!(lookup("exploded into confetti").is_none());
    }
}
