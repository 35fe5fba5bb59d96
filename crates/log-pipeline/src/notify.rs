//! 알림 메시지 렌더링
//!
//! 전달 단위([`PlayerEvent`]) 하나를 알림 채널에 보낼 메시지 목록으로 변환합니다.
//! 이벤트 메시지 하나 뒤에 킬 스트릭 알림 메시지가 발생 순서대로 이어집니다.

use minewatch_core::{DeathCause, GameEvent, PlayerEvent, ResourceKind, StreakNotice};

/// 환경 사망 원인별 문구
///
/// 처치자가 있을 수 있는 원인(slain/shot/impaled/killed)과 일반 사망은 `None`이며,
/// 원본 사망 사유를 포함한 일반 템플릿을 사용합니다.
fn death_flavor(cause: DeathCause) -> Option<&'static str> {
    let text = match cause {
        DeathCause::Cactus => "hugged a cactus a little too hard",
        DeathCause::Fire => "went up in smoke",
        DeathCause::Drowned => "forgot to come up for air",
        DeathCause::Fall => "discovered gravity the hard way",
        DeathCause::Lava => "took a dip in lava",
        DeathCause::Explosion => "went out with a bang",
        DeathCause::Wither => "withered away to nothing",
        DeathCause::Starved => "forgot to pack a lunch",
        DeathCause::Suffocated => "got stuck in a wall",
        DeathCause::Anvil => "was flattened by something heavy",
        DeathCause::Void => "fell into the void",
        DeathCause::KineticEnergy => "met a wall at full speed",
        DeathCause::Lightning => "was struck down from the sky",
        DeathCause::Frozen => "froze solid",
        DeathCause::Stung => "angered the bees",
        DeathCause::SlainBy
        | DeathCause::Shot
        | DeathCause::Impaled
        | DeathCause::KilledBy
        | DeathCause::Generic => return None,
    };
    Some(text)
}

fn render_event(event: &GameEvent) -> String {
    match event {
        GameEvent::Login { player } => format!("**{player}** joined the server"),
        GameEvent::Logout {
            player,
            mined_counts,
        } => {
            let diamonds = mined_counts.get(ResourceKind::Diamonds);
            if diamonds > 0 {
                format!("**{player}** left the server ({diamonds} diamonds mined so far)")
            } else {
                format!("**{player}** left the server")
            }
        }
        GameEvent::Advancement { player, name } => {
            format!("**{player}** earned the advancement **[{name}]**")
        }
        GameEvent::Death {
            victim,
            killer: Some(killer),
            ..
        } => format!("**{killer}** killed **{victim}**"),
        GameEvent::Death {
            victim,
            cause,
            reason,
            ..
        } => match death_flavor(*cause) {
            Some(flavor) => format!("**{victim}** {flavor}"),
            None => format!("**{victim}** died: {reason}"),
        },
    }
}

fn render_notice(notice: &StreakNotice) -> String {
    match notice {
        StreakNotice::Milestone { player, streak: 3 } => {
            format!("**{player}** is on a killing spree! (3 kills in a row)")
        }
        StreakNotice::Milestone { player, streak: 5 } => {
            format!("**{player}** is unstoppable! (5 kills in a row)")
        }
        StreakNotice::Milestone { player, streak } => {
            format!("**{player}** is legendary! ({streak} kills in a row)")
        }
        StreakNotice::Broken {
            player,
            streak,
            ended_by,
        } => format!("**{player}**'s {streak}-kill streak has ended ({ended_by})"),
    }
}

/// 전달 단위를 메시지 목록으로 렌더링합니다.
pub fn render(event: &PlayerEvent) -> Vec<String> {
    std::iter::once(render_event(&event.event))
        .chain(event.streak.iter().map(render_notice))
        .collect()
}
