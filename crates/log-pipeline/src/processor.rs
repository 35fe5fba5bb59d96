//! 이벤트 처리기 -- 로그 라인 하나를 전달 단위 하나로 변환합니다.
//!
//! ```text
//! line -> classify -> disambiguate (death) -> enrich (logout) -> streak (death) -> PlayerEvent
//! ```
//!
//! 알려진 플레이어 집합, 통계 리더, 킬 스트릭 상태를 모두 소유하며
//! 파이프라인 워커 스레드 하나에서만 사용됩니다. 라인 하나의 처리가 끝나야
//! 다음 라인을 처리하므로 상태에 잠금이 필요 없습니다.

use minewatch_core::metrics as m;
use minewatch_core::{GameEvent, PlayerEvent};

use crate::classifier::{ClassifiedLine, EventClassifier};
use crate::config::PipelineConfig;
use crate::disambiguator::{self, KnownPlayers};
use crate::error::LogPipelineError;
use crate::stats::{PlayerDirectory, StatsReader};
use crate::streak::KillStreakTracker;

/// 이벤트 처리기
pub struct EventProcessor {
    classifier: EventClassifier,
    known: KnownPlayers,
    stats: StatsReader,
    streaks: KillStreakTracker,
}

impl EventProcessor {
    /// 처리기를 생성합니다. 알려진 플레이어 집합은 통계 리더의 디렉토리로 초기화됩니다.
    pub fn new(classifier: EventClassifier, stats: StatsReader) -> Self {
        let known: KnownPlayers = stats.directory().names().collect();
        Self {
            classifier,
            known,
            stats,
            streaks: KillStreakTracker::new(),
        }
    }

    /// 파이프라인 설정으로 처리기를 생성합니다.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, LogPipelineError> {
        let classifier = EventClassifier::new()?;
        let directory = PlayerDirectory::load(&config.usercache_path);
        let stats = StatsReader::new(&config.stats_dir, directory);
        Ok(Self::new(classifier, stats))
    }

    /// 로그 라인을 처리합니다. 이벤트가 아닌 라인이면 `None`입니다.
    pub fn process_line(&mut self, line: &str) -> Option<PlayerEvent> {
        let classified = self.classifier.classify(line)?;

        let mut notices = Vec::new();
        let event = match classified {
            ClassifiedLine::Login { player } => {
                if self.known.insert(player.as_str()) {
                    tracing::debug!(player = %player, "new player recognized");
                }
                GameEvent::Login { player }
            }
            ClassifiedLine::Logout { player } => {
                let mined_counts = self.stats.mined_counts(&player);
                GameEvent::Logout {
                    player,
                    mined_counts,
                }
            }
            ClassifiedLine::Advancement { player, title, .. } => GameEvent::Advancement {
                player,
                name: title,
            },
            ClassifiedLine::Death {
                victim,
                cause,
                phrase,
                remainder,
                reason,
            } => {
                let resolution = disambiguator::resolve(phrase, &remainder, &self.known);
                notices =
                    self.streaks
                        .record_death(&victim, resolution.killer.as_deref(), &reason);
                GameEvent::death(victim, resolution.killer, cause, reason)
            }
        };

        let kind = event.kind();
        metrics::counter!(m::LOG_PIPELINE_EVENTS_TOTAL, m::LABEL_KIND => kind).increment(1);
        tracing::debug!(kind, player = event.player(), notices = notices.len(), "game event extracted");

        Some(PlayerEvent::new(event).with_streak(notices))
    }

    /// 알려진 플레이어 집합
    pub fn known_players(&self) -> &KnownPlayers {
        &self.known
    }

    /// 킬 스트릭 상태
    pub fn streaks(&self) -> &KillStreakTracker {
        &self.streaks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minewatch_core::{DeathCause, ResourceKind, StreakNotice};

    struct Fixture {
        dir: tempfile::TempDir,
        processor: EventProcessor,
    }

    fn fixture(usercache: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let usercache_path = dir.path().join("usercache.json");
        std::fs::write(&usercache_path, usercache).unwrap();
        let stats_dir = dir.path().join("stats");
        std::fs::create_dir(&stats_dir).unwrap();

        let config = PipelineConfig {
            usercache_path,
            stats_dir,
            ..Default::default()
        };
        let processor = EventProcessor::from_config(&config).unwrap();
        Fixture { dir, processor }
    }

    fn line(msg: &str) -> String {
        format!("[10:00:00] [Server thread/INFO]: {msg}")
    }

    #[test]
    fn seeds_known_players_from_directory() {
        let f = fixture(r#"[{"name": "Alex", "uuid": "uuid-alex"}]"#);
        assert!(f.processor.known_players().contains("Alex"));
    }

    #[test]
    fn login_adds_known_player() {
        let mut f = fixture("[]");
        let event = f.processor.process_line(&line("Steve joined the game")).unwrap();
        assert_eq!(
            event.event,
            GameEvent::Login {
                player: "Steve".to_owned()
            }
        );
        assert!(f.processor.known_players().contains("Steve"));
    }

    #[test]
    fn slain_by_known_player_is_pvp() {
        let mut f = fixture(r#"[{"name": "Alex", "uuid": "uuid-alex"}]"#);
        let event = f.processor.process_line(&line("Steve was slain by Alex")).unwrap();
        assert_eq!(
            event.event,
            GameEvent::Death {
                victim: "Steve".to_owned(),
                killer: Some("Alex".to_owned()),
                is_pvp: true,
                cause: DeathCause::SlainBy,
                reason: "was slain by Alex".to_owned(),
            }
        );
        assert_eq!(f.processor.streaks().streak_of("Alex"), 1);
    }

    #[test]
    fn slain_by_mob_keeps_reason() {
        let mut f = fixture("[]");
        let event = f.processor.process_line(&line("Steve was slain by Zombie")).unwrap();
        match event.event {
            GameEvent::Death {
                killer,
                is_pvp,
                reason,
                ..
            } => {
                assert!(!is_pvp);
                assert!(killer.is_none());
                assert_eq!(reason, "was slain by Zombie");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(f.processor.streaks().is_empty());
    }

    #[test]
    fn logout_is_enriched_with_mined_counts() {
        let mut f = fixture(r#"[{"name": "Bob", "uuid": "uuid-bob"}]"#);
        std::fs::write(
            f.dir.path().join("stats/uuid-bob.json"),
            r#"{"stats": {"minecraft:mined": {
                "minecraft:diamond_ore": 12,
                "minecraft:deepslate_diamond_ore": 3
            }}}"#,
        )
        .unwrap();

        let event = f.processor.process_line(&line("Bob left the game")).unwrap();
        match event.event {
            GameEvent::Logout {
                player,
                mined_counts,
            } => {
                assert_eq!(player, "Bob");
                assert_eq!(mined_counts.get(ResourceKind::Diamonds), 15);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn advancement_title_becomes_name() {
        let mut f = fixture("[]");
        let event = f
            .processor
            .process_line(&line("Alex has made the advancement [Diamonds!]"))
            .unwrap();
        assert_eq!(
            event.event,
            GameEvent::Advancement {
                player: "Alex".to_owned(),
                name: "Diamonds!".to_owned(),
            }
        );
    }

    #[test]
    fn streak_notices_travel_with_death() {
        let mut f = fixture(r#"[{"name": "Steve", "uuid": "u1"}]"#);
        for victim in ["A", "B"] {
            let event = f
                .processor
                .process_line(&line(&format!("{victim} was slain by Steve")))
                .unwrap();
            assert!(event.streak.is_empty());
        }

        let third = f.processor.process_line(&line("C was slain by Steve")).unwrap();
        assert_eq!(
            third.streak,
            vec![StreakNotice::Milestone {
                player: "Steve".to_owned(),
                streak: 3
            }]
        );

        let death = f.processor.process_line(&line("Steve drowned")).unwrap();
        assert_eq!(
            death.streak,
            vec![StreakNotice::Broken {
                player: "Steve".to_owned(),
                streak: 3,
                ended_by: "drowned".to_owned(),
            }]
        );
    }

    #[test]
    fn non_event_lines_yield_nothing() {
        let mut f = fixture("[]");
        assert!(f.processor.process_line(&line("<Steve> hello")).is_none());
        assert!(f.processor.process_line("garbage").is_none());
    }
}
