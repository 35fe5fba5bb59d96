//! 킬 스트릭 추적기
//!
//! 플레이어별 연속 PvP 킬 수를 관리하고, 사망 이벤트에 첨부할 알림을 생성합니다.
//!
//! # 상태 전이 (사망 이벤트마다)
//! 1. 피해자의 스트릭이 3 이상이면 `Broken` 알림 (초기화 전에)
//! 2. 피해자의 스트릭 제거
//! 3. PvP이면 처치자 스트릭 +1, 새 값이 3, 5 또는 10 이상이면 `Milestone` 알림
//!
//! 상태는 파이프라인 워커 스레드만 접근하므로 동기화가 필요 없습니다.

use std::collections::HashMap;

use minewatch_core::StreakNotice;
use minewatch_core::metrics as m;

/// 스트릭 끊김 알림을 내보내는 최소 스트릭
const BROKEN_THRESHOLD: u32 = 3;

/// 이 값부터는 매 킬마다 기념 알림
const REPEATING_MILESTONE: u32 = 10;

fn is_milestone(streak: u32) -> bool {
    matches!(streak, 3 | 5) || streak >= REPEATING_MILESTONE
}

/// 킬 스트릭 추적기
#[derive(Debug, Default)]
pub struct KillStreakTracker {
    streaks: HashMap<String, u32>,
}

impl KillStreakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 사망 이벤트를 반영하고 발생한 알림을 순서대로 반환합니다.
    ///
    /// `killer`는 PvP 사망일 때만 주어집니다. `reason`은 PvP가 아닐 때
    /// 스트릭 끊김 원인으로 사용됩니다.
    pub fn record_death(
        &mut self,
        victim: &str,
        killer: Option<&str>,
        reason: &str,
    ) -> Vec<StreakNotice> {
        let mut notices = Vec::new();

        let previous = self.streaks.remove(victim).unwrap_or(0);
        if previous >= BROKEN_THRESHOLD {
            notices.push(StreakNotice::Broken {
                player: victim.to_owned(),
                streak: previous,
                ended_by: killer.unwrap_or(reason).to_owned(),
            });
        }

        if let Some(killer) = killer {
            let streak = self.streaks.entry(killer.to_owned()).or_insert(0);
            *streak = streak.saturating_add(1);
            tracing::debug!(killer, streak = *streak, "kill streak advanced");

            if is_milestone(*streak) {
                notices.push(StreakNotice::Milestone {
                    player: killer.to_owned(),
                    streak: *streak,
                });
            }
        }

        for notice in &notices {
            let kind = match notice {
                StreakNotice::Milestone { .. } => "milestone",
                StreakNotice::Broken { .. } => "broken",
            };
            metrics::counter!(m::LOG_PIPELINE_STREAK_NOTICES_TOTAL, m::LABEL_KIND => kind)
                .increment(1);
        }

        notices
    }

    /// 플레이어의 현재 스트릭 (없으면 0)
    pub fn streak_of(&self, player: &str) -> u32 {
        self.streaks.get(player).copied().unwrap_or(0)
    }

    /// 스트릭이 기록된 플레이어 수
    pub fn len(&self) -> usize {
        self.streaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streaks.is_empty()
    }
}
