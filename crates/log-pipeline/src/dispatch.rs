//! 이벤트 디스패처 -- 채널에서 전달 단위를 받아 외부 협력자에 전달합니다.
//!
//! 워커 스레드가 보낸 [`PlayerEvent`]를 도착 순서대로 하나씩 처리합니다.
//! 저장소 갱신을 먼저 적용하고 알림 메시지를 보냅니다. 실패는 로그와 메트릭으로만
//! 남기며 재시도하지 않습니다 (최소 1회 전달, 멱등성은 협력자 책임).

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use minewatch_core::metrics as m;
use minewatch_core::types::{
    COLUMN_LAST_LOGIN, COLUMN_LAST_LOGOUT, COUNTER_ADVANCEMENTS, COUNTER_DEATHS, COUNTER_KILLS,
};
use minewatch_core::{
    GameEvent, Notification, Notifier, PlayerEvent, ResourceKind, StatStore, StatUpdate,
};

use crate::notify;

/// 게임 이벤트에 대응하는 저장소 갱신 목록을 생성합니다.
///
/// - Login: `touch(last_login)`
/// - Logout: `touch(last_logout)` + 자원별 `set` (절대값)
/// - Advancement: `increment(advancements)`
/// - Death: `increment(victim.deaths)` + PvP이면 `increment(killer.kills)`
pub fn stat_updates(event: &GameEvent) -> Vec<StatUpdate> {
    match event {
        GameEvent::Login { player } => vec![StatUpdate::Touch {
            player: player.clone(),
            column: COLUMN_LAST_LOGIN.to_owned(),
        }],
        GameEvent::Logout {
            player,
            mined_counts,
        } => {
            let mut updates = vec![StatUpdate::Touch {
                player: player.clone(),
                column: COLUMN_LAST_LOGOUT.to_owned(),
            }];
            updates.extend(ResourceKind::ALL.iter().map(|kind| StatUpdate::Set {
                player: player.clone(),
                counter: kind.counter_name().to_owned(),
                value: mined_counts.get(*kind),
            }));
            updates
        }
        GameEvent::Advancement { player, .. } => vec![StatUpdate::Increment {
            player: player.clone(),
            counter: COUNTER_ADVANCEMENTS.to_owned(),
        }],
        GameEvent::Death { victim, killer, .. } => {
            let mut updates = vec![StatUpdate::Increment {
                player: victim.clone(),
                counter: COUNTER_DEATHS.to_owned(),
            }];
            if let Some(killer) = killer {
                updates.push(StatUpdate::Increment {
                    player: killer.clone(),
                    counter: COUNTER_KILLS.to_owned(),
                });
            }
            updates
        }
    }
}

/// 이벤트 디스패처
pub struct EventDispatcher<S, N> {
    store: S,
    notifier: N,
    channel: String,
    notify_enabled: bool,
}

impl<S: StatStore, N: Notifier> EventDispatcher<S, N> {
    /// 새 디스패처를 생성합니다. 모든 알림은 `channel`로 전송됩니다.
    pub fn new(store: S, notifier: N, channel: impl Into<String>) -> Self {
        Self {
            store,
            notifier,
            channel: channel.into(),
            notify_enabled: true,
        }
    }

    /// 알림 전송 여부를 설정합니다. 비활성화해도 저장소 갱신은 계속됩니다.
    pub fn with_notifications(mut self, enabled: bool) -> Self {
        self.notify_enabled = enabled;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// 채널이 닫히거나 취소될 때까지 이벤트를 처리합니다.
    ///
    /// 취소되면 채널을 닫고 이미 대기 중인 이벤트를 모두 처리한 뒤 반환합니다.
    /// 처리한 이벤트 수를 반환합니다.
    pub async fn run(&self, mut rx: mpsc::Receiver<PlayerEvent>, cancel: CancellationToken) -> u64 {
        let mut delivered = 0u64;

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    rx.close();
                    while let Some(event) = rx.recv().await {
                        self.dispatch(&event).await;
                        delivered += 1;
                    }
                    tracing::info!(delivered, "dispatcher drained and stopped");
                    break;
                }
                received = rx.recv() => match received {
                    Some(event) => {
                        self.dispatch(&event).await;
                        delivered += 1;
                    }
                    None => {
                        tracing::info!(delivered, "event channel closed, dispatcher stopped");
                        break;
                    }
                },
            }
        }

        delivered
    }

    /// 전달 단위 하나를 처리합니다.
    pub async fn dispatch(&self, event: &PlayerEvent) {
        for update in stat_updates(&event.event) {
            if let Err(e) = self.store.apply(&update).await {
                tracing::warn!(
                    event_id = %event.id,
                    update = %update,
                    error = %e,
                    "stat store update failed"
                );
                metrics::counter!(m::DISPATCHER_FAILURES_TOTAL, m::LABEL_SINK => "store").increment(1);
            }
        }

        if self.notify_enabled {
            for text in notify::render(event) {
                let notification = Notification::new(self.channel.as_str(), text);
                if let Err(e) = self.notifier.send(&notification).await {
                    tracing::warn!(
                        event_id = %event.id,
                        channel = %self.channel,
                        error = %e,
                        "notification failed"
                    );
                    metrics::counter!(m::DISPATCHER_FAILURES_TOTAL, m::LABEL_SINK => "notifier")
                        .increment(1);
                }
            }
        }

        metrics::counter!(m::DISPATCHER_EVENTS_DELIVERED_TOTAL).increment(1);
        tracing::debug!(event = %event, "event dispatched");
    }
}
