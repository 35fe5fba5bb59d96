//! 통합 테스트 -- 파이프라인 전체 흐름 검증
//!
//! 로그 파일 테일링부터 저장소/알림 협력자 호출까지의 전체 흐름을 검증합니다.

use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use minewatch_core::error::MinewatchError;
use minewatch_core::pipeline::{Notifier, Pipeline, StatStore};
use minewatch_core::{GameEvent, Notification, PlayerEvent, StatUpdate, StreakNotice};
use minewatch_log_pipeline::{
    EventClassifier, EventDispatcher, LogPipelineBuilder, PipelineConfig, PipelineConfigBuilder,
};

// --- 테스트용 협력자 ---

#[derive(Clone, Default)]
struct MemoryStore {
    updates: Arc<Mutex<Vec<StatUpdate>>>,
}

impl StatStore for MemoryStore {
    async fn apply(&self, update: &StatUpdate) -> Result<(), MinewatchError> {
        self.updates.lock().unwrap().push(update.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MemoryNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
}

impl Notifier for MemoryNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), MinewatchError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

// --- 헬퍼 ---

struct World {
    dir: tempfile::TempDir,
    config: PipelineConfig,
}

impl World {
    fn new(usercache: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("usercache.json"), usercache).unwrap();
        std::fs::create_dir(dir.path().join("stats")).unwrap();
        std::fs::write(dir.path().join("latest.log"), "").unwrap();

        let config = PipelineConfigBuilder::new()
            .log_path(dir.path().join("latest.log"))
            .usercache_path(dir.path().join("usercache.json"))
            .stats_dir(dir.path().join("stats"))
            .poll_interval_ms(10)
            .wait_backoff_secs(1)
            .channel_capacity(32)
            .build()
            .unwrap();
        Self { dir, config }
    }

    fn log(&self, message: &str) {
        append(
            &self.config.log_path,
            &format!("[10:00:00] [Server thread/INFO]: {message}\n"),
        );
    }
}

fn append(path: &Path, text: &str) {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .unwrap();
    file.write_all(text.as_bytes()).unwrap();
}

async fn next_event(rx: &mut mpsc::Receiver<PlayerEvent>) -> PlayerEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// 워커 스레드가 파일을 열고 끝으로 이동할 때까지 대기
async fn settle() {
    tokio::time::sleep(Duration::from_millis(150)).await;
}

// --- 종단 시나리오 ---

/// Steve가 알려진 플레이어 Alex에게 처치됨 -> PvP 사망, 증가 2회, 양쪽 이름이 담긴 알림 1개
#[tokio::test]
async fn pvp_death_end_to_end() {
    let world = World::new(r#"[{"name": "Alex", "uuid": "uuid-alex"}]"#);
    let (mut pipeline, rx) = LogPipelineBuilder::new()
        .config(world.config.clone())
        .build()
        .unwrap();
    let mut rx = rx.unwrap();
    pipeline.start().await.unwrap();
    settle().await;

    world.log("Steve was slain by Alex");
    let event = next_event(&mut rx).await;

    assert_eq!(
        event.event,
        GameEvent::Death {
            victim: "Steve".to_owned(),
            killer: Some("Alex".to_owned()),
            is_pvp: true,
            cause: minewatch_core::DeathCause::SlainBy,
            reason: "was slain by Alex".to_owned(),
        }
    );

    let store = MemoryStore::default();
    let notifier = MemoryNotifier::default();
    let dispatcher = EventDispatcher::new(store.clone(), notifier.clone(), "minecraft-events");
    dispatcher.dispatch(&event).await;

    assert_eq!(
        *store.updates.lock().unwrap(),
        vec![
            StatUpdate::Increment {
                player: "Steve".to_owned(),
                counter: "deaths".to_owned(),
            },
            StatUpdate::Increment {
                player: "Alex".to_owned(),
                counter: "kills".to_owned(),
            },
        ]
    );
    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].text.contains("Steve") && sent[0].text.contains("Alex"));

    pipeline.stop().await.unwrap();
}

/// Bob 접속 종료 -> 다이아몬드 12 + 3 = 15, 증가가 아닌 절대값 설정으로 전달
#[tokio::test]
async fn logout_sets_absolute_diamond_count() {
    let world = World::new(r#"[{"name": "Bob", "uuid": "uuid-bob"}]"#);
    std::fs::write(
        world.dir.path().join("stats/uuid-bob.json"),
        r#"{"stats": {"minecraft:mined": {
            "minecraft:diamond_ore": 12,
            "minecraft:deepslate_diamond_ore": 3
        }}, "DataVersion": 3700}"#,
    )
    .unwrap();

    let (mut pipeline, rx) = LogPipelineBuilder::new()
        .config(world.config.clone())
        .build()
        .unwrap();
    let rx = rx.unwrap();
    pipeline.start().await.unwrap();
    settle().await;

    world.log("Bob left the game");

    let store = MemoryStore::default();
    let dispatcher = EventDispatcher::new(store.clone(), MemoryNotifier::default(), "events");
    let cancel = CancellationToken::new();
    let run = {
        let cancel = cancel.clone();
        async move { dispatcher.run(rx, cancel).await }
    };
    let handle = tokio::spawn(run);

    // 디스패처가 이벤트를 처리할 때까지 대기
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while store.updates.lock().unwrap().is_empty() && tokio::time::Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    pipeline.stop().await.unwrap();
    cancel.cancel();
    assert_eq!(handle.await.unwrap(), 1);

    let updates = store.updates.lock().unwrap();
    assert!(updates.contains(&StatUpdate::Set {
        player: "Bob".to_owned(),
        counter: "diamonds_mined".to_owned(),
        value: 15,
    }));
    assert!(
        !updates
            .iter()
            .any(|u| matches!(u, StatUpdate::Increment { counter, .. } if counter == "diamonds_mined"))
    );
}

/// 로그인으로 알려진 플레이어가 된 뒤에만 PvP 처치자로 인정
#[tokio::test]
async fn login_makes_player_known_for_pvp() {
    let world = World::new("[]");
    let (mut pipeline, rx) = LogPipelineBuilder::new()
        .config(world.config.clone())
        .build()
        .unwrap();
    let mut rx = rx.unwrap();
    pipeline.start().await.unwrap();
    settle().await;

    world.log("Steve was slain by Alex");
    world.log("Alex joined the game");
    world.log("Steve was slain by Alex");

    let before = next_event(&mut rx).await;
    let login = next_event(&mut rx).await;
    let after = next_event(&mut rx).await;

    assert!(matches!(before.event, GameEvent::Death { is_pvp: false, .. }));
    assert!(matches!(login.event, GameEvent::Login { .. }));
    assert!(matches!(after.event, GameEvent::Death { is_pvp: true, .. }));

    pipeline.stop().await.unwrap();
}

/// 킬 스트릭 1, 2, 3 -> 세 번째에서만 기념 알림, 이후 사망 시 끊김 알림
#[tokio::test]
async fn streak_sequence_end_to_end() {
    let world = World::new(r#"[{"name": "Steve", "uuid": "uuid-steve"}]"#);
    let (mut pipeline, rx) = LogPipelineBuilder::new()
        .config(world.config.clone())
        .build()
        .unwrap();
    let mut rx = rx.unwrap();
    pipeline.start().await.unwrap();
    settle().await;

    for victim in ["A", "B", "C"] {
        world.log(&format!("{victim} was slain by Steve"));
    }
    world.log("Steve fell from a high place");

    let mut milestones = Vec::new();
    for _ in 0..3 {
        let event = next_event(&mut rx).await;
        milestones.push(event.streak.len());
    }
    assert_eq!(milestones, vec![0, 0, 1]);

    let death = next_event(&mut rx).await;
    assert_eq!(
        death.streak,
        vec![StreakNotice::Broken {
            player: "Steve".to_owned(),
            streak: 3,
            ended_by: "fell from a high place".to_owned(),
        }]
    );

    pipeline.stop().await.unwrap();
}

/// 로테이션 후 이전 파일의 미읽은 라인은 전달되지 않고, 새 파일의 라인은 처음부터 한 번씩 전달
#[cfg(unix)]
#[tokio::test]
async fn rotation_delivers_new_file_exactly_once() {
    let world = World::new("[]");
    let (mut pipeline, rx) = LogPipelineBuilder::new()
        .config(world.config.clone())
        .build()
        .unwrap();
    let mut rx = rx.unwrap();
    pipeline.start().await.unwrap();
    settle().await;

    world.log("First joined the game");
    let first = next_event(&mut rx).await;
    assert_eq!(first.event.player(), "First");

    // 워커가 폴링하기 전에 이전 파일에 쓰고 바로 교체
    let rotated = world.dir.path().join("2024-01-01-1.log");
    std::fs::rename(&world.config.log_path, &rotated).unwrap();
    append(
        &rotated,
        "[10:00:00] [Server thread/INFO]: Stale joined the game\n",
    );
    append(
        &world.config.log_path,
        "[10:00:01] [Server thread/INFO]: Fresh1 joined the game\n\
         [10:00:02] [Server thread/INFO]: Fresh2 joined the game\n",
    );

    let a = next_event(&mut rx).await;
    let b = next_event(&mut rx).await;
    assert_eq!(a.event.player(), "Fresh1");
    assert_eq!(b.event.player(), "Fresh2");

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err());

    pipeline.stop().await.unwrap();
}

/// 파일 없이 시작 -> 생성될 때까지 대기 후 그 시점부터 테일링
#[tokio::test]
async fn pipeline_waits_for_missing_log_file() {
    let world = World::new("[]");
    std::fs::remove_file(&world.config.log_path).unwrap();

    let (mut pipeline, rx) = LogPipelineBuilder::new()
        .config(world.config.clone())
        .build()
        .unwrap();
    let mut rx = rx.unwrap();
    pipeline.start().await.unwrap();
    settle().await;
    assert!(pipeline.health_check().await.is_healthy());

    std::fs::write(&world.config.log_path, "").unwrap();
    // 백오프(1초) 이후 파일을 열 때까지 대기
    tokio::time::sleep(Duration::from_millis(1500)).await;
    world.log("Late joined the game");

    let event = next_event(&mut rx).await;
    assert_eq!(event.event.player(), "Late");
    pipeline.stop().await.unwrap();
}

// --- 속성 테스트 ---

proptest! {
    /// 임의의 라인에 대해 분류기는 패닉 없이 최대 하나의 결과만 반환
    #[test]
    fn classifier_never_panics(body in ".{0,200}") {
        let classifier = EventClassifier::new().unwrap();
        let line = format!("[10:00:00] [Server thread/INFO]: {body}");
        let _ = classifier.classify(&line);
        let _ = classifier.classify(&body);
    }

    /// 접속 패턴에 맞는 모든 라인은 정확히 그 이름의 Login으로 분류
    #[test]
    fn login_lines_classify_to_login(name in "[A-Za-z0-9_.]{1,16}") {
        let classifier = EventClassifier::new().unwrap();
        let line = format!("[10:00:00] [Server thread/INFO]: {name} joined the game");
        prop_assert_eq!(
            classifier.classify(&line),
            Some(minewatch_log_pipeline::ClassifiedLine::Login { player: name })
        );
    }
}
