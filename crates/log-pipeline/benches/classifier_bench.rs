//! 분류기 벤치마크
//!
//! 이벤트 라인, 사망 라인(원인 문구 테이블 끝쪽), 무관한 라인의 분류 처리량을 측정합니다.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use minewatch_log_pipeline::EventClassifier;
use minewatch_log_pipeline::disambiguator::{KnownPlayers, resolve};

const LOGIN: &str = "[10:00:00] [Server thread/INFO]: Steve joined the game";
const ADVANCEMENT: &str =
    "[10:00:00] [Server thread/INFO]: Alex has made the advancement [Isn't It Iron Pick]";
const DEATH_FIRST: &str = "[10:00:00] [Server thread/INFO]: Steve was slain by Alex using [Sword]";
const DEATH_LAST: &str = "[10:00:00] [Server thread/INFO]: Steve died";
const CHAT: &str = "[10:00:00] [Server thread/INFO]: <Steve> anyone want to go to the nether?";
const NOISE: &str = "[10:00:00] [Server thread/WARN]: Can't keep up! Is the server overloaded? Running 2035ms or 40 ticks behind";

fn bench_classify(c: &mut Criterion) {
    let classifier = EventClassifier::new().unwrap();

    let mut group = c.benchmark_group("classify");
    group.throughput(Throughput::Elements(1));

    for (name, line) in [
        ("login", LOGIN),
        ("advancement", ADVANCEMENT),
        ("death_first_rule", DEATH_FIRST),
        ("death_last_rule", DEATH_LAST),
        ("chat", CHAT),
        ("noise", NOISE),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), line, |b, line| {
            b.iter(|| classifier.classify(black_box(line)))
        });
    }

    group.finish();
}

fn bench_mixed_stream(c: &mut Criterion) {
    let classifier = EventClassifier::new().unwrap();
    let lines = [LOGIN, NOISE, CHAT, ADVANCEMENT, NOISE, DEATH_FIRST, NOISE, DEATH_LAST];

    let mut group = c.benchmark_group("mixed_stream");
    group.throughput(Throughput::Elements(lines.len() as u64 * 125));
    group.bench_function("lines_1000", |b| {
        b.iter(|| {
            let mut events = 0usize;
            for _ in 0..125 {
                for line in &lines {
                    if classifier.classify(black_box(line)).is_some() {
                        events += 1;
                    }
                }
            }
            events
        })
    });
    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for size in [10usize, 100, 1000] {
        let known: KnownPlayers = (0..size).map(|i| format!("Player{i}")).collect();
        group.bench_with_input(BenchmarkId::new("known_players", size), &known, |b, known| {
            b.iter(|| resolve(black_box("was slain by"), black_box("Zombie"), known))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_mixed_stream, bench_resolve);
criterion_main!(benches);
