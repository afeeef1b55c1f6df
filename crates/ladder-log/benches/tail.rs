use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ladder_log::{AddPlayerPayload, LogConfig, SyncMode, Transaction, TransactionKind, TransactionLog};
use ladder_types::{PlayerId, Standings};

fn populated_log(dir: &tempfile::TempDir, records: usize) -> TransactionLog {
    let config = LogConfig {
        sync_mode: SyncMode::OsDefault,
    };
    let mut log = TransactionLog::open(&dir.path().join("bench.jsonl"), config).unwrap();
    let mut standings = Standings::new();
    for i in 0..records {
        let id = PlayerId::new(format!("player-{i}"));
        standings.push_bottom(id.clone(), format!("Player {i}"));
        let tx = Transaction::new(
            TransactionKind::AddPlayer(AddPlayerPayload {
                player_id: id,
                name: format!("Player {i}"),
            }),
            standings.clone(),
        );
        log.append(&tx).unwrap();
    }
    log
}

fn bench_current_standings(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let log = populated_log(&dir, 500);

    let mut group = c.benchmark_group("current_standings");
    group.bench_function("read_tail", |b| {
        b.iter(|| black_box(log.read_tail().unwrap()))
    });
    group.bench_function("forward_scan_last", |b| {
        b.iter(|| {
            let last = log
                .scan_forward()
                .unwrap()
                .filter_map(|r| r.ok())
                .last()
                .map(|r| r.transaction.standings);
            black_box(last)
        })
    });
    group.finish();
}

criterion_group!(benches, bench_current_standings);
criterion_main!(benches);
