//! Performance benchmarks for reader session tracking.
//!
//! Busy venues can have dozens of readers in range, and the SDK announces
//! each of them repeatedly while a scan runs. These benchmarks measure the
//! cost of feeding announcements to the state machine, with and without
//! duplicates, and of the live reader list updates.
//!
//! # Run Benchmarks
//!
//! ```sh
//! cargo bench --bench session_bench
//!
//! # Run specific benchmark group
//! cargo bench --bench session_bench -- announcements
//! ```

use cardpay_connection::ReaderConnectionStateMachine;
use cardpay_core::ReaderId;
use cardpay_hardware::Reader;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

fn readers(count: usize) -> Vec<Reader> {
    (0..count)
        .map(|i| {
            let id = format!("CHB{i:06}");
            Reader::new(ReaderId::new(&id).unwrap(), id).with_battery_level(0.5)
        })
        .collect()
}

/// Announcements while scanning: every reader is announced `repeats` times.
fn bench_scanning_announcements(c: &mut Criterion) {
    let mut group = c.benchmark_group("announcements");

    for count in [1usize, 10, 50] {
        let announced = readers(count);

        for repeats in [1usize, 5] {
            group.throughput(Throughput::Elements((count * repeats) as u64));
            group.bench_with_input(
                BenchmarkId::new(format!("repeats_{repeats}"), count),
                &announced,
                |b, announced| {
                    b.iter(|| {
                        let mut machine = ReaderConnectionStateMachine::new();
                        machine.start_scan().unwrap();
                        for _ in 0..repeats {
                            for reader in announced {
                                let _ = machine.reader_discovered(black_box(reader.clone()));
                            }
                        }
                        black_box(machine.readers().len())
                    });
                },
            );
        }
    }

    group.finish();
}

/// New readers arriving while the list is on screen.
fn bench_live_list_updates(c: &mut Criterion) {
    let mut group = c.benchmark_group("live_list");

    for count in [10usize, 50] {
        let announced = readers(count);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::from_parameter(count), &announced, |b, announced| {
            b.iter(|| {
                let mut machine = ReaderConnectionStateMachine::new();
                machine.start_scan().unwrap();
                let _ = machine.reader_discovered(announced[0].clone());
                let _ = machine.reader_discovered(announced[1].clone());
                machine.show_results().unwrap();

                for reader in &announced[2..] {
                    let _ = machine.reader_discovered(black_box(reader.clone()));
                }
                black_box(machine.history().len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_scanning_announcements, bench_live_list_updates);
criterion_main!(benches);
