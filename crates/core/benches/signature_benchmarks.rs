use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{TimeZone, Utc};
use lyricsweep_core::{
    AudioTrack, BackoffSchedule, ItemId, RetryBackoffPolicy, RetryState, TrackOutcome, signature,
};
use std::time::Duration;

fn sample_track(i: usize) -> AudioTrack {
    AudioTrack::new(format!("track-{i}"))
        .with_name(format!("  Song Number {i} "))
        .with_path(format!("/music/Artist {}/Album {}/{i:04}.flac", i % 50, i % 7))
        .with_duration(Duration::from_millis(180_000 + i as u64))
        .with_album(format!("Album {}", i % 7))
        .with_artists([format!("Artist {}", i % 50), "Featured Guest".to_string()])
        .with_album_artists([format!("Artist {}", i % 50)])
}

fn bench_signature(c: &mut Criterion) {
    let mut group = c.benchmark_group("signature");
    group.sample_size(1000);

    let track = sample_track(42);
    group.bench_function("single_track", |b| {
        b.iter(|| signature(black_box(&track)));
    });

    for page_size in [100usize, 1000].iter() {
        let tracks: Vec<AudioTrack> = (0..*page_size).map(sample_track).collect();
        group.throughput(Throughput::Elements(*page_size as u64));
        group.bench_with_input(BenchmarkId::new("page", page_size), &tracks, |b, tracks| {
            b.iter(|| {
                for t in tracks {
                    black_box(signature(t));
                }
            });
        });
    }

    group.finish();
}

fn bench_backoff_bookkeeping(c: &mut Criterion) {
    let mut group = c.benchmark_group("backoff_bookkeeping");
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let policy = RetryBackoffPolicy::new(BackoffSchedule::default());

    for entries in [1_000usize, 50_000].iter() {
        group.bench_with_input(
            BenchmarkId::new("gate_and_record", entries),
            entries,
            |b, &count| {
                let mut state = RetryState::new();
                for i in 0..count {
                    policy.record_no_result(&mut state, &ItemId::new(format!("t{i}")), "sig", now);
                }
                let later = now + chrono::Duration::days(2);

                b.iter(|| {
                    for i in (0..count).step_by(97) {
                        let id = ItemId::new(format!("t{i}"));
                        if !policy.gate(&mut state, &id, "sig", later).is_skip() {
                            policy.record(&mut state, &id, "sig", &TrackOutcome::NotFound, later);
                        }
                    }
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_signature, bench_backoff_bookkeeping);
criterion_main!(benches);
