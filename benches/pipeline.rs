//! Pipeline benchmark: raw rows → events → daily counts → merged features.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use insider_threat::config::FeaturesConfig;
use insider_threat::features::{merge, FeatureAggregator, FeaturePipeline, MergePolicy};
use insider_threat::ingest::{Activity, EventLoader, EventSource, RawEvent};
use chrono::NaiveDate;

fn make_events(n: usize, source: EventSource, activity: Activity) -> Vec<RawEvent> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|i| {
            let ts = (start + chrono::Days::new((i % 30) as u64))
                .and_hms_opt((i % 24) as u32, 0, 0)
                .unwrap();
            RawEvent::new(format!("USR{:04}", i % 200), ts, activity.clone(), source)
        })
        .collect()
}

fn make_csv(n: usize) -> String {
    let mut out = String::from("id,date,user,pc,activity\n");
    for i in 0..n {
        out.push_str(&format!(
            "{{{:08X}}},01/{:02}/2010 {:02}:15:00,USR{:04},PC-{},{}\n",
            i,
            i % 28 + 1,
            i % 24,
            i % 200,
            i % 50,
            if i % 3 == 0 { "Logoff" } else { "Logon" }
        ));
    }
    out
}

fn bench_parse(c: &mut Criterion) {
    let csv = make_csv(10_000);
    let loader = EventLoader::new(EventSource::Auth);

    c.bench_function("parse_10k_rows", |b| {
        b.iter(|| black_box(loader.parse_str(black_box(&csv), "bench").unwrap()))
    });
}

fn bench_aggregate(c: &mut Criterion) {
    let events = make_events(50_000, EventSource::Auth, Activity::Logon);
    let agg = FeatureAggregator::logons();

    c.bench_function("aggregate_50k_events", |b| {
        b.iter(|| black_box(agg.aggregate(black_box(&events))))
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let logons = make_events(50_000, EventSource::Auth, Activity::Logon);
    let devices = make_events(20_000, EventSource::Device, Activity::Connect);
    let pipeline = FeaturePipeline::new(FeaturesConfig::default());

    c.bench_function("full_pipeline_events_to_features", |b| {
        b.iter(|| black_box(pipeline.build(&logons, &devices)))
    });

    let l = FeatureAggregator::logons().aggregate(&logons);
    let d = FeatureAggregator::devices().aggregate(&devices);
    c.bench_function("merge_full_outer", |b| {
        b.iter(|| black_box(merge(&l, &d, MergePolicy::FullOuter)))
    });
}

criterion_group!(benches, bench_parse, bench_aggregate, bench_full_pipeline);
criterion_main!(benches);
