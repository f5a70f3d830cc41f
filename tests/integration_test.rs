//! Integration test: config load, raw tables → features → labels → model → reload.

use insider_threat::{
    config::AppConfig,
    features::{table, FeaturePipeline, MergePolicy},
    ingest::{EventLoader, EventSource},
    stages,
    threat::{label, LabeledSample, ThreatLevel},
    ThreatClassifier, ThreatError,
};
use chrono::NaiveDate;
use std::path::Path;

const LOGONS: &str = "id,date,user,pc,activity
1,2024-01-01 08:00:00,A,PC-1,Logon
2,2024-01-01 09:00:00,A,PC-1,Logon
3,2024-01-01 10:00:00,A,PC-1,Logon
4,2024-01-01 11:00:00,A,PC-1,Logon
5,2024-01-01 12:00:00,A,PC-1,Logon
6,2024-01-01 13:00:00,A,PC-1,Logon
7,2024-01-01 17:00:00,A,PC-1,Logoff
8,2024-01-02 08:00:00,B,PC-2,Logon
";

const DEVICES: &str = "id,date,user,pc,activity
1,2024-01-02 08:05:00,B,PC-2,Connect
2,2024-01-02 08:10:00,B,PC-2,Disconnect
3,2024-01-03 08:10:00,C,PC-3,Connect
";

fn workspace(logons: &str, devices: &str) -> (tempfile::TempDir, AppConfig) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.data.raw_dir = dir.path().join("raw");
    config.data.processed_dir = dir.path().join("processed");
    config.data.results_dir = dir.path().join("results");
    config.model.n_trees = 25;
    std::fs::create_dir_all(&config.data.raw_dir).unwrap();
    std::fs::write(config.data.logon_path(), logons).unwrap();
    std::fs::write(config.data.device_path(), devices).unwrap();
    (dir, config)
}

#[test]
fn config_load_default() {
    let c = AppConfig::load(Path::new("nonexistent.json"));
    assert_eq!(c.monitor.refresh_interval_secs, 3);
    assert_eq!(c.monitor.batch_size, 3);
    assert_eq!(c.features.merge_policy, MergePolicy::LogonLeft);
    assert_eq!(c.data.model_path(), Path::new("data/results/threat_model.bin"));
}

#[test]
fn six_logons_without_devices_is_a_warning() {
    let pipeline = FeaturePipeline::new(AppConfig::default().features);
    let logons = EventLoader::new(EventSource::Auth)
        .parse_str(LOGONS, "logon.csv")
        .unwrap();
    let devices = EventLoader::new(EventSource::Device)
        .parse_str(DEVICES, "device.csv")
        .unwrap();

    let (_, _, merged) = pipeline.build(&logons.events, &devices.events);
    let a = merged.iter().find(|f| f.user == "A").unwrap();
    assert_eq!(a.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    assert_eq!((a.logins_per_day, a.device_connections), (6, 0));
    assert_eq!(label(a.logins_per_day, a.device_connections), ThreatLevel::Warning);

    // Device-only day for C is dropped under the default policy.
    assert!(merged.iter().all(|f| f.user != "C"));
    let b = merged.iter().find(|f| f.user == "B").unwrap();
    assert_eq!((b.logins_per_day, b.device_connections), (1, 1));
}

#[test]
fn braced_header_is_corrected_before_features() {
    let text = format!("{{id}},x,y,z,w\n{}", LOGONS);
    let loaded = EventLoader::new(EventSource::Auth)
        .parse_str(&text, "logon.csv")
        .unwrap();
    assert!(loaded.report.header_corrected);
    assert_eq!(loaded.events.len(), 8);
}

#[test]
fn preprocess_train_and_reload() {
    let (_dir, config) = workspace(LOGONS, DEVICES);

    let summary = stages::preprocess(&config).unwrap();
    assert_eq!(summary.logon_days, 2);
    assert_eq!(summary.device_days, 2);
    assert_eq!(summary.merged_rows, 2);

    let logon_days = table::read_counts(&config.data.logon_features_path(), "logins_per_day").unwrap();
    let counts: Vec<(&str, u32)> = logon_days.iter().map(|c| (c.user.as_str(), c.count)).collect();
    assert_eq!(counts, vec![("A", 6), ("B", 1)]);
    let device_days =
        table::read_counts(&config.data.device_features_path(), "device_connections").unwrap();
    assert_eq!(device_days.len(), 2);

    let merged = std::fs::read_to_string(config.data.merged_features_path()).unwrap();
    assert_eq!(
        merged,
        "user,date,logins_per_day,device_connections\nA,2024-01-01,6,0\nB,2024-01-02,1,1\n"
    );

    let eval = stages::train(&config).unwrap();
    assert_eq!(eval.samples, 2);
    assert!(!eval.held_out);

    let labeled: Vec<LabeledSample> = table::read_labeled(&config.data.labeled_features_path()).unwrap();
    assert_eq!(labeled[0].threat_level, ThreatLevel::Warning);
    assert_eq!(labeled[1].threat_level, ThreatLevel::Normal);

    let (table, classifier) = stages::load_monitor_inputs(&config).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(classifier.n_samples(), 2);

    let monitor = stages::historical_monitor(&config, table, classifier);
    let trend = monitor.trend().unwrap();
    assert_eq!(trend.series.len(), 2);
    assert_eq!(trend.delta, Some(-1.0));
}

#[test]
fn single_level_history_still_trains() {
    let logons = "id,date,user,pc,activity
1,2024-01-01 08:00:00,A,PC-1,Logon
2,2024-01-02 08:00:00,B,PC-2,Logon
";
    let (_dir, config) = workspace(logons, "id,date,user,pc,activity\n");
    stages::preprocess(&config).unwrap();

    let eval = stages::train(&config).unwrap();
    assert_eq!(eval.samples, 2);
    assert!(config.data.model_path().exists());

    let (_, classifier) = stages::load_monitor_inputs(&config).unwrap();
    assert_eq!(classifier.predict(1, 0).unwrap(), ThreatLevel::Normal);
    assert_eq!(classifier.predict(30, 12).unwrap(), ThreatLevel::Normal);
}

#[test]
fn model_file_round_trip_matches_on_training_rows() {
    let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let samples: Vec<LabeledSample> = (0..14u32)
        .flat_map(|l| (0..8u32).map(move |d| (l, d)))
        .map(|(l, d)| LabeledSample {
            user: format!("U{l}"),
            date,
            logins_per_day: l,
            device_connections: d,
            threat_level: label(l, d),
        })
        .collect();

    let config = AppConfig::default().model;
    let model = ThreatClassifier::fit(&samples, &config).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results").join("threat_model.bin");
    model.save(&path).unwrap();
    let restored = ThreatClassifier::load(&path).unwrap();

    for s in &samples {
        assert_eq!(
            model.predict(s.logins_per_day, s.device_connections).unwrap(),
            restored.predict(s.logins_per_day, s.device_connections).unwrap()
        );
    }

    // Rules are axis-aligned; the forest should reproduce nearly all of them.
    let agree = samples
        .iter()
        .filter(|s| model.predict(s.logins_per_day, s.device_connections).unwrap() == s.threat_level)
        .count();
    assert!(agree as f64 / samples.len() as f64 >= 0.9);
}

#[test]
fn preprocess_is_idempotent() {
    let (_dir, config) = workspace(LOGONS, DEVICES);
    stages::preprocess(&config).unwrap();
    let first = std::fs::read(config.data.merged_features_path()).unwrap();
    stages::preprocess(&config).unwrap();
    let second = std::fs::read(config.data.merged_features_path()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn malformed_device_source_keeps_logon_table() {
    let (_dir, config) = workspace(LOGONS, "id,date,user\n1,2024-01-01,A\n");
    let err = stages::preprocess(&config).unwrap_err();
    assert!(matches!(err, ThreatError::MalformedSource { .. }));
    assert!(config.data.logon_features_path().exists());
    assert!(!config.data.merged_features_path().exists());
}

#[test]
fn monitor_inputs_missing_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.data.processed_dir = dir.path().join("processed");
    config.data.results_dir = dir.path().join("results");

    match stages::load_monitor_inputs(&config) {
        Err(ThreatError::MissingArtifact { path, hint }) => {
            assert_eq!(path, config.data.labeled_features_path());
            assert!(hint.contains("train"));
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("monitor inputs should be missing"),
    }
    assert!(matches!(
        stages::load_classifier(&config),
        Err(ThreatError::MissingArtifact { .. })
    ));
}
