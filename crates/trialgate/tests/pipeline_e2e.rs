//! End-to-end tests for the validation pipeline: real files, a real SQLite
//! seen-store and a real ledger, all inside a temp directory.

use chrono::Local;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use trialgate::{
    bucket_dir, process_folder, FileOutcome, Pipeline, PipelineConfig, RunSummary,
    TrialgateConfig,
};

const HEADER: &str =
    "batch_id,timestamp,reading1,reading2,reading3,reading4,reading5,reading6,reading7,reading8,reading9,reading10";

struct TestEnv {
    _dir: TempDir,
    root: PathBuf,
    settings: TrialgateConfig,
}

impl TestEnv {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let settings = TrialgateConfig {
            incoming_dir: root.join("data/incoming"),
            archive_dir: root.join("data/archive"),
            rejected_dir: root.join("data/rejected"),
            ledger_path: root.join("logs/errors.jsonl"),
            database_path: root.join("app/seen.db"),
            sample_dir: root.join("samples"),
            log_dir: root.join("logs"),
        };
        settings.ensure_dirs().unwrap();
        Self {
            _dir: dir,
            root,
            settings,
        }
    }

    fn incoming(&self) -> &Path {
        &self.settings.incoming_dir
    }

    fn drop_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.incoming().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn pipeline(&self, config: PipelineConfig) -> Pipeline {
        Pipeline::open(&self.settings, config).unwrap()
    }

    fn run(&self, config: PipelineConfig) -> RunSummary {
        let pipeline = self.pipeline(config);
        process_folder(&pipeline, self.incoming()).unwrap().summary
    }

    fn ledger(&self) -> Vec<Value> {
        fs::read_to_string(&self.settings.ledger_path)
            .unwrap_or_default()
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).expect("ledger line is JSON"))
            .collect()
    }

    fn rejected_today(&self, name: &str) -> PathBuf {
        bucket_dir(&self.settings.rejected_dir, Local::now().date_naive()).join(name)
    }

    fn seen_count(&self) -> u64 {
        self.pipeline(PipelineConfig::default())
            .tracker()
            .count()
            .unwrap()
    }
}

fn row(batch_id: &str, reading3: &str) -> String {
    format!("{batch_id},12:00:00,0.1,0.1,{reading3},0.1,0.1,0.1,0.1,0.1,0.1,0.1")
}

fn csv_file(rows: &[String]) -> String {
    let mut content = format!("{HEADER}\n");
    for r in rows {
        content.push_str(r);
        content.push('\n');
    }
    content
}

fn summary(total: u64, valid: u64, invalid: u64) -> RunSummary {
    RunSummary {
        total,
        valid,
        invalid,
    }
}

/// Ledger records minus the fields that differ on every write.
fn stable(records: &[Value]) -> Vec<Value> {
    records
        .iter()
        .map(|r| {
            let mut r = r.clone();
            let obj = r.as_object_mut().unwrap();
            obj.remove("guid");
            obj.remove("occurred_at");
            r
        })
        .collect()
}

#[test]
fn test_accepts_and_archives_by_filename_date() {
    let env = TestEnv::new();
    let content = csv_file(&[row("1", "0.1")]);
    let src = env.drop_file("MED_DATA_20240101120000.csv", &content);

    assert_eq!(env.run(PipelineConfig::default()), summary(1, 1, 0));

    let archived = env
        .settings
        .archive_dir
        .join("2024/01/01/MED_DATA_20240101120000.csv");
    assert!(!src.exists());
    assert_eq!(fs::read_to_string(&archived).unwrap(), content);

    let pipeline = env.pipeline(PipelineConfig::default());
    let digest = trialgate_hash::sha256(content.as_bytes());
    let record = pipeline.tracker().record(&digest).unwrap().unwrap();
    assert_eq!(record.filename, "MED_DATA_20240101120000.csv");
    assert_eq!(pipeline.tracker().count().unwrap(), 1);
    assert!(env.ledger().is_empty());
}

#[test]
fn test_resubmission_under_new_name_is_rejected() {
    let env = TestEnv::new();
    let content = csv_file(&[row("1", "0.1")]);
    let digest = trialgate_hash::sha256(content.as_bytes());

    env.drop_file("MED_DATA_20240101120000.csv", &content);
    assert_eq!(env.run(PipelineConfig::default()), summary(1, 1, 0));

    env.drop_file("MED_DATA_20240102120000.csv", &content);
    assert_eq!(env.run(PipelineConfig::default()), summary(1, 0, 1));

    assert!(env.rejected_today("MED_DATA_20240102120000.csv").exists());
    assert_eq!(env.seen_count(), 1);

    let ledger = env.ledger();
    assert_eq!(ledger.len(), 1);
    let record = &ledger[0];
    assert_eq!(record["rule"], "file_uniqueness");
    assert_eq!(record["message"], "duplicate file (sha256)");
    assert_eq!(record["row"], Value::Null);
    assert_eq!(record["filename"], "MED_DATA_20240102120000.csv");
    assert_eq!(record["sha256"], digest.as_str());
    assert_eq!(record["meta"]["sha256"], digest.as_str());
    assert_eq!(record["meta"]["filename_timestamp"], "20240102120000");
    assert_eq!(record["meta"]["filename_datetime"], "2024-01-02T12:00:00");
}

#[test]
fn test_reading_out_of_range_cites_row() {
    let env = TestEnv::new();
    env.drop_file(
        "MED_DATA_20240101120000.csv",
        &csv_file(&[row("1", "0.1"), row("2", "10.0"), row("3", "0.1")]),
    );

    assert_eq!(env.run(PipelineConfig::default()), summary(1, 0, 1));

    let ledger = env.ledger();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0]["rule"], "value_domain");
    assert_eq!(ledger[0]["message"], "reading3 out of range: 10.0");
    assert_eq!(ledger[0]["row"], 3);
    assert!(env.rejected_today("MED_DATA_20240101120000.csv").exists());
    assert_eq!(env.seen_count(), 0);
}

#[test]
fn test_duplicate_batch_id_cites_second_occurrence() {
    let env = TestEnv::new();
    env.drop_file(
        "MED_DATA_20240101120000.csv",
        &csv_file(&[row("3", "0.1"), row("4", "0.1"), row("3", "0.2")]),
    );

    assert_eq!(env.run(PipelineConfig::default()), summary(1, 0, 1));

    let ledger = env.ledger();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0]["rule"], "duplicate_batch_id");
    assert_eq!(ledger[0]["message"], "duplicate batch_id: 3");
    assert_eq!(ledger[0]["row"], 4);
}

#[test]
fn test_chain_short_circuits_at_header() {
    let env = TestEnv::new();
    let content = "batch_id,time,reading1,reading2,reading3,reading4,reading5,reading6,reading7,reading8,reading9,reading10\n\
                   -1,bad,99,99,99,99,99,99,99,99,99,99\n";
    env.drop_file("MED_DATA_20240101120000.csv", content);

    assert_eq!(env.run(PipelineConfig::default()), summary(1, 0, 1));

    let ledger = env.ledger();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0]["rule"], "header_check");
    assert!(ledger[0]["message"]
        .as_str()
        .unwrap()
        .starts_with("header mismatch: ['batch_id', 'time', "));
}

#[test]
fn test_row_shape_reports_every_bad_row() {
    let env = TestEnv::new();
    env.drop_file(
        "MED_DATA_20240101120000.csv",
        &csv_file(&["1,12:00:00".to_string(), row("2", "0.1"), "3,12:00:00,0.1".to_string()]),
    );

    env.run(PipelineConfig::default());

    let rows: Vec<(String, u64)> = env
        .ledger()
        .iter()
        .map(|r| (r["message"].as_str().unwrap().to_string(), r["row"].as_u64().unwrap()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("row has 2 cols".to_string(), 2),
            ("row has 3 cols".to_string(), 4),
        ]
    );
}

#[test]
fn test_blank_line_is_rejected_as_empty_row() {
    let env = TestEnv::new();
    env.drop_file(
        "MED_DATA_20240101120000.csv",
        &format!("{HEADER}\n\n{}\n", row("1", "10.0")),
    );

    assert_eq!(env.run(PipelineConfig::default()), summary(1, 0, 1));

    let ledger = env.ledger();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0]["rule"], "row_shape");
    assert_eq!(ledger[0]["message"], "row has 0 cols");
    assert_eq!(ledger[0]["row"], 2);
    assert!(env.rejected_today("MED_DATA_20240101120000.csv").exists());
    assert_eq!(env.seen_count(), 0);
}

#[test]
fn test_bad_filename_rejected_despite_good_content() {
    let env = TestEnv::new();
    env.drop_file("trial_data.csv", &csv_file(&[row("1", "0.1")]));

    assert_eq!(env.run(PipelineConfig::default()), summary(1, 0, 1));

    let ledger = env.ledger();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0]["rule"], "filename_format");
    assert_eq!(ledger[0]["message"], "invalid filename format");
    assert_eq!(ledger[0]["meta"], serde_json::json!({}));
    assert!(env.rejected_today("trial_data.csv").exists());
}

#[test]
fn test_dry_run_is_repeatable_and_side_effect_free() {
    let env = TestEnv::new();
    let good = env.drop_file("MED_DATA_20240101120000.csv", &csv_file(&[row("1", "0.1")]));
    let bad = env.drop_file(
        "MED_DATA_20240101130000.csv",
        &csv_file(&[row("1", "11"), row("0", "0.1")]),
    );
    let dry = PipelineConfig {
        dry_run: true,
        ..PipelineConfig::default()
    };

    assert_eq!(env.run(dry.clone()), summary(2, 1, 1));
    let first = stable(&env.ledger());

    assert_eq!(env.run(dry), summary(2, 1, 1));
    let all = stable(&env.ledger());

    assert_eq!(first.len(), 2);
    assert_eq!(all.len(), 4);
    assert_eq!(&all[..2], &all[2..]);

    assert!(good.exists());
    assert!(bad.exists());
    assert_eq!(env.seen_count(), 0);
    assert_eq!(fs::read_dir(&env.settings.archive_dir).unwrap().count(), 0);
    assert_eq!(fs::read_dir(&env.settings.rejected_dir).unwrap().count(), 0);
}

#[test]
fn test_no_move_records_digest_but_leaves_files() {
    let env = TestEnv::new();
    let src = env.drop_file("MED_DATA_20240101120000.csv", &csv_file(&[row("1", "0.1")]));
    let no_move = PipelineConfig {
        no_move: true,
        ..PipelineConfig::default()
    };

    assert_eq!(env.run(no_move.clone()), summary(1, 1, 0));
    assert!(src.exists());
    assert_eq!(env.seen_count(), 1);

    // Same file again is now a known digest.
    assert_eq!(env.run(no_move), summary(1, 0, 1));
    assert!(src.exists());
    assert_eq!(env.ledger()[0]["rule"], "file_uniqueness");
}

#[test]
fn test_check_fault_leaves_file_in_place() {
    let env = TestEnv::new();
    // The first two records parse; the invalid UTF-8 further down only
    // surfaces when the row-shape check reads the whole file.
    let mut bytes = csv_file(&[row("1", "0.1")]).into_bytes();
    bytes.extend_from_slice(b"2,12:00:00,\xff\xfe,0.1,0.1,0.1,0.1,0.1,0.1,0.1,0.1,0.1\n");
    let src = env.incoming().join("MED_DATA_20240101120000.csv");
    fs::write(&src, bytes).unwrap();

    let pipeline = env.pipeline(PipelineConfig::default());
    match pipeline.process_file(&src).unwrap() {
        FileOutcome::Errored { check, message } => {
            assert_eq!(check, "row_shape");
            assert!(message.starts_with("validator exception in row_shape: "));
        }
        other => panic!("expected check fault, got {other:?}"),
    }

    assert!(src.exists());
    let ledger = env.ledger();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0]["rule"], "validator_error");
    assert_eq!(env.seen_count(), 0);
}

#[test]
fn test_archive_path_override() {
    let env = TestEnv::new();
    env.drop_file("MED_DATA_20231231235959.csv", &csv_file(&[row("1", "0.1")]));
    let elsewhere = env.root.join("cold-storage");

    let config = PipelineConfig {
        archive_path: Some(elsewhere.clone()),
        ..PipelineConfig::default()
    };
    assert_eq!(env.run(config), summary(1, 1, 0));
    assert!(elsewhere
        .join("2023/12/31/MED_DATA_20231231235959.csv")
        .exists());
}

#[test]
fn test_mixed_folder_counts_and_order() {
    let env = TestEnv::new();
    env.drop_file("MED_DATA_20240103120000.csv", &csv_file(&[row("1", "0.1")]));
    env.drop_file("MED_DATA_20240101120000.csv", &csv_file(&[row("2", "0.1")]));
    env.drop_file("MED_DATA_20240102120000.csv", "");
    fs::create_dir(env.incoming().join("subdir")).unwrap();

    let pipeline = env.pipeline(PipelineConfig::default());
    let run = process_folder(&pipeline, env.incoming()).unwrap();

    let names: Vec<&str> = run.reports.iter().map(|r| r.filename.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "MED_DATA_20240101120000.csv",
            "MED_DATA_20240102120000.csv",
            "MED_DATA_20240103120000.csv",
        ]
    );
    assert_eq!(run.summary, summary(3, 2, 1));
    assert_eq!(env.ledger()[0]["message"], "file is empty");
    assert!(env.incoming().join("subdir").is_dir());
}
