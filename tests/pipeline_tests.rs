//! End-to-end pipeline tests: idempotence, resumability, partial-failure
//! isolation, deletion semantics, and concurrency equivalence.

use anyhow::anyhow;
use permalift::ledger::{Ledger, LedgerWriter};
use permalift::pipeline::run_batch;
use permalift::remote::{ItemPayload, ItemProcessor, PriceOracle};
use permalift::{FolderOpts, Tag, UploadFolderError, UploadReceipt, WorkItem, upload_folder};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::{TempDir, tempdir};

/// Upload double: mints deterministic ids from file names, counts calls,
/// records tags, and fails any path ending in a configured suffix.
struct MockProcessor {
    calls: AtomicUsize,
    fail_suffixes: Mutex<HashSet<String>>,
    tags_seen: Mutex<Vec<Vec<Tag>>>,
}

impl MockProcessor {
    fn new() -> Arc<MockProcessor> {
        Arc::new(MockProcessor {
            calls: AtomicUsize::new(0),
            fail_suffixes: Mutex::new(HashSet::new()),
            tags_seen: Mutex::new(Vec::new()),
        })
    }

    fn failing(suffixes: &[&str]) -> Arc<MockProcessor> {
        let p = MockProcessor::new();
        *p.fail_suffixes.lock().unwrap() = suffixes.iter().map(|s| s.to_string()).collect();
        p
    }

    fn clear_failures(&self) {
        self.fail_suffixes.lock().unwrap().clear();
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ItemProcessor for MockProcessor {
    fn process(&self, payload: ItemPayload, tags: &[Tag]) -> anyhow::Result<UploadReceipt> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tags_seen.lock().unwrap().push(tags.to_vec());
        let name = match &payload {
            ItemPayload::File(p) => p
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("item")
                .to_string(),
            ItemPayload::Bytes(_) => "bytes".to_string(),
        };
        let failing = self
            .fail_suffixes
            .lock()
            .unwrap()
            .iter()
            .any(|s| name.ends_with(s.as_str()));
        if failing {
            return Err(anyhow!("transport error for {name}"));
        }
        Ok(UploadReceipt {
            id: format!("tx-{name}"),
        })
    }
}

struct FlatPrice;

impl PriceOracle for FlatPrice {
    fn price(&self, byte_count: u64) -> anyhow::Result<u128> {
        Ok(byte_count as u128)
    }

    fn base_symbol(&self) -> &str {
        "winston"
    }
}

/// Create `<tmp>/site` with the given (relative path, contents) files.
fn make_tree(files: &[(&str, &str)]) -> TempDir {
    let dir = tempdir().unwrap();
    let root = dir.path().join("site");
    fs::create_dir_all(&root).unwrap();
    for (rel, contents) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    dir
}

fn site_root(dir: &TempDir) -> PathBuf {
    dir.path().join("site")
}

fn run(
    root: &Path,
    processor: &Arc<MockProcessor>,
    opts: &FolderOpts,
) -> permalift::Result<Option<UploadReceipt>> {
    upload_folder(
        root,
        Arc::clone(processor) as Arc<dyn ItemProcessor>,
        &FlatPrice,
        opts,
    )
}

fn manifest_value(dir: &TempDir) -> serde_json::Value {
    let path = dir.path().join("site-manifest.json");
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_first_run_uploads_all_and_publishes() {
    let dir = make_tree(&[("a.txt", "aa"), ("b/c.txt", "cc"), ("d.bin", "dd")]);
    let processor = MockProcessor::new();
    let receipt = run(&site_root(&dir), &processor, &FolderOpts::default())
        .unwrap()
        .unwrap();

    // 3 files + the manifest itself.
    assert_eq!(processor.calls(), 4);
    assert_eq!(receipt.id, "tx-site-manifest.json");

    let ledger = Ledger::load(&dir.path().join("site-ledger.csv")).unwrap();
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger.get("a.txt"), Some("tx-a.txt"));
    assert_eq!(ledger.get("b/c.txt"), Some("tx-c.txt"));

    let value = manifest_value(&dir);
    assert_eq!(value["paths"]["a.txt"]["id"], "tx-a.txt");
    assert_eq!(value["paths"]["b/c.txt"]["id"], "tx-c.txt");
    assert_eq!(value["paths"]["d.bin"]["id"], "tx-d.bin");

    let receipt_file = dir.path().join("site-id.json");
    let cached: UploadReceipt =
        serde_json::from_str(&fs::read_to_string(receipt_file).unwrap()).unwrap();
    assert_eq!(cached, receipt);
}

#[test]
fn test_second_run_is_noop() {
    let dir = make_tree(&[("a.txt", "aa"), ("b.txt", "bb")]);
    let processor = MockProcessor::new();
    let opts = FolderOpts::default();

    let first = run(&site_root(&dir), &processor, &opts).unwrap().unwrap();
    let calls_after_first = processor.calls();

    let second = run(&site_root(&dir), &processor, &opts).unwrap().unwrap();
    assert_eq!(second, first);
    // True no-op: zero uploads on the second run.
    assert_eq!(processor.calls(), calls_after_first);
}

#[test]
fn test_partial_failure_keeps_siblings_and_suppresses_manifest() {
    let dir = make_tree(&[
        ("f1.txt", "1"),
        ("f2.txt", "2"),
        ("f3.txt", "3"),
        ("f4.txt", "4"),
        ("f5.txt", "5"),
    ]);
    let processor = MockProcessor::failing(&["f3.txt"]);
    let err = run(&site_root(&dir), &processor, &FolderOpts::default()).unwrap_err();

    match err.downcast_ref::<UploadFolderError>() {
        Some(UploadFolderError::ItemFailures { failed, report }) => {
            assert_eq!(*failed, 1);
            assert!(report.ends_with("site-errors.txt"));
        }
        other => panic!("expected ItemFailures, got {other:?}"),
    }

    // The other four are durably recorded.
    let ledger = Ledger::load(&dir.path().join("site-ledger.csv")).unwrap();
    assert_eq!(ledger.len(), 4);
    assert!(!ledger.contains("f3.txt"));

    // No manifest, no receipt.
    assert!(!dir.path().join("site-manifest.json").exists());
    assert!(!dir.path().join("site-id.json").exists());

    // Report: one batch header plus exactly one failure line.
    let report = fs::read_to_string(dir.path().join("site-errors.txt")).unwrap();
    assert_eq!(report.lines().count(), 2);
    assert!(report.lines().next().unwrap().starts_with("Errors from upload at "));
    assert!(report.contains("f3.txt"));
}

#[test]
fn test_resumability_after_partial_failure() {
    let dir = make_tree(&[
        ("f1.txt", "1"),
        ("f2.txt", "2"),
        ("f3.txt", "3"),
        ("f4.txt", "4"),
        ("f5.txt", "5"),
    ]);
    let processor = MockProcessor::failing(&["f3.txt"]);
    run(&site_root(&dir), &processor, &FolderOpts::default()).unwrap_err();
    let calls_after_first = processor.calls();

    processor.clear_failures();
    let receipt = run(&site_root(&dir), &processor, &FolderOpts::default())
        .unwrap()
        .unwrap();
    assert_eq!(receipt.id, "tx-site-manifest.json");
    // Exactly the one remaining file plus the manifest.
    assert_eq!(processor.calls(), calls_after_first + 2);

    let value = manifest_value(&dir);
    for rel in ["f1.txt", "f2.txt", "f3.txt", "f4.txt", "f5.txt"] {
        assert_eq!(value["paths"][rel]["id"], format!("tx-{rel}"));
    }
}

#[test]
fn test_deleted_file_dropped_without_retention() {
    let dir = make_tree(&[("a.txt", "aa"), ("b.txt", "bb")]);
    let processor = MockProcessor::new();
    let opts = FolderOpts {
        keep_deleted: false,
        ..Default::default()
    };
    run(&site_root(&dir), &processor, &opts).unwrap();

    fs::remove_file(site_root(&dir).join("a.txt")).unwrap();
    run(&site_root(&dir), &processor, &opts).unwrap();

    let value = manifest_value(&dir);
    assert!(value["paths"].get("a.txt").is_none());
    assert_eq!(value["paths"]["b.txt"]["id"], "tx-b.txt");

    // The ledger itself is append-only; the record is still there.
    let ledger = Ledger::load(&dir.path().join("site-ledger.csv")).unwrap();
    assert!(ledger.contains("a.txt"));
}

#[test]
fn test_deleted_file_retained_with_retention() {
    let dir = make_tree(&[("a.txt", "aa"), ("b.txt", "bb")]);
    let processor = MockProcessor::new();
    let opts = FolderOpts::default(); // keep_deleted = true

    let first = run(&site_root(&dir), &processor, &opts).unwrap().unwrap();
    let calls_after_first = processor.calls();

    fs::remove_file(site_root(&dir).join("a.txt")).unwrap();
    // Nothing new and the gone entry is retained: a no-op run.
    let second = run(&site_root(&dir), &processor, &opts).unwrap().unwrap();
    assert_eq!(second, first);
    assert_eq!(processor.calls(), calls_after_first);

    let value = manifest_value(&dir);
    assert_eq!(value["paths"]["a.txt"]["id"], "tx-a.txt");
}

#[test]
fn test_empty_dir_with_prior_receipt_short_circuits() {
    let dir = make_tree(&[]);
    fs::write(
        dir.path().join("site-id.json"),
        r#"{"id":"tx-prior"}"#,
    )
    .unwrap();
    let processor = MockProcessor::new();
    let receipt = run(&site_root(&dir), &processor, &FolderOpts::default())
        .unwrap()
        .unwrap();
    assert_eq!(receipt.id, "tx-prior");
    assert_eq!(processor.calls(), 0);
}

#[test]
fn test_empty_dir_without_receipt_returns_none() {
    let dir = make_tree(&[]);
    let processor = MockProcessor::new();
    let receipt = run(&site_root(&dir), &processor, &FolderOpts::default()).unwrap();
    assert!(receipt.is_none());
    assert_eq!(processor.calls(), 0);
}

#[test]
fn test_missing_root_is_access_error() {
    let dir = tempdir().unwrap();
    let processor = MockProcessor::new();
    let err = run(
        &dir.path().join("does-not-exist"),
        &processor,
        &FolderOpts::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<UploadFolderError>(),
        Some(UploadFolderError::Access { .. })
    ));
    assert_eq!(processor.calls(), 0);
}

#[test]
fn test_confirmation_declined_uploads_nothing() {
    let dir = make_tree(&[("a.txt", "aa")]);
    let processor = MockProcessor::new();
    let confirm: permalift::ConfirmFn = Arc::new(|_: &str| false);
    let opts = FolderOpts {
        interactive_preflight: true,
        confirm: Some(confirm),
        ..Default::default()
    };
    let err = run(&site_root(&dir), &processor, &opts).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<UploadFolderError>(),
        Some(UploadFolderError::ConfirmationDeclined)
    ));
    assert_eq!(processor.calls(), 0);
    let ledger = Ledger::load(&dir.path().join("site-ledger.csv")).unwrap();
    assert!(ledger.is_empty());
}

#[test]
fn test_manifest_uploaded_with_manifest_tags() {
    let dir = make_tree(&[("a.txt", "aa")]);
    let processor = MockProcessor::new();
    let opts = FolderOpts {
        manifest_tags: vec![Tag::new("App-Name", "permalift-tests")],
        ..Default::default()
    };
    run(&site_root(&dir), &processor, &opts).unwrap();

    let tags_seen = processor.tags_seen.lock().unwrap();
    let manifest_call = tags_seen
        .iter()
        .find(|tags| tags.iter().any(|t| t.name == "Type" && t.value == "manifest"))
        .expect("manifest upload call");
    assert!(
        manifest_call
            .iter()
            .any(|t| t.name == "App-Name" && t.value == "permalift-tests")
    );
}

#[test]
fn test_index_file_recorded_in_manifest() {
    let dir = make_tree(&[("index.html", "<html></html>"), ("a.txt", "aa")]);
    let processor = MockProcessor::new();
    let opts = FolderOpts {
        index_file: Some("index.html".to_string()),
        ..Default::default()
    };
    run(&site_root(&dir), &processor, &opts).unwrap();

    let value = manifest_value(&dir);
    assert_eq!(value["index"]["path"], "index.html");
}

#[test]
fn test_concurrency_one_and_twenty_agree() {
    let files: Vec<(String, String)> = (0..100)
        .map(|i| (format!("f{i:03}.txt"), format!("contents {i}")))
        .collect();
    let borrowed: Vec<(&str, &str)> = files
        .iter()
        .map(|(p, c)| (p.as_str(), c.as_str()))
        .collect();

    let mut ledgers = Vec::new();
    for batch_size in [1_usize, 20] {
        let dir = make_tree(&borrowed);
        let processor = MockProcessor::new();
        let opts = FolderOpts {
            batch_size,
            ..Default::default()
        };
        run(&site_root(&dir), &processor, &opts).unwrap();
        let ledger = Ledger::load(&dir.path().join("site-ledger.csv")).unwrap();
        let pairs: Vec<(String, String)> = {
            let mut v: Vec<_> = ledger
                .keys()
                .map(|k| (k.to_string(), ledger.get(k).unwrap().to_string()))
                .collect();
            v.sort();
            v
        };
        ledgers.push(pairs);
    }
    assert_eq!(ledgers[0].len(), 100);
    // Same final (path, id) set regardless of worker count.
    assert_eq!(ledgers[0], ledgers[1]);
}

#[test]
fn test_run_batch_empty_is_immediate() {
    let dir = tempdir().unwrap();
    let writer = LedgerWriter::spawn(Ledger::load(&dir.path().join("l.csv")).unwrap());
    let processor = MockProcessor::new();
    let outcome = run_batch(
        Vec::new(),
        10,
        Arc::clone(&processor) as Arc<dyn ItemProcessor>,
        writer.appender(),
        None,
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();
    assert!(outcome.succeeded.is_empty());
    assert!(outcome.failed.is_empty());
    assert_eq!(processor.calls(), 0);
    writer.close().unwrap();
}

#[test]
fn test_run_batch_progress_cadence() {
    let dir = tempdir().unwrap();
    let writer = LedgerWriter::spawn(Ledger::load(&dir.path().join("l.csv")).unwrap());
    let processor = MockProcessor::new();
    let items: Vec<WorkItem> = (0..25)
        .map(|i| WorkItem {
            abs_path: PathBuf::from(format!("/virtual/f{i:02}.txt")),
            rel_path: format!("f{i:02}.txt"),
            size: 1,
        })
        .collect();

    let reported: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let reported_sink = Arc::clone(&reported);
    let on_progress: permalift::ProgressFn =
        Arc::new(move |n| reported_sink.lock().unwrap().push(n));

    let outcome = run_batch(
        items,
        10,
        Arc::clone(&processor) as Arc<dyn ItemProcessor>,
        writer.appender(),
        Some(on_progress),
        Arc::new(AtomicBool::new(false)),
    )
    .unwrap();
    writer.close().unwrap();

    assert_eq!(outcome.succeeded.len(), 25);
    let mut counts = reported.lock().unwrap().clone();
    counts.sort();
    // Every batch_size completions, regardless of which worker crossed the line.
    assert_eq!(counts, vec![10, 20]);
}
