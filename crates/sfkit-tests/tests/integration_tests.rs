//! Integration tests for sfkit
//!
//! These tests drive the engine the way an installer does: place a staged
//! bundle, retire the previous install, and recover from interruptions.

use futures::StreamExt;
use sfkit_config::ConfigLoader;
use rstest::rstest;
use sfkit_engine::{progress_channel, subprogress, DittoOptions, Engine, EngineBuilder, EngineSlot};
use sfkit_tests::test_utils::{assert_mirrored, snapshot, ProgressRecorder, TestTree};
use sfkit_types::{EngineConfig, ErrorKind, Operation};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::timeout;

fn engine() -> Engine {
    EngineBuilder::new().concurrency_limit(4).build().unwrap()
}

#[tokio::test]
async fn test_install_then_retire_previous_version() {
    let temp_dir = TempDir::new().unwrap();
    let staging = temp_dir.path().join("staging");
    let old_install = temp_dir.path().join("apps/game-1.0");
    let new_install = temp_dir.path().join("apps/game-1.1");
    TestTree::app_bundle().build(&staging).unwrap();
    TestTree::app_bundle()
        .file("saves/slot1.dat", b"old save".to_vec())
        .build(&old_install)
        .unwrap();

    let engine = engine();
    let recorder = ProgressRecorder::new();

    let placed = engine
        .ditto(
            &staging,
            &new_install,
            DittoOptions::new().on_progress(subprogress(recorder.callback(), 0.0, 80.0)),
        )
        .await
        .unwrap();
    let removed = engine
        .wipe_with_progress(&old_install, subprogress(recorder.callback(), 80.0, 100.0))
        .await
        .unwrap();

    assert_mirrored(&staging, &new_install);
    assert!(!old_install.exists());
    assert_eq!(placed.files, 5);
    assert_eq!(removed.files, 6);

    let events = recorder.events();
    assert!(recorder.is_monotonic());
    assert!(events.iter().all(|event| (0.0..=100.0).contains(&event.percent)));
    assert!(events.iter().any(|event| (event.percent - 80.0).abs() < 1e-9));
    assert!((recorder.last().unwrap().percent - 100.0).abs() < 1e-9);
}

#[rstest]
#[case::copy(Operation::Copy)]
#[case::rename(Operation::Move)]
#[tokio::test]
async fn test_ditto_is_additive(#[case] operation: Operation) {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    TestTree::app_bundle().build(&src).unwrap();
    let expected = snapshot(&src).unwrap();
    TestTree::new()
        .file("README.txt", b"stale".to_vec())
        .file("user/settings.ini", b"volume=3".to_vec())
        .dir("cache")
        .build(&dst)
        .unwrap();

    engine()
        .ditto(&src, &dst, DittoOptions::new().operation(operation))
        .await
        .unwrap();

    let placed = snapshot(&dst).unwrap();
    for (relative, entry) in &expected {
        assert_eq!(placed.get(relative), Some(entry), "{}", relative.display());
    }
    assert_eq!(fs::read(dst.join("user/settings.ini")).unwrap(), b"volume=3");
    assert!(dst.join("cache").is_dir());
}

#[tokio::test]
async fn test_interrupted_wipe_can_be_retried() {
    let temp_dir = TempDir::new().unwrap();
    let target = temp_dir.path().join("install");
    TestTree::app_bundle().build(&target).unwrap();

    // Simulate a previous run that got partway through
    fs::remove_file(target.join("bin/game")).unwrap();
    fs::remove_dir_all(target.join("lib/plugins")).unwrap();

    let engine = engine();
    engine.wipe(&target).await.unwrap();
    assert!(!engine.exists(&target).await.unwrap());

    engine.wipe(&target).await.unwrap();
    assert!(!target.exists());
}

#[tokio::test]
async fn test_interrupted_ditto_can_be_retried() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    TestTree::app_bundle().build(&src).unwrap();

    // Half-written destination from an earlier attempt
    TestTree::new()
        .file("bin/game", b"trunc".to_vec())
        .build(&dst)
        .unwrap();

    let engine = engine();
    engine.ditto(&src, &dst, DittoOptions::new()).await.unwrap();
    engine.ditto(&src, &dst, DittoOptions::new()).await.unwrap();

    assert_eq!(snapshot(&src).unwrap(), snapshot(&dst).unwrap());
}

#[tokio::test]
async fn test_move_places_files_by_rename() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("download");
    let dst = temp_dir.path().join("install");
    TestTree::app_bundle().build(&src).unwrap();
    let expected = snapshot(&src).unwrap();

    let stats = engine()
        .ditto(&src, &dst, DittoOptions::new().operation(Operation::Move))
        .await
        .unwrap();

    assert_eq!(snapshot(&dst).unwrap(), expected);
    assert_eq!(stats.files, 5);
    assert!(!src.join("bin/game").exists());
    assert!(!src.join(".meta/receipt.json").exists());
}

#[tokio::test]
async fn test_ditto_missing_source_fails_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let err = engine()
        .ditto(
            temp_dir.path().join("nowhere"),
            temp_dir.path().join("dst"),
            DittoOptions::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(!temp_dir.path().join("dst").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinks_are_mirrored_verbatim() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    TestTree::new()
        .file("x.txt", b"I'm x".to_vec())
        .symlink("link", "x.txt")
        .file("lib/libfoo.so.1", b"elf".to_vec())
        .symlink("lib/libfoo.so", "libfoo.so.1")
        .build(&src)
        .unwrap();

    // A regular file in the way is replaced by the link
    TestTree::new()
        .file("link", b"not a link".to_vec())
        .build(&dst)
        .unwrap();

    let stats = engine().ditto(&src, &dst, DittoOptions::new()).await.unwrap();

    assert_eq!(stats.symlinks, 2);
    assert_eq!(fs::read_link(dst.join("link")).unwrap(), Path::new("x.txt"));
    assert_eq!(fs::read(dst.join("link")).unwrap(), b"I'm x");
    assert_eq!(
        fs::read_link(dst.join("lib/libfoo.so")).unwrap(),
        Path::new("libfoo.so.1")
    );
}

#[tokio::test]
async fn test_progress_stream_alongside_ditto() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    let mut tree = TestTree::new();
    for i in 0..40 {
        tree = tree.file(format!("chunk/{:02}.bin", i), vec![i as u8; 512]);
    }
    tree.build(&src).unwrap();

    let (callback, stream) = progress_channel();
    let collector = tokio::spawn(stream.collect::<Vec<_>>());

    engine()
        .ditto(&src, &dst, DittoOptions::new().on_progress(callback))
        .await
        .unwrap();

    let events = timeout(Duration::from_secs(10), collector)
        .await
        .expect("progress stream should end once ditto returns")
        .unwrap();
    assert_eq!(events.len(), 40);
    assert!(events.windows(2).all(|w| w[0].done < w[1].done));
    assert!(events.last().unwrap().is_complete());
}

#[tokio::test]
async fn test_config_file_drives_engine() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("sfkit.yaml");
    fs::write(
        &config_path,
        "engine:\n  concurrency_limit: 2\n  ignore_patterns:\n    - \"**/*.tmp\"\n",
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&config_path).unwrap();
    let engine = Engine::from_config(&config).unwrap();
    assert_eq!(engine.config().concurrency_limit.get(), 2);

    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    TestTree::new()
        .file("keep.dat", b"keep".to_vec())
        .file("scratch.tmp", b"drop".to_vec())
        .file("nested/also.tmp", b"drop".to_vec())
        .build(&src)
        .unwrap();

    let stats = engine.ditto(&src, &dst, DittoOptions::new()).await.unwrap();

    assert_eq!(stats.files, 1);
    assert!(dst.join("keep.dat").exists());
    assert!(!dst.join("scratch.tmp").exists());
    assert!(!dst.join("nested/also.tmp").exists());
}

#[tokio::test]
async fn test_skip_predicate_with_default_ignores() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    TestTree::app_bundle()
        .file(".Trashes/501/junk", b"junk".to_vec())
        .build(&src)
        .unwrap();

    let engine = Engine::new(EngineConfig::default()).unwrap();
    let stats = engine
        .ditto(
            &src,
            &dst,
            DittoOptions::new().should_skip(|relative| relative.starts_with(".meta")),
        )
        .await
        .unwrap();

    assert_eq!(stats.files, 4);
    assert_eq!(stats.skipped, 1);
    assert!(!dst.join(".Trashes").exists());
    assert!(!dst.join(".meta/receipt.json").exists());
    assert!(dst.join("bin/game").exists());
}

#[tokio::test]
async fn test_concurrent_operations_on_unrelated_trees() {
    let temp_dir = TempDir::new().unwrap();
    let engine = engine();

    let roots: Vec<_> = (0..3)
        .map(|i| {
            let src = temp_dir.path().join(format!("src{}", i));
            TestTree::app_bundle().build(&src).unwrap();
            (src, temp_dir.path().join(format!("dst{}", i)))
        })
        .collect();
    let retired = temp_dir.path().join("retired");
    TestTree::app_bundle().build(&retired).unwrap();

    let (a, b, c, w) = tokio::join!(
        engine.ditto(&roots[0].0, &roots[0].1, DittoOptions::new()),
        engine.ditto(&roots[1].0, &roots[1].1, DittoOptions::new()),
        engine.ditto(&roots[2].0, &roots[2].1, DittoOptions::new()),
        engine.wipe(&retired),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();
    w.unwrap();

    for (src, dst) in &roots {
        assert_mirrored(src, dst);
    }
    assert!(!retired.exists());
}

#[tokio::test]
async fn test_engine_slot_lifecycle() {
    let slot = EngineSlot::new();
    assert_eq!(slot.get().unwrap_err().kind(), ErrorKind::Uninitialized);

    slot.install(engine()).unwrap();
    assert!(slot.is_installed());
    assert!(slot.install(engine()).is_err());

    let temp_dir = TempDir::new().unwrap();
    assert!(slot.get().unwrap().exists(temp_dir.path()).await.unwrap());
}

#[tokio::test]
async fn test_enumerate_matches_placed_tree() {
    let temp_dir = TempDir::new().unwrap();
    let src = temp_dir.path().join("src");
    let dst = temp_dir.path().join("dst");
    TestTree::app_bundle().build(&src).unwrap();

    let engine = engine();
    engine.ditto(&src, &dst, DittoOptions::new()).await.unwrap();

    let source_listing = engine.enumerate(&src).await.unwrap();
    let placed_listing = engine.enumerate(&dst).await.unwrap();
    assert_eq!(source_listing.directories, placed_listing.directories);
    let paths = |listing: &sfkit_types::TreeListing| {
        listing
            .entries
            .iter()
            .map(|entry| (entry.path.clone(), entry.stat.kind, entry.stat.size))
            .collect::<Vec<_>>()
    };
    assert_eq!(paths(&source_listing), paths(&placed_listing));
    assert!(placed_listing.contains("share/empty"));
}
