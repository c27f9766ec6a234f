mod fixtures;

use chrono::Local;
use image::DynamicImage;

use autoquest::error::Fault;
use autoquest::sim::SimWorld;
use autoquest::snapshot::SnapshotWriter;
use autoquest::task::{Task, TaskStatus};

use fixtures::{FaultingMission, test_config};

#[test]
fn four_channel_frame_is_flattened_to_three() {
    let dir = tempfile::tempdir().unwrap();
    let writer = SnapshotWriter::new(dir.path());

    let frame = DynamicImage::new_rgba8(8, 8);
    assert!(frame.color().has_alpha());

    let path = writer
        .save(&frame, "page mismatch: page_main", Local::now())
        .expect("snapshot written");

    assert!(path.exists());
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("jpg"));

    let persisted = image::open(&path).unwrap();
    assert_eq!(persisted.color().channel_count(), 3);
}

#[test]
fn three_channel_frame_is_written_as_is() {
    let dir = tempfile::tempdir().unwrap();
    let writer = SnapshotWriter::new(dir.path());

    let path = writer
        .save(&DynamicImage::new_rgb8(8, 8), "stuck", Local::now())
        .expect("snapshot written");
    assert_eq!(image::open(&path).unwrap().color().channel_count(), 3);
}

#[test]
fn snapshot_lands_in_a_per_day_directory() {
    let dir = tempfile::tempdir().unwrap();
    let writer = SnapshotWriter::new(dir.path());

    let now = Local::now();
    let path = writer
        .save(&DynamicImage::new_rgb8(4, 4), "label", now)
        .unwrap();

    let day_dir = path.parent().unwrap();
    assert_eq!(
        day_dir.file_name().unwrap().to_str().unwrap(),
        now.format("%Y-%m-%d").to_string()
    );
    assert_eq!(day_dir.parent().unwrap(), dir.path());
}

#[test]
fn write_failure_is_swallowed() {
    // Root is a regular file; directory creation must fail.
    let file = tempfile::NamedTempFile::new().unwrap();
    let writer = SnapshotWriter::new(file.path());

    let result = writer.save(&DynamicImage::new_rgb8(4, 4), "label", Local::now());
    assert!(result.is_none());
}

/// A capture-tagged fatal fault leaves a timestamped artifact and the task
/// still resolves through the normal fatal path.
#[tokio::test]
async fn capture_tagged_fault_persists_an_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.snapshot.root_dir = dir.path().to_string_lossy().into_owned();

    let world = SimWorld::shared();
    let mut task = Task::new("capture", world.interactor(), &config);
    task.add_subordinate(
        Box::new(FaultingMission::new(
            Fault::fatal("unexpected page").with_capture(),
        )),
        false,
    );

    let status = task.start().await;
    assert_eq!(status, TaskStatus::StoppedFatal);

    let day_dir = dir
        .path()
        .join(Local::now().format("%Y-%m-%d").to_string());
    let artifacts: Vec<_> = std::fs::read_dir(&day_dir).unwrap().collect();
    assert_eq!(artifacts.len(), 1);
}

/// A broken snapshot sink never masks the original fault: the task still
/// stops fatally and does not panic.
#[tokio::test]
async fn broken_snapshot_sink_does_not_mask_the_fault() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let mut config = test_config();
    config.snapshot.root_dir = file.path().to_string_lossy().into_owned();

    let world = SimWorld::shared();
    let mut task = Task::new("capture_broken", world.interactor(), &config);
    let mission = FaultingMission::new(Fault::fatal("unexpected page").with_capture());
    let attempts = mission.attempt_counter();
    task.add_subordinate(Box::new(mission), false);

    let status = task.start().await;

    assert_eq!(status, TaskStatus::StoppedFatal);
    assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 1);

    // The original fault survives the sink failure unchanged.
    let fault = task.fault().expect("fault preserved");
    assert_eq!(fault.message, "unexpected page");
    assert!(fault.capture);
    assert!(fault.is_fatal());
}
