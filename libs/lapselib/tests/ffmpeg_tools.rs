//! Sink and post-processor behavior against scripted stand-ins for the
//! encoder binary, so the suite runs without ffmpeg installed.

#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use lapselib::{
    CaptureError, FrameSink, Mp4WriterSink, PostProcessConfig, PostProcessor, VideoFrame,
};

/// Write an executable shell script that consumes stdin and creates the
/// file named by its last argument, mimicking a well-behaved encoder.
fn fake_encoder(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "fake-encoder.sh",
        "#!/bin/sh\nfor last; do :; done\ncat > /dev/null 2>&1\n: > \"$last\"\n",
    )
}

/// Encoder that always fails without producing output.
fn broken_encoder(dir: &Path) -> PathBuf {
    write_script(dir, "broken-encoder.sh", "#!/bin/sh\ncat > /dev/null 2>&1\nexit 1\n")
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

#[test]
fn sink_pipes_frames_and_finalizes_to_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let encoder = fake_encoder(dir.path());
    let output = dir.path().join("out.mp4");

    let mut sink =
        Mp4WriterSink::open_with_program(encoder.to_str().unwrap(), &output, 30, 16, 16)
            .unwrap();

    for _ in 0..3 {
        sink.write_frame(&VideoFrame::blank(16, 16)).unwrap();
    }
    assert_eq!(sink.frames_written(), 3);

    sink.finalize().unwrap();
    assert!(output.is_file(), "finalize left a file behind");

    // Finalize is idempotent.
    sink.finalize().unwrap();
}

#[test]
fn sink_rejects_mismatched_frame_geometry() {
    let dir = tempfile::tempdir().unwrap();
    let encoder = fake_encoder(dir.path());
    let output = dir.path().join("out.mp4");

    let mut sink =
        Mp4WriterSink::open_with_program(encoder.to_str().unwrap(), &output, 30, 16, 16)
            .unwrap();

    let err = sink.write_frame(&VideoFrame::blank(8, 8)).unwrap_err();
    assert!(matches!(err, CaptureError::FrameWrite(_)));
    assert_eq!(sink.frames_written(), 0);
    let _ = sink.finalize();
}

#[test]
fn sink_reports_encoder_failure_with_zero_frames() {
    let dir = tempfile::tempdir().unwrap();
    let encoder = broken_encoder(dir.path());
    let output = dir.path().join("out.mp4");

    let mut sink =
        Mp4WriterSink::open_with_program(encoder.to_str().unwrap(), &output, 30, 16, 16)
            .unwrap();

    let err = sink.finalize().unwrap_err();
    assert!(matches!(err, CaptureError::FrameWrite(_)));
    assert!(!output.exists(), "no leftover file after a zero-frame session");
}

#[test]
fn post_process_success_replaces_the_original() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("video_x.mp4");
    std::fs::write(&input, b"raw recording").unwrap();

    let config = PostProcessConfig {
        program: fake_encoder(dir.path()),
        ..Default::default()
    };
    let processed = PostProcessor::new(config).process(&input, 641, 481).unwrap();

    assert_eq!(processed, dir.path().join("video_x_compressed.mp4"));
    assert!(processed.is_file());
    assert!(!input.exists(), "original deleted only after verified success");
}

#[test]
fn post_process_failure_retains_the_original() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("video_x.mp4");
    std::fs::write(&input, b"raw recording").unwrap();

    let config = PostProcessConfig {
        program: PathBuf::from("false"),
        ..Default::default()
    };
    let err = PostProcessor::new(config).process(&input, 640, 480).unwrap_err();

    assert!(matches!(err, CaptureError::PostProcess(_)));
    assert!(input.exists(), "original must survive a failed re-encode");
    assert!(!dir.path().join("video_x_compressed.mp4").exists());
}

#[test]
fn post_process_runs_in_the_background() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("video_y.mp4");
    std::fs::write(&input, b"raw recording").unwrap();

    let config = PostProcessConfig {
        program: fake_encoder(dir.path()),
        ..Default::default()
    };
    let handle = PostProcessor::new(config).spawn(input.clone(), 640, 480);
    let processed = handle.join().unwrap();

    assert!(processed.is_file());
    assert!(!input.exists());
}
