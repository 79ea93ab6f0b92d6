// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end acquisition scenarios against scripted bridges.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};

use bildwerk_bridge::{CenterCropEngine, NoopForegroundService, PlatformBridge, StubBridge};
use bildwerk_core::error::BildwerkError;
use bildwerk_core::outcome::{FailureCode, Outcome};
use bildwerk_core::types::{ActivityCompletion, CandidateRef, SessionId, SessionState};
use bildwerk_core::AcquirerConfig;
use chrono::TimeDelta;
use tempfile::TempDir;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::engine::Acquirer;
use crate::sink::ChannelSink;
use crate::store::SessionStore;
use crate::testing::{
    CropScript, FakeBridge, RecordingNotifier, ScriptedCrop, jpeg_bytes, with_exif_orientation,
    write_png,
};

struct Harness {
    acquirer: Acquirer,
    rx: UnboundedReceiver<(SessionId, Outcome)>,
    notifier: Arc<RecordingNotifier>,
    dir: TempDir,
}

fn config_in(dir: &Path) -> AcquirerConfig {
    AcquirerConfig {
        work_dir: dir.join("work"),
        ..AcquirerConfig::default()
    }
}

impl Harness {
    fn build(bridge: impl PlatformBridge + 'static, dir: TempDir, config: AcquirerConfig) -> Self {
        let (sink, rx) = ChannelSink::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let acquirer = Acquirer::new(Arc::new(bridge), Arc::new(sink), notifier.clone(), config);
        Self {
            acquirer,
            rx,
            notifier,
            dir,
        }
    }

    async fn start(bridge: impl PlatformBridge + 'static) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path());
        let harness = Self::build(bridge, dir, config);
        harness.acquirer.init().await.expect("init");
        harness
    }

    fn fixture(&self, name: &str, width: u32, height: u32) -> PathBuf {
        write_png(self.dir.path(), name, width, height)
    }

    fn work_dir(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    fn next_outcome(&mut self) -> (SessionId, Outcome) {
        self.rx.try_recv().expect("an outcome was delivered")
    }

    fn assert_silent(&mut self) {
        assert!(self.rx.try_recv().is_err(), "no further outcome expected");
    }

    /// Files in the work dir other than the session database.
    fn work_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.work_dir())
            .expect("read work dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| !name.starts_with("sessions.db"))
            .collect();
        names.sort();
        names
    }
}

fn picked(path: &Path) -> ActivityCompletion {
    ActivityCompletion::Completed(Some(CandidateRef::from_path(path)))
}

fn success_dims(outcome: &Outcome) -> (u32, u32) {
    match outcome {
        Outcome::Success { width, height, .. } => (*width, *height),
        other => panic!("expected success, got {other:?}"),
    }
}

// -- 8. scenarios ------------------------------------------------------------

#[tokio::test]
async fn library_pick_without_constraints_succeeds() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = write_png(dir.path(), "photo.png", 800, 600);
    let bridge = FakeBridge::new().pick_ready(picked(&photo));
    let config = config_in(dir.path());
    let mut h = Harness::build(bridge, dir, config);
    h.acquirer.init().await.expect("init");

    let id = h.acquirer.pick_image("{}").await.expect("pick");
    let (delivered_to, outcome) = h.next_outcome();
    assert_eq!(delivered_to, id);

    let Outcome::Success {
        path,
        width,
        height,
        byte_size,
    } = &outcome
    else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!((*width, *height), (800, 600));
    assert_eq!(*byte_size, std::fs::metadata(path).expect("stat").len());

    let reopened = image::open(path).expect("decode artifact");
    assert_eq!((reopened.width(), reopened.height()), (800, 600));
    assert_eq!(outcome.payload(), format!("{path}|800|600|{byte_size}"));

    assert!(photo.exists(), "library item must not be touched");
    assert_eq!(h.work_files(), vec![format!("result_{id}.jpg")]);
    h.assert_silent();
}

#[tokio::test]
async fn camera_denied_is_code_10() {
    let mut h = Harness::start(FakeBridge::new().deny_permission()).await;
    h.acquirer
        .pick_image(r#"{"source": 1}"#)
        .await
        .expect("pick");
    let (_, outcome) = h.next_outcome();
    assert_eq!(outcome, Outcome::failed(FailureCode::CameraDenied));
    assert_eq!(outcome.payload(), "10");
    assert!(h.work_files().is_empty());
}

#[tokio::test]
async fn undersized_image_is_code_40_with_both_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = write_png(dir.path(), "photo.png", 800, 600);
    let config = config_in(dir.path());
    let mut h = Harness::build(FakeBridge::new().pick_ready(picked(&photo)), dir, config);
    h.acquirer.init().await.expect("init");

    h.acquirer
        .pick_image(r#"{"minWidth": 1000}"#)
        .await
        .expect("pick");
    let (_, outcome) = h.next_outcome();
    let payload = outcome.payload();
    assert!(payload.starts_with("40|"), "{payload}");
    assert!(payload.contains("800px"), "{payload}");
    assert!(payload.contains("1000px"), "{payload}");
    assert!(h.work_files().is_empty());
}

#[tokio::test]
async fn crop_request_without_engine_proceeds_uncropped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = write_png(dir.path(), "photo.png", 800, 600);
    let config = config_in(dir.path());
    let mut h = Harness::build(FakeBridge::new().pick_ready(picked(&photo)), dir, config);
    h.acquirer.init().await.expect("init");
    assert!(!h.acquirer.crop_available());

    h.acquirer
        .pick_image(r#"{"enableCrop": true, "aspectRatioX": 1, "aspectRatioY": 1}"#)
        .await
        .expect("pick");
    let (_, outcome) = h.next_outcome();
    assert_eq!(success_dims(&outcome), (800, 600));
}

#[tokio::test]
async fn cancelled_picker_delivers_empty_payload() {
    let mut h = Harness::start(FakeBridge::new().pick_ready(ActivityCompletion::Cancelled)).await;
    h.acquirer.pick_image("{}").await.expect("pick");
    let (_, outcome) = h.next_outcome();
    assert_eq!(outcome, Outcome::Cancelled);
    assert_eq!(outcome.payload(), "");
    assert!(h.work_files().is_empty());
}

#[tokio::test]
async fn cancelled_camera_releases_the_capture_file() {
    let mut h = Harness::start(FakeBridge::new()).await;
    let id = h
        .acquirer
        .pick_image(r#"{"source": 1}"#)
        .await
        .expect("pick");
    assert_eq!(h.work_files(), vec![format!("capture_{id}.jpg")]);
    h.assert_silent();

    h.acquirer
        .on_source_result(id, ActivityCompletion::Cancelled)
        .await
        .expect("callback");
    assert_eq!(h.next_outcome(), (id, Outcome::Cancelled));
    assert!(h.work_files().is_empty());
}

#[tokio::test]
async fn exif_rotate_90_swaps_output_dimensions() {
    let capture = with_exif_orientation(&jpeg_bytes(64, 32), 6);
    let mut h = Harness::start(FakeBridge::new().capture_ready(capture)).await;

    let id = h
        .acquirer
        .pick_image(r#"{"source": 1}"#)
        .await
        .expect("pick");
    let (_, outcome) = h.next_outcome();
    assert_eq!(success_dims(&outcome), (32, 64));

    let Outcome::Success { path, .. } = &outcome else {
        unreachable!()
    };
    let rgb = image::open(path).expect("decode artifact").to_rgb8();
    let top = rgb.get_pixel(16, 4);
    let bottom = rgb.get_pixel(16, 60);
    assert!(top[0] > 180 && top[2] < 80, "top should be red: {top:?}");
    assert!(bottom[2] > 180 && bottom[0] < 80, "bottom should be blue: {bottom:?}");

    // Capture file released, artifact kept.
    assert_eq!(h.work_files(), vec![format!("result_{id}.jpg")]);
}

// -- Lifecycle guards ---------------------------------------------------------

#[tokio::test]
async fn second_request_while_outstanding_is_rejected() {
    let mut h = Harness::start(FakeBridge::new()).await;
    let photo = h.fixture("photo.png", 120, 80);

    let first = h.acquirer.pick_image("{}").await.expect("pick");
    let err = h
        .acquirer
        .pick_image("{}")
        .await
        .expect_err("busy");
    assert!(matches!(err, BildwerkError::SessionBusy(id) if id == first));
    h.assert_silent();

    h.acquirer
        .on_source_result(first, picked(&photo))
        .await
        .expect("callback");
    let (id, outcome) = h.next_outcome();
    assert_eq!(id, first);
    assert_eq!(success_dims(&outcome), (120, 80));

    // The slot is free again.
    h.acquirer.pick_image("{}").await.expect("pick after finish");
}

#[tokio::test]
async fn duplicate_callback_is_ignored() {
    let mut h = Harness::start(FakeBridge::new()).await;
    let photo = h.fixture("photo.png", 50, 50);

    let id = h.acquirer.pick_image("{}").await.expect("pick");
    h.acquirer
        .on_source_result(id, picked(&photo))
        .await
        .expect("callback");
    h.next_outcome();

    h.acquirer
        .on_source_result(id, ActivityCompletion::Cancelled)
        .await
        .expect("late callback");
    h.acquirer
        .on_permission_result(id, false)
        .await
        .expect("late callback");
    h.assert_silent();

    let stored = h.acquirer.session(id).expect("get").expect("present");
    assert_eq!(stored.state, SessionState::Finished);
    assert_eq!(success_dims(stored.outcome.as_ref().expect("outcome")), (50, 50));
}

#[tokio::test]
async fn overlapping_callbacks_deliver_one_outcome() {
    let mut h = Harness::start(FakeBridge::new()).await;
    let photo = h.fixture("photo.png", 50, 50);
    let id = h.acquirer.pick_image("{}").await.expect("pick");

    // The second callback arrives while the first is still processing.
    let (first, second) = tokio::join!(
        h.acquirer.on_source_result(id, picked(&photo)),
        h.acquirer.on_source_result(id, picked(&photo)),
    );
    first.expect("first callback");
    second.expect("second callback");

    let (delivered_to, outcome) = h.next_outcome();
    assert_eq!(delivered_to, id);
    assert_eq!(success_dims(&outcome), (50, 50));
    h.assert_silent();
}

#[tokio::test]
async fn abandon_during_processing_discards_the_result() {
    let mut h = Harness::start(FakeBridge::new()).await;
    let photo = h.fixture("photo.png", 50, 50);
    let id = h.acquirer.pick_image("{}").await.expect("pick");

    let (processed, abandoned) = tokio::join!(
        h.acquirer.on_source_result(id, picked(&photo)),
        async { h.acquirer.abandon(id) },
    );
    processed.expect("callback");
    abandoned.expect("abandon");

    assert_eq!(
        h.next_outcome(),
        (
            id,
            Outcome::failed_with(FailureCode::InternalState, "session abandoned")
        )
    );
    h.assert_silent();
    assert!(h.work_files().is_empty(), "discarded artifact left behind");

    let stored = h.acquirer.session(id).expect("get").expect("present");
    assert_eq!(
        stored.outcome,
        Some(Outcome::failed_with(FailureCode::InternalState, "session abandoned"))
    );
}

#[test]
fn concurrent_requests_admit_one_session() {
    const CALLERS: usize = 4;

    for _ in 0..25 {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = config_in(dir.path());
        let bridge = FakeBridge::new().without_grants().async_permission();
        let h = Harness::build(bridge, dir, config);
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("runtime");
        runtime.block_on(h.acquirer.init()).expect("init");

        let barrier = Barrier::new(CALLERS);
        let results: Vec<_> = std::thread::scope(|scope| {
            let callers: Vec<_> = (0..CALLERS)
                .map(|_| {
                    scope.spawn(|| {
                        let runtime = tokio::runtime::Builder::new_current_thread()
                            .build()
                            .expect("runtime");
                        barrier.wait();
                        runtime.block_on(h.acquirer.pick_image("{}"))
                    })
                })
                .collect();
            callers
                .into_iter()
                .map(|caller| caller.join().expect("caller thread"))
                .collect()
        });

        let admitted: Vec<SessionId> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
        assert_eq!(admitted.len(), 1, "exactly one request admitted: {results:?}");
        for result in &results {
            if let Err(e) = result {
                assert!(
                    matches!(e, BildwerkError::SessionBusy(id) if *id == admitted[0]),
                    "unexpected error {e:?}"
                );
            }
        }
    }
}

#[tokio::test]
async fn event_for_the_wrong_state_is_code_99() {
    let mut h = Harness::start(FakeBridge::new()).await;
    let id = h
        .acquirer
        .pick_image(r#"{"source": 1}"#)
        .await
        .expect("pick");

    h.acquirer
        .on_crop_result(id, ActivityCompletion::Cancelled)
        .await
        .expect("callback");
    let (_, outcome) = h.next_outcome();
    assert!(outcome.payload().starts_with("99|"), "{}", outcome.payload());
    assert!(h.work_files().is_empty(), "capture file released");
}

#[tokio::test]
async fn unknown_session_callback_errors_without_outcome() {
    let mut h = Harness::start(FakeBridge::new()).await;
    let err = h
        .acquirer
        .on_permission_result(SessionId::new(), true)
        .await
        .expect_err("unknown");
    assert!(matches!(err, BildwerkError::UnknownSession(_)));
    h.assert_silent();
}

#[tokio::test]
async fn pick_before_init_is_code_90() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_in(dir.path());
    let mut h = Harness::build(FakeBridge::new(), dir, config);
    assert!(!h.acquirer.is_initialized());

    let err = h.acquirer.pick_image("{}").await.expect_err("not initialized");
    assert!(matches!(err, BildwerkError::NotInitialized));
    let (_, outcome) = h.next_outcome();
    assert_eq!(outcome.payload(), "90");

    let err = h
        .acquirer
        .on_source_result(SessionId::new(), ActivityCompletion::Cancelled)
        .await
        .expect_err("not initialized");
    assert!(matches!(err, BildwerkError::NotInitialized));
    h.assert_silent();
}

#[tokio::test]
async fn malformed_requests_are_code_91_before_any_os_call() {
    let mut h = Harness::start(FakeBridge::new().without_grants()).await;

    for request in ["not json", r#"{"source": 7}"#, r#"{"minWidth": "wide"}"#] {
        let err = h.acquirer.pick_image(request).await.expect_err("malformed");
        assert!(matches!(err, BildwerkError::MalformedRequest(_)), "{request}");
        let (_, outcome) = h.next_outcome();
        assert!(outcome.payload().starts_with("91|"), "{request}");
    }
    h.assert_silent();
}

#[tokio::test]
async fn library_denial_through_callback_is_code_11() {
    let bridge = FakeBridge::new().without_grants().async_permission();
    let mut h = Harness::start(bridge).await;

    let id = h.acquirer.pick_image("{}").await.expect("pick");
    let stored = h.acquirer.session(id).expect("get").expect("present");
    assert_eq!(stored.state, SessionState::AwaitingPermission);
    h.assert_silent();

    h.acquirer
        .on_permission_result(id, false)
        .await
        .expect("callback");
    assert_eq!(h.next_outcome(), (id, Outcome::failed(FailureCode::LibraryDenied)));
}

// -- Capture failures ---------------------------------------------------------

#[tokio::test]
async fn missing_capture_facility_is_code_20() {
    let mut h = Harness::start(FakeBridge::new().without_camera()).await;
    h.acquirer
        .pick_image(r#"{"source": 1}"#)
        .await
        .expect("pick");
    let (_, outcome) = h.next_outcome();
    assert_eq!(outcome.payload(), "20");
}

#[tokio::test]
async fn empty_capture_is_code_31() {
    let mut h = Harness::start(FakeBridge::new()).await;
    let id = h
        .acquirer
        .pick_image(r#"{"source": 1}"#)
        .await
        .expect("pick");
    h.acquirer
        .on_source_result(id, ActivityCompletion::Completed(None))
        .await
        .expect("callback");
    let (_, outcome) = h.next_outcome();
    assert!(outcome.payload().starts_with("31|"));
    assert!(h.work_files().is_empty());
}

#[tokio::test]
async fn abnormal_source_completion_is_code_33() {
    let mut h = Harness::start(FakeBridge::new()).await;
    let id = h.acquirer.pick_image("{}").await.expect("pick");
    h.acquirer
        .on_source_result(id, ActivityCompletion::Abnormal("activity crashed".into()))
        .await
        .expect("callback");
    assert_eq!(
        h.next_outcome(),
        (
            id,
            Outcome::failed_with(FailureCode::InvocationFailed, "activity crashed")
        )
    );
}

#[tokio::test]
async fn stub_bridge_fails_with_code_33() {
    let mut h = Harness::start(StubBridge).await;
    h.acquirer.pick_image("{}").await.expect("pick");
    let (_, outcome) = h.next_outcome();
    assert!(outcome.payload().starts_with("33|"), "{}", outcome.payload());
}

// -- Crop ---------------------------------------------------------------------

#[tokio::test]
async fn crop_cancel_falls_back_to_the_original() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = write_png(dir.path(), "photo.png", 300, 200);
    let crop = Arc::new(ScriptedCrop::new(CropScript::Cancelled));
    let bridge = FakeBridge::new()
        .pick_ready(picked(&photo))
        .with_crop(crop.clone());
    let config = config_in(dir.path());
    let mut h = Harness::build(bridge, dir, config);
    h.acquirer.init().await.expect("init");

    let id = h
        .acquirer
        .pick_image(r#"{"enableCrop": true, "cropShape": 1}"#)
        .await
        .expect("pick");
    let (_, outcome) = h.next_outcome();
    assert_eq!(success_dims(&outcome), (300, 200));

    let launches = crop.launches();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].source, CandidateRef::from_path(&photo));
    assert_eq!(h.work_files(), vec![format!("result_{id}.jpg")]);
}

#[tokio::test]
async fn crop_launch_error_falls_back_to_the_original() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = write_png(dir.path(), "photo.png", 300, 200);
    let bridge = FakeBridge::new()
        .pick_ready(picked(&photo))
        .with_crop(Arc::new(ScriptedCrop::new(CropScript::LaunchError)));
    let config = config_in(dir.path());
    let mut h = Harness::build(bridge, dir, config);
    h.acquirer.init().await.expect("init");

    h.acquirer
        .pick_image(r#"{"enableCrop": true}"#)
        .await
        .expect("pick");
    assert_eq!(success_dims(&h.next_outcome().1), (300, 200));
}

#[tokio::test]
async fn crop_without_output_is_code_50() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = write_png(dir.path(), "photo.png", 300, 200);
    let bridge = FakeBridge::new()
        .pick_ready(picked(&photo))
        .with_crop(Arc::new(ScriptedCrop::new(CropScript::NoOutput)));
    let config = config_in(dir.path());
    let mut h = Harness::build(bridge, dir, config);
    h.acquirer.init().await.expect("init");

    h.acquirer
        .pick_image(r#"{"enableCrop": true}"#)
        .await
        .expect("pick");
    let (_, outcome) = h.next_outcome();
    assert!(outcome.payload().starts_with("50|"));
    assert!(h.work_files().is_empty());
}

#[tokio::test]
async fn crop_result_arrives_through_callback() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = write_png(dir.path(), "photo.png", 300, 200);
    let bridge = FakeBridge::new()
        .pick_ready(picked(&photo))
        .with_crop(Arc::new(ScriptedCrop::new(CropScript::Pending)));
    let config = config_in(dir.path());
    let mut h = Harness::build(bridge, dir, config);
    h.acquirer.init().await.expect("init");

    let id = h
        .acquirer
        .pick_image(r#"{"enableCrop": true}"#)
        .await
        .expect("pick");
    let stored = h.acquirer.session(id).expect("get").expect("present");
    assert_eq!(stored.state, SessionState::AwaitingCrop);
    h.assert_silent();

    // The engine writes to the session-owned output it was handed.
    let cropped = h.work_dir().join(format!("crop_{id}.jpg"));
    crate::testing::split_image(90, 60)
        .save_with_format(&cropped, image::ImageFormat::Jpeg)
        .expect("write crop");

    h.acquirer
        .on_crop_result(id, picked(&cropped))
        .await
        .expect("callback");
    let (_, outcome) = h.next_outcome();
    assert_eq!(success_dims(&outcome), (90, 60));
    assert!(!cropped.exists(), "crop output is a temp resource");
}

#[tokio::test]
async fn center_crop_engine_applies_aspect_and_max_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = write_png(dir.path(), "photo.png", 800, 600);
    let bridge = FakeBridge::new()
        .pick_ready(picked(&photo))
        .with_crop(Arc::new(CenterCropEngine));
    let config = config_in(dir.path());
    let mut h = Harness::build(bridge, dir, config);
    h.acquirer.init().await.expect("init");
    assert!(h.acquirer.crop_available());

    h.acquirer
        .pick_image(
            r#"{"enableCrop": true, "aspectRatioX": 1.0, "aspectRatioY": 1.0,
                "maxOutputWidth": 200, "maxOutputHeight": 200}"#,
        )
        .await
        .expect("pick");
    assert_eq!(success_dims(&h.next_outcome().1), (200, 200));
}

// -- Persistence --------------------------------------------------------------

#[tokio::test]
async fn session_resumes_in_a_new_process() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_in(dir.path());

    // First process: permission prompt shown, then the process is evicted.
    let id = {
        let (sink, _rx) = ChannelSink::new();
        let first = Acquirer::new(
            Arc::new(FakeBridge::new().without_grants().async_permission()),
            Arc::new(sink),
            Arc::new(NoopForegroundService),
            config.clone(),
        );
        first.init().await.expect("init");
        first
            .pick_image(r#"{"source": 1, "maxWidth": 100}"#)
            .await
            .expect("pick")
    };

    // Second process: receives the callback for the stored session.
    let capture = jpeg_bytes(80, 40);
    let mut h = Harness::build(FakeBridge::new().capture_ready(capture), dir, config);
    h.acquirer.init().await.expect("init");
    h.acquirer
        .on_permission_result(id, true)
        .await
        .expect("callback");

    let (delivered_to, outcome) = h.next_outcome();
    assert_eq!(delivered_to, id);
    assert_eq!(success_dims(&outcome), (80, 40));
}

#[tokio::test]
async fn interrupted_processing_resumes_on_init() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = write_png(dir.path(), "photo.png", 64, 48);
    let config = config_in(dir.path());
    std::fs::create_dir_all(&config.work_dir).expect("work dir");

    let mut session = bildwerk_core::types::Session::new(Default::default());
    session.state = SessionState::Processing;
    session.source_reference = Some(CandidateRef::from_path(&photo));
    {
        let store = SessionStore::open(config.session_db_path()).expect("store");
        store.insert(&session).expect("insert");
    }

    let mut h = Harness::build(FakeBridge::new(), dir, config);
    h.acquirer.init().await.expect("init");
    let (id, outcome) = h.next_outcome();
    assert_eq!(id, session.id);
    assert_eq!(success_dims(&outcome), (64, 48));
}

#[tokio::test]
async fn stale_session_is_abandoned_by_a_new_request() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = AcquirerConfig {
        stale_session_secs: 60,
        ..config_in(dir.path())
    };
    let db = config.session_db_path();
    let mut h = Harness::build(FakeBridge::new(), dir, config);
    h.acquirer.init().await.expect("init");

    let stale = h.acquirer.pick_image("{}").await.expect("pick");
    {
        let store = SessionStore::open(&db).expect("store");
        let mut session = store.get(&stale).expect("get").expect("present");
        session.updated_at -= TimeDelta::seconds(120);
        store.save(&session).expect("save");
    }

    let fresh = h.acquirer.pick_image("{}").await.expect("pick");
    assert_ne!(fresh, stale);
    assert_eq!(
        h.next_outcome(),
        (
            stale,
            Outcome::failed_with(FailureCode::InternalState, "session abandoned")
        )
    );
    h.assert_silent();
}

#[tokio::test]
async fn abandon_is_single_shot() {
    let mut h = Harness::start(FakeBridge::new()).await;
    let id = h
        .acquirer
        .pick_image(r#"{"source": 1}"#)
        .await
        .expect("pick");

    h.acquirer.abandon(id).expect("abandon");
    h.acquirer.abandon(id).expect("abandon again");
    assert_eq!(
        h.next_outcome(),
        (
            id,
            Outcome::failed_with(FailureCode::InternalState, "session abandoned")
        )
    );
    h.assert_silent();
    assert!(h.work_files().is_empty());
}

// -- Progress -----------------------------------------------------------------

#[tokio::test]
async fn processing_reports_progress_milestones() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = write_png(dir.path(), "photo.png", 40, 30);
    let config = config_in(dir.path());
    let mut h = Harness::build(FakeBridge::new().pick_ready(picked(&photo)), dir, config);
    h.acquirer.init().await.expect("init");

    h.acquirer.pick_image("{}").await.expect("pick");
    h.next_outcome();
    assert_eq!(
        h.notifier.events(),
        vec!["start", "update 25", "update 50", "update 90", "stop"]
    );
}

#[tokio::test]
async fn progress_can_be_switched_off() {
    let dir = tempfile::tempdir().expect("tempdir");
    let photo = write_png(dir.path(), "photo.png", 40, 30);
    let config = AcquirerConfig {
        notify_progress: false,
        ..config_in(dir.path())
    };
    let mut h = Harness::build(FakeBridge::new().pick_ready(picked(&photo)), dir, config);
    h.acquirer.init().await.expect("init");

    h.acquirer.pick_image("{}").await.expect("pick");
    h.next_outcome();
    assert!(h.notifier.events().is_empty());
}
