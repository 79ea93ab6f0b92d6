// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The acquirer: an event-driven state machine over the session table.
//
// Every external callback names its session, the session is loaded from
// the table, advanced as far as it can go without waiting on the OS, and
// written back. Nothing needed to resume lives only in memory, so a
// process that was evicted between callbacks continues where it stopped.
//
// Callbacks for one session are driven one at a time; a callback that
// arrives while another is in flight waits for it and then sees the state
// it left behind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use chrono::{TimeDelta, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, error, info, instrument, warn};

use bildwerk_bridge::{Dispatch, ForegroundService, OutcomeSink, PlatformBridge};
use bildwerk_core::error::{BildwerkError, Result};
use bildwerk_core::outcome::{FailureCode, Outcome};
use bildwerk_core::types::{ActivityCompletion, PickerConfig, Session, SessionId, SessionState};
use bildwerk_core::AcquirerConfig;

use crate::capture::{self, SourceResult};
use crate::crop::{CropCapability, CropLaunch, OptionalCropAdapter};
use crate::dispatch::{self, ResultDispatcher};
use crate::permission;
use crate::pipeline;
use crate::progress::Progress;
use crate::store::SessionStore;

/// Finished sessions older than this are purged on init.
const FINISHED_RETENTION_DAYS: i64 = 7;

/// Something that moves a session forward.
#[derive(Debug)]
enum Event {
    Begin,
    Permission(bool),
    Source(ActivityCompletion),
    Crop(ActivityCompletion),
    Process,
}

impl Event {
    fn name(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Permission(_) => "permission result",
            Self::Source(_) => "source result",
            Self::Crop(_) => "crop result",
            Self::Process => "process",
        }
    }
}

enum Step {
    /// Waiting on an OS callback.
    Suspend,
    Next(Event),
    Finish(Outcome),
}

type Gates = Mutex<HashMap<SessionId, Arc<AsyncMutex<()>>>>;

/// State that only exists after `init`.
struct Runtime {
    store: Mutex<SessionStore>,
    crop: OptionalCropAdapter,
    gates: Gates,
}

impl Runtime {
    fn new(store: SessionStore, crop: OptionalCropAdapter) -> Self {
        Self {
            store: Mutex::new(store),
            crop,
            gates: Mutex::new(HashMap::new()),
        }
    }

    fn store(&self) -> Result<MutexGuard<'_, SessionStore>> {
        self.store
            .lock()
            .map_err(|_| BildwerkError::Database("session store lock poisoned".into()))
    }

    /// Wait until no other driver holds session `id`.
    async fn turn(&self, id: SessionId) -> Result<Turn<'_>> {
        let gate = {
            let mut gates = self
                .gates
                .lock()
                .map_err(|_| BildwerkError::Database("session gate lock poisoned".into()))?;
            Arc::clone(gates.entry(id).or_default())
        };
        let guard = gate.lock_owned().await;
        Ok(Turn {
            gates: &self.gates,
            id,
            _guard: guard,
        })
    }
}

/// Exclusive right to drive one session. The gate entry is dropped with the
/// last holder.
struct Turn<'a> {
    gates: &'a Gates,
    id: SessionId,
    _guard: OwnedMutexGuard<()>,
}

impl Drop for Turn<'_> {
    fn drop(&mut self) {
        let Ok(mut gates) = self.gates.lock() else {
            return;
        };
        // One reference in the map, one in our guard: nobody is waiting.
        if gates.get(&self.id).is_some_and(|gate| Arc::strong_count(gate) <= 2) {
            gates.remove(&self.id);
        }
    }
}

/// Drives image acquisitions from request to outcome.
pub struct Acquirer {
    bridge: Arc<dyn PlatformBridge>,
    notifier: Arc<dyn ForegroundService>,
    dispatcher: ResultDispatcher,
    config: AcquirerConfig,
    runtime: OnceLock<Runtime>,
}

impl Acquirer {
    pub fn new(
        bridge: Arc<dyn PlatformBridge>,
        sink: Arc<dyn OutcomeSink>,
        notifier: Arc<dyn ForegroundService>,
        config: AcquirerConfig,
    ) -> Self {
        Self {
            bridge,
            notifier,
            dispatcher: ResultDispatcher::new(sink),
            config,
            runtime: OnceLock::new(),
        }
    }

    /// Open the session table, resolve the crop capability, and resume any
    /// session that was interrupted while processing. Idempotent.
    #[instrument(skip(self), fields(platform = self.bridge.platform_name()))]
    pub async fn init(&self) -> Result<()> {
        if self.runtime.get().is_some() {
            debug!("acquirer already initialized");
            return Ok(());
        }

        std::fs::create_dir_all(&self.config.work_dir)?;
        let store = SessionStore::open(self.config.session_db_path())?;
        store.purge_finished(Utc::now() - TimeDelta::days(FINISHED_RETENTION_DAYS))?;

        let capability = CropCapability::resolve(self.bridge.as_ref());
        info!(crop = ?capability, work_dir = %self.config.work_dir.display(), "acquirer initialized");
        if self
            .runtime
            .set(Runtime::new(store, OptionalCropAdapter::new(capability)))
            .is_err()
        {
            debug!("acquirer initialized concurrently");
            return Ok(());
        }

        let rt = self.runtime()?;
        let interrupted = rt.store()?.in_state(SessionState::Processing)?;
        for session in interrupted {
            let id = session.id;
            info!(session_id = %id, "resuming interrupted session");
            let _turn = rt.turn(id).await?;
            if let Err(e) = self.drive(rt, session, Event::Process).await {
                error!(session_id = %id, error = %e, "failed to resume session");
            }
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.runtime.get().is_some()
    }

    /// Whether a crop engine was resolved at init.
    pub fn crop_available(&self) -> bool {
        self.runtime
            .get()
            .is_some_and(|rt| rt.crop.capability().is_available())
    }

    /// Start an acquisition from a JSON request.
    ///
    /// Requests made before `init` and malformed requests still receive a
    /// terminal outcome (codes 90 and 91) under a fresh id before the error
    /// is returned. A request made while another session is outstanding is
    /// rejected with `SessionBusy` and receives nothing.
    #[instrument(skip(self, request_json))]
    pub async fn pick_image(&self, request_json: &str) -> Result<SessionId> {
        let Some(rt) = self.runtime.get() else {
            warn!("pick_image called before init");
            self.dispatcher
                .deliver(SessionId::new(), &Outcome::failed(FailureCode::NotInitialized))?;
            return Err(BildwerkError::NotInitialized);
        };

        // Admission check and insert under one lock: at most one outstanding session.
        let session = {
            let store = rt.store()?;
            self.make_room(&store)?;

            let config = match PickerConfig::from_request_json(request_json) {
                Ok(config) => config,
                Err(e) => {
                    warn!(error = %e, "rejecting malformed request");
                    self.dispatcher.deliver(
                        SessionId::new(),
                        &Outcome::failed_with(e.failure_code(), e.to_string()),
                    )?;
                    return Err(e);
                }
            };

            let session = Session::new(config);
            store.insert(&session)?;
            session
        };
        let id = session.id;
        info!(session_id = %id, source = ?session.config.source, "acquisition started");

        let _turn = rt.turn(id).await?;
        self.drive(rt, session, Event::Begin).await?;
        Ok(id)
    }

    /// The capability decision for `id` arrived.
    pub async fn on_permission_result(&self, id: SessionId, granted: bool) -> Result<()> {
        self.resume(id, Event::Permission(granted)).await
    }

    /// The camera or library activity for `id` finished.
    pub async fn on_source_result(&self, id: SessionId, completion: ActivityCompletion) -> Result<()> {
        self.resume(id, Event::Source(completion)).await
    }

    /// The crop activity for `id` finished.
    pub async fn on_crop_result(&self, id: SessionId, completion: ActivityCompletion) -> Result<()> {
        self.resume(id, Event::Crop(completion)).await
    }

    /// Terminate an outstanding session with `Failed{99, "session abandoned"}`.
    ///
    /// Does not wait for a callback in flight. If one is processing, the
    /// abandon wins and the processing result is discarded.
    pub fn abandon(&self, id: SessionId) -> Result<()> {
        let rt = self.runtime()?;
        let session = rt.store()?.get(&id)?;
        let mut session = session.ok_or(BildwerkError::UnknownSession(id))?;
        if session.is_terminal() {
            debug!(session_id = %id, "abandon of finished session ignored");
            return Ok(());
        }
        warn!(session_id = %id, state = ?session.state, "abandoning session");
        let store = rt.store()?;
        self.dispatcher.fail(
            &store,
            &mut session,
            FailureCode::InternalState,
            Some("session abandoned".into()),
        )?;
        Ok(())
    }

    /// Snapshot of a stored session.
    pub fn session(&self, id: SessionId) -> Result<Option<Session>> {
        self.runtime()?.store()?.get(&id)
    }

    // -- Internals ------------------------------------------------------------

    fn runtime(&self) -> Result<&Runtime> {
        self.runtime.get().ok_or(BildwerkError::NotInitialized)
    }

    fn progress(&self) -> Progress {
        Progress::new(Arc::clone(&self.notifier), &self.config)
    }

    /// Reject the request while a session is outstanding, unless that
    /// session has gone stale, in which case it is abandoned.
    fn make_room(&self, store: &SessionStore) -> Result<()> {
        loop {
            let Some(mut active) = store.active()? else {
                return Ok(());
            };

            if !self.is_stale(&active) {
                warn!(session_id = %active.id, state = ?active.state, "session still outstanding");
                return Err(BildwerkError::SessionBusy(active.id));
            }

            warn!(session_id = %active.id, state = ?active.state, "abandoning stale session");
            self.dispatcher.fail(
                store,
                &mut active,
                FailureCode::InternalState,
                Some("session abandoned".into()),
            )?;
        }
    }

    fn is_stale(&self, session: &Session) -> bool {
        let limit = self.config.stale_session_secs;
        if limit == 0 {
            return false;
        }
        let idle = (Utc::now() - session.updated_at).num_seconds();
        idle >= i64::try_from(limit).unwrap_or(i64::MAX)
    }

    async fn resume(&self, id: SessionId, event: Event) -> Result<()> {
        let rt = self.runtime()?;
        let _turn = rt.turn(id).await?;
        let session = rt.store()?.get(&id)?;
        let session = session.ok_or(BildwerkError::UnknownSession(id))?;
        if session.is_terminal() {
            info!(session_id = %id, event = event.name(), "callback for finished session ignored");
            return Ok(());
        }
        self.drive(rt, session, event).await
    }

    /// Advance `session` until it suspends or finishes, persisting it
    /// before every suspension and every stage.
    async fn drive(&self, rt: &Runtime, mut session: Session, mut event: Event) -> Result<()> {
        loop {
            debug!(session_id = %session.id, state = ?session.state, event = event.name(), "advancing");
            let step = match self.step(rt, &mut session, event).await {
                Ok(step) => step,
                Err(e) => {
                    error!(session_id = %session.id, error = %e, "session step failed");
                    Step::Finish(Outcome::failed_with(e.failure_code(), e.to_string()))
                }
            };

            match step {
                Step::Suspend => {
                    if rt.store()?.save(&session)? {
                        debug!(session_id = %session.id, state = ?session.state, "session suspended");
                    } else {
                        self.finished_elsewhere(&mut session);
                    }
                    return Ok(());
                }
                Step::Next(next) => {
                    if !rt.store()?.save(&session)? {
                        self.finished_elsewhere(&mut session);
                        return Ok(());
                    }
                    event = next;
                }
                Step::Finish(outcome) => {
                    let store = rt.store()?;
                    self.dispatcher.complete(&store, &mut session, outcome)?;
                    return Ok(());
                }
            }
        }
    }

    /// The stored session was finished while this driver ran (abandoned).
    /// What this copy acquired since is released; nothing is delivered.
    fn finished_elsewhere(&self, session: &mut Session) {
        info!(session_id = %session.id, state = ?session.state, "session finished elsewhere, driver stopped");
        dispatch::release(session.take_temp_resources());
    }

    async fn step(&self, rt: &Runtime, session: &mut Session, event: Event) -> Result<Step> {
        let bridge = self.bridge.as_ref();

        match (session.state, event) {
            (SessionState::AwaitingPermission, Event::Begin) => {
                Ok(match permission::ensure(bridge, session)? {
                    Dispatch::Pending => Step::Suspend,
                    Dispatch::Ready(granted) => Step::Next(Event::Permission(granted)),
                })
            }
            (SessionState::AwaitingPermission, Event::Permission(false)) => {
                info!(session_id = %session.id, "capability denied");
                Ok(Step::Finish(permission::denied(session.config.source)))
            }
            (SessionState::AwaitingPermission, Event::Permission(true)) => {
                session.advance_to(SessionState::AwaitingSource, "permission result")?;
                Ok(
                    match capture::launch(
                        bridge,
                        session,
                        &self.config.work_dir,
                        &self.config.library_mime_filter,
                    ) {
                        Err(outcome) => Step::Finish(outcome),
                        Ok(Dispatch::Pending) => Step::Suspend,
                        Ok(Dispatch::Ready(completion)) => Step::Next(Event::Source(completion)),
                    },
                )
            }
            (SessionState::AwaitingSource, Event::Source(completion)) => {
                match capture::resolve(bridge, session, completion) {
                    SourceResult::Cancelled => Ok(Step::Finish(Outcome::Cancelled)),
                    SourceResult::Failed(outcome) => Ok(Step::Finish(outcome)),
                    SourceResult::Candidate(candidate) => {
                        info!(session_id = %session.id, %candidate, "candidate acquired");
                        session.source_reference = Some(candidate);
                        self.enter_crop(rt, session)
                    }
                }
            }
            (SessionState::AwaitingCrop, Event::Crop(completion)) => {
                match rt.crop.resolve(bridge, session, completion) {
                    Ok(()) => self.enter_processing(session, "crop result"),
                    Err(outcome) => Ok(Step::Finish(outcome)),
                }
            }
            (SessionState::Processing, Event::Process) => {
                Ok(Step::Finish(self.process(session).await))
            }
            (state, event) => {
                warn!(session_id = %session.id, ?state, event = event.name(), "unexpected event");
                Ok(Step::Finish(Outcome::failed_with(
                    FailureCode::InternalState,
                    format!("unexpected {} while {state:?}", event.name()),
                )))
            }
        }
    }

    fn enter_crop(&self, rt: &Runtime, session: &mut Session) -> Result<Step> {
        if !rt.crop.applies(&session.config.crop) {
            return self.enter_processing(session, "source result");
        }
        session.advance_to(SessionState::AwaitingCrop, "source result")?;
        match rt.crop.launch(session, &self.config.work_dir) {
            CropLaunch::Dispatched(Dispatch::Pending) => Ok(Step::Suspend),
            CropLaunch::Dispatched(Dispatch::Ready(completion)) => {
                Ok(Step::Next(Event::Crop(completion)))
            }
            CropLaunch::Bypassed => self.enter_processing(session, "crop bypass"),
        }
    }

    fn enter_processing(&self, session: &mut Session, event: &'static str) -> Result<Step> {
        session.advance_to(SessionState::Processing, event)?;
        Ok(Step::Next(Event::Process))
    }

    async fn process(&self, session: &Session) -> Outcome {
        let Some(candidate) = session.source_reference.clone() else {
            return Outcome::failed_with(FailureCode::InternalState, "no candidate to process");
        };

        let progress = self.progress();
        progress.start("Processing image");

        let output = self
            .config
            .work_dir
            .join(format!("result_{}.jpg", session.id));
        let bridge = Arc::clone(&self.bridge);
        let constraints = session.config.constraints;
        let task_progress = progress.clone();

        let outcome = match tokio::task::spawn_blocking(move || {
            pipeline::process(
                bridge.as_ref(),
                &candidate,
                &constraints,
                &output,
                &task_progress,
            )
        })
        .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(session_id = %session.id, error = %e, "processing task failed");
                Outcome::failed_with(
                    FailureCode::InternalState,
                    format!("processing task failed: {e}"),
                )
            }
        };

        progress.stop();
        outcome
    }
}
