//! Overlay session: one selection engine bound to one displayed image
//!
//! A session owns its selection machine and a single event queue. Pointer
//! and key input, capture results, dispatch results and close broadcasts all
//! arrive through that queue and are handled one at a time on the owning
//! thread. Blocking host calls run on worker threads that only ever post
//! their result back; anything arriving after teardown is dropped.

use crate::config::{Addressing, EngineConfig};
use crate::geometry::{DisplayRect, Point};
use crate::registry::OverlayRegistry;
use crate::selection::{Command, Hit, Key, Mode, PointerEvent, SelectionMachine};
use crate::transform::{ContainFit, Container};
use crate::{OverlayError, OverlayHost, OverlayResult, SelectionOutcome};
use capture::{CaptureTarget, Rect, SourceImage};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use uuid::Uuid;

/// Identity of a session inside a registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.simple().to_string()[..8])
    }
}

/// Input to a session's queue
#[derive(Debug)]
pub enum SessionEvent {
    Pointer(PointerEvent),
    Key(Key),
    /// Explicit confirm action
    Confirm,
    /// Drop the committed selection, keep the overlay open
    Clear,
    SourceResolved(anyhow::Result<SourceImage>),
    DispatchResolved(anyhow::Result<String>),
    /// Close broadcast from the registry
    CloseRequested,
}

/// Coarse lifecycle state, mostly for the front-end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Waiting for the capture source
    Loading,
    Interactive,
    /// Confirm in flight
    Processing,
    Closed,
}

/// One overlay instance
pub struct OverlaySession {
    id: SessionId,
    target: CaptureTarget,
    machine: SelectionMachine,
    host: Arc<dyn OverlayHost>,
    source: Option<SourceImage>,
    container: Option<Container>,
    outcome: Option<SelectionOutcome>,
    in_flight: Option<Rect>,
    tx: Sender<SessionEvent>,
    rx: Receiver<SessionEvent>,
    registry: Option<Arc<OverlayRegistry>>,
}

impl OverlaySession {
    /// Create a session and start fetching its image
    ///
    /// `screen_index` is ignored with `Addressing::Single`.
    pub fn open(host: Arc<dyn OverlayHost>, config: EngineConfig, screen_index: usize) -> Self {
        let target = match config.addressing {
            Addressing::Single => CaptureTarget::Primary,
            Addressing::PerMonitor => CaptureTarget::Screen(screen_index),
        };
        let (tx, rx) = unbounded();

        let session = Self {
            id: SessionId::new(),
            target,
            machine: SelectionMachine::new(config),
            host,
            source: None,
            container: None,
            outcome: None,
            in_flight: None,
            tx,
            rx,
            registry: None,
        };

        log::info!("Opening overlay session {} for {:?}", session.id, target);
        session.spawn_capture();
        session
    }

    pub(crate) fn attach(&mut self, registry: Arc<OverlayRegistry>) {
        registry.register(self.id, self.tx.clone());
        self.registry = Some(registry);
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn target(&self) -> CaptureTarget {
        self.target
    }

    pub fn config(&self) -> &EngineConfig {
        self.machine.config()
    }

    pub fn mode(&self) -> &Mode {
        self.machine.mode()
    }

    /// Current rectangle, in progress or committed
    pub fn selection(&self) -> Option<DisplayRect> {
        self.machine.rect()
    }

    pub fn hit_test(&self, pos: Point) -> Hit {
        self.machine.hit_test(pos)
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn outcome(&self) -> Option<&SelectionOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn status(&self) -> SessionStatus {
        if self.outcome.is_some() {
            SessionStatus::Closed
        } else if self.source.is_none() {
            SessionStatus::Loading
        } else if self.machine.is_processing() {
            SessionStatus::Processing
        } else {
            SessionStatus::Interactive
        }
    }

    /// Layout box the image is drawn into; update on every resize
    pub fn set_container(&mut self, container: Container) {
        self.container = Some(container);
    }

    pub fn container(&self) -> Option<Container> {
        self.container
    }

    /// Contain-fit of the loaded image in the current container
    pub fn fit(&self) -> OverlayResult<ContainFit> {
        let source = self.source.as_ref().ok_or(OverlayError::NotReady("image still loading"))?;
        let container = self.container.ok_or(OverlayError::NotReady("no layout yet"))?;
        ContainFit::new(container, source.natural_width(), source.natural_height())
    }

    /// Handle for posting events from other threads
    pub fn sender(&self) -> Sender<SessionEvent> {
        self.tx.clone()
    }

    /// Queue an event behind everything already pending
    pub fn post(&self, event: SessionEvent) {
        // The session owns a receiver, so the channel cannot be disconnected
        let _ = self.tx.send(event);
    }

    /// Handle every queued event without blocking
    pub fn pump(&mut self) -> SessionStatus {
        while let Ok(event) = self.rx.try_recv() {
            self.handle(event);
        }
        self.status()
    }

    /// Block up to `timeout` for one event and handle it
    pub fn wait(&mut self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => {
                self.handle(event);
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Handle one event
    pub fn handle(&mut self, event: SessionEvent) {
        if self.outcome.is_some() {
            log::debug!("Session {} already closed, dropping {:?}", self.id, event);
            return;
        }

        match event {
            SessionEvent::Pointer(pointer) => {
                if self.source.is_some() {
                    self.machine.pointer(pointer);
                }
            }
            SessionEvent::Key(key) => {
                let command = self.machine.key(key);
                self.run(command);
            }
            SessionEvent::Confirm => {
                let command = self.machine.confirm();
                self.run(command);
            }
            SessionEvent::Clear => {
                self.machine.clear();
            }
            SessionEvent::SourceResolved(result) => self.on_source(result),
            SessionEvent::DispatchResolved(result) => self.on_dispatch(result),
            SessionEvent::CloseRequested => {
                log::debug!("Session {} received close broadcast", self.id);
                self.teardown(SelectionOutcome::Cancelled);
            }
        }
    }

    /// User-initiated close: ask the host to close every overlay, then close
    /// locally whatever the host answered
    pub fn close(&mut self) {
        if self.outcome.is_some() {
            return;
        }
        if let Err(e) = self.host.close_all_overlays() {
            log::warn!("Failed to close all overlays: {:#}", e);
        }
        self.teardown(SelectionOutcome::Cancelled);
    }

    fn run(&mut self, command: Command) {
        match command {
            Command::None => {}
            Command::Close => self.close(),
            Command::Confirm(rect) => self.begin_dispatch(rect),
        }
    }

    fn on_source(&mut self, result: anyhow::Result<SourceImage>) {
        if self.source.is_some() {
            log::warn!("Session {} got a second capture result, ignoring", self.id);
            return;
        }

        match result {
            Ok(image) if image.is_valid() => {
                log::info!(
                    "Session {} loaded {}x{} source",
                    self.id,
                    image.natural_width(),
                    image.natural_height()
                );
                self.source = Some(image);
            }
            Ok(image) => self.fail(OverlayError::InvalidSourceImage {
                width: image.natural_width(),
                height: image.natural_height(),
            }),
            Err(e) => self.fail(OverlayError::ProviderUnavailable(format!("{:#}", e))),
        }
    }

    fn native_region(&self, rect: &DisplayRect) -> OverlayResult<Rect> {
        Ok(self.fit()?.to_native(rect))
    }

    fn begin_dispatch(&mut self, rect: DisplayRect) {
        if self.machine.is_processing() {
            log::debug!("Session {} already dispatching", self.id);
            return;
        }

        let region = match self.native_region(&rect) {
            Ok(region) => region,
            Err(e) if e.is_fatal() => return self.fail(e),
            Err(e) => {
                log::warn!("Session {} cannot confirm yet: {}", self.id, e);
                self.host.alert(&format!("Cannot tag the selection yet: {}", e));
                return;
            }
        };

        log::info!("Session {} dispatching {:?} from {:?}", self.id, region, rect);
        self.machine.set_processing(true);
        self.in_flight = Some(region);

        let host = Arc::clone(&self.host);
        let tx = self.tx.clone();
        let screen_index = self.target.screen_index();
        let spawned = thread::Builder::new()
            .name(format!("overlay-dispatch-{}", self.id))
            .spawn(move || {
                let result = host.process_selection(screen_index, region);
                let _ = tx.send(SessionEvent::DispatchResolved(result));
            });

        if let Err(e) = spawned {
            self.post(SessionEvent::DispatchResolved(Err(anyhow::Error::new(e)
                .context("Failed to start dispatch worker"))));
        }
    }

    fn on_dispatch(&mut self, result: anyhow::Result<String>) {
        let Some(region) = self.in_flight.take() else {
            log::warn!("Session {} got an unexpected dispatch result", self.id);
            return;
        };
        self.machine.set_processing(false);

        match result {
            Ok(tags) => {
                if let Err(e) = self.host.close_all_overlays() {
                    log::warn!("Failed to close all overlays: {:#}", e);
                }
                self.teardown(SelectionOutcome::Confirmed { region, tags });
            }
            Err(e) => {
                // Recoverable: the committed selection stays for another try
                let error = OverlayError::DispatchFailed(format!("{:#}", e));
                log::error!("Session {}: {}", self.id, error);
                self.host.alert(&error.to_string());
            }
        }
    }

    fn spawn_capture(&self) {
        let host = Arc::clone(&self.host);
        let tx = self.tx.clone();
        let target = self.target;
        let spawned = thread::Builder::new()
            .name(format!("overlay-capture-{}", self.id))
            .spawn(move || {
                let result = match target {
                    CaptureTarget::Primary => host.capture_screen(),
                    CaptureTarget::Screen(index) => host.get_overlay_image(index),
                };
                let _ = tx.send(SessionEvent::SourceResolved(result));
            });

        if let Err(e) = spawned {
            self.post(SessionEvent::SourceResolved(Err(anyhow::Error::new(e)
                .context("Failed to start capture worker"))));
        }
    }

    fn fail(&mut self, error: OverlayError) {
        log::error!("Session {}: {}", self.id, error);
        self.host.alert(&error.to_string());
        self.teardown(SelectionOutcome::Failed(error));
    }

    fn teardown(&mut self, outcome: SelectionOutcome) {
        log::info!("Closing overlay session {}: {:?}", self.id, outcome);
        self.machine.set_processing(false);
        self.in_flight = None;
        self.outcome = Some(outcome);
        if let Some(registry) = self.registry.take() {
            registry.unregister(self.id);
        }
    }
}

impl Drop for OverlaySession {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.take() {
            registry.unregister(self.id);
        }
    }
}
