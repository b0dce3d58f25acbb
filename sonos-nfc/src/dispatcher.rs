//! The polling loop
//!
//! One worker owns the tag source, the session and the executor. Tags are
//! handled strictly one after another; every failure while handling a tag is
//! logged and contained, so only a closed tag source or the shutdown flag
//! ends [`Dispatcher::run`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::directive::{parse, DirectiveKind};
use crate::error::{ExecError, TagReadError};
use crate::executor::{Executor, Outcome};
use crate::session::Session;
use crate::tag::{NdefMessage, TagRead, TagSource};
use crate::telemetry::TelemetrySink;

/// Telemetry message for tags that could not be read as text
pub const NFC_READ_ERROR: &str = "nfcreaderror";

/// Default time to wait for a tag before checking for shutdown
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Where the worker is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Waiting for a tag
    Idle,
    /// Handling the records of one tag
    Dispatching,
}

pub struct Dispatcher<S> {
    source: S,
    executor: Executor,
    session: Session,
    telemetry: Arc<dyn TelemetrySink>,
    state: DispatchState,
    poll_interval: Duration,
}

impl<S: TagSource> Dispatcher<S> {
    pub fn new(source: S, executor: Executor, session: Session, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            source,
            executor,
            session,
            telemetry,
            state: DispatchState::Idle,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Poll for tags until `shutdown` is raised or the source closes
    ///
    /// A tag being handled when `shutdown` is raised is finished first.
    pub fn run(&mut self, shutdown: &AtomicBool) {
        info!(room = self.session.room_name(), "Ready for NFC tags");

        while !shutdown.load(Ordering::SeqCst) {
            match self.source.poll(self.poll_interval) {
                Ok(TagRead::Idle) => {}
                Ok(TagRead::Blank) => self.unreadable_tag(None),
                Ok(TagRead::Message(message)) => self.handle_message(&message),
                Err(TagReadError::Closed) => {
                    info!("Tag source closed, stopping");
                    break;
                }
                Err(TagReadError::Io(e)) => {
                    error!(error = %e, "Error reading NFC");
                    thread::sleep(ERROR_BACKOFF);
                }
                Err(e) => self.unreadable_tag(Some(&e)),
            }
        }

        info!("Dispatch loop stopped");
    }

    /// Handle every text record of one tag, in order
    ///
    /// A record that is not readable text ends handling of the tag.
    pub fn handle_message(&mut self, message: &NdefMessage) {
        if message.is_empty() {
            self.unreadable_tag(None);
            return;
        }

        self.transition(DispatchState::Dispatching);
        for record in &message.records {
            match record.text() {
                Ok(text) => self.dispatch(&text),
                Err(e) => {
                    self.unreadable_tag(Some(&e));
                    break;
                }
            }
        }
        self.transition(DispatchState::Idle);
    }

    /// Parse and execute one tag text
    pub fn handle_text(&mut self, text: &str) {
        self.transition(DispatchState::Dispatching);
        self.dispatch(text);
        self.transition(DispatchState::Idle);
    }

    fn dispatch(&mut self, text: &str) {
        info!(text, "Read from NFC tag");
        let directive = parse(text);
        debug!(kind = %directive.kind(), payload = directive.payload(), "Classified tag");

        let needs_target = !matches!(directive.kind(), DirectiveKind::Room | DirectiveKind::Unrecognized);
        if needs_target && self.session.target().is_none() {
            match self.executor.attach(&self.session) {
                Ok(session) => self.session = session,
                Err(e) => {
                    self.report_failure(&e);
                    return;
                }
            }
        }

        match self.executor.execute(&directive, &self.session) {
            Ok(Outcome::SessionChanged(session)) => {
                debug!(?session, "Session replaced");
                self.session = session;
            }
            Ok(Outcome::Executed) => debug!(kind = %directive.kind(), "Tag handled"),
            Ok(Outcome::Skipped(reason)) => debug!(?reason, "Tag handled without action"),
            Err(e) => self.report_failure(&e),
        }
    }

    fn report_failure(&self, error: &ExecError) {
        if error.is_transport() {
            warn!(
                room = self.session.room_name(),
                error = %error,
                "Failed to reach the Sonos system, tag ignored"
            );
        } else {
            warn!(room = self.session.room_name(), error = %error, "Tag could not be handled");
        }
    }

    fn unreadable_tag(&self, error: Option<&TagReadError>) {
        match error {
            Some(e) => warn!(error = %e, "Error reading a text tag from NFC"),
            None => warn!(
                "NFC reader could not read tag. The reader may not have had a clear read, \
                 or the tag is encrypted, a MIFARE Classic card, or holds non-text data"
            ),
        }
        self.telemetry.report(NFC_READ_ERROR);
    }

    fn transition(&mut self, state: DispatchState) {
        trace!(from = ?self.state, to = ?state, "Dispatch state");
        self.state = state;
    }
}
