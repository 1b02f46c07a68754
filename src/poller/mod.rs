//! Conversion-readiness polling.
//!
//! A [`ConversionSession`] holds the state of one polling loop and a
//! [`PollScheduler`] drives it: wait, check, and either finish or wait
//! again for longer. Cancellation goes through the session's
//! [`CancellationToken`] and is honoured at every suspension point.

pub mod backoff;


use crate::client::types::ItemId;
use crate::client::StatusClient;
use crate::config::PollConfig;
use backoff::Backoff;
use log::{debug, info, warn};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep, Sleep};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// A status request is in flight
    Checking,
    /// A timer is armed for the next check
    Waiting,
    /// Conversion finished
    Ready,
    /// Dismissed before conversion finished
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Cancelled)
    }
}

/// Observable snapshot of a session, published on every transition
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub state: SessionState,
    /// Delay used by the current (or next) wait
    pub next_delay: Duration,
    /// Status checks issued by the scheduler so far
    pub polls: u32,
    /// Set when the last check failed and the session is stalled
    pub last_error: Option<String>,
}

/// State of one polling loop for one item.
///
/// Created right after the first check reported not-ready, so it starts out
/// waiting with the initial delay armed. Must be created inside a tokio
/// runtime.
pub struct ConversionSession {
    item_id: ItemId,
    backoff: Backoff,
    state: SessionState,
    pending_timer: Option<Pin<Box<Sleep>>>,
    polls: u32,
    cancel: CancellationToken,
    status_tx: watch::Sender<SessionStatus>,
}

impl ConversionSession {
    pub fn new(
        item_id: ItemId,
        config: &PollConfig,
        cancel: CancellationToken,
    ) -> (Self, watch::Receiver<SessionStatus>) {
        let backoff = Backoff::new(config);
        let (status_tx, status_rx) = watch::channel(SessionStatus {
            state: SessionState::Waiting,
            next_delay: backoff.current(),
            polls: 0,
            last_error: None,
        });

        let mut session = Self {
            item_id,
            backoff,
            state: SessionState::Waiting,
            pending_timer: None,
            polls: 0,
            cancel,
            status_tx,
        };
        session.arm_timer();

        (session, status_rx)
    }

    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn next_delay(&self) -> Duration {
        self.backoff.current()
    }

    pub fn has_pending_timer(&self) -> bool {
        self.pending_timer.is_some()
    }

    fn arm_timer(&mut self) {
        self.pending_timer = Some(Box::pin(sleep(self.backoff.current())));
        self.transition(SessionState::Waiting);
    }

    fn transition(&mut self, state: SessionState) {
        if state != SessionState::Waiting {
            self.pending_timer = None;
        }

        self.state = state;
        let next_delay = self.backoff.current();
        let polls = self.polls;
        self.status_tx.send_modify(|status| {
            status.state = state;
            status.next_delay = next_delay;
            status.polls = polls;
            if state != SessionState::Checking {
                status.last_error = None;
            }
        });
    }

    fn record_stall(&self, error: String) {
        self.status_tx.send_modify(|status| status.last_error = Some(error));
    }
}

/// Drives a [`ConversionSession`] until it is ready or cancelled
pub struct PollScheduler {
    client: Arc<dyn StatusClient>,
}

impl PollScheduler {
    pub fn new(client: Arc<dyn StatusClient>) -> Self {
        Self { client }
    }

    /// Run the polling loop. Returns the terminal state reached.
    ///
    /// A failed check leaves the session in `Checking` with no timer armed;
    /// the loop then only waits for cancellation.
    pub async fn run(&self, session: &mut ConversionSession) -> SessionState {
        let cancel = session.cancel.clone();

        loop {
            match session.state() {
                SessionState::Waiting => {
                    if session.pending_timer.is_none() {
                        session.arm_timer();
                    }

                    let fired = match session.pending_timer.as_mut() {
                        Some(timer) => tokio::select! {
                            biased;
                            _ = cancel.cancelled() => false,
                            _ = timer.as_mut() => true,
                        },
                        None => false,
                    };

                    if !fired || cancel.is_cancelled() {
                        Self::finish_cancelled(session);
                        continue;
                    }

                    session.polls += 1;
                    session.transition(SessionState::Checking);
                }
                SessionState::Checking => {
                    debug!(
                        "Polling conversion status of item {} (poll #{}, delay {:?})",
                        session.item_id,
                        session.polls,
                        session.backoff.current()
                    );

                    let result = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => None,
                        result = self.client.check_status(&session.item_id, false) => Some(result),
                    };

                    match result {
                        // Late answers after a dismissal are discarded.
                        None => Self::finish_cancelled(session),
                        Some(_) if cancel.is_cancelled() => Self::finish_cancelled(session),
                        Some(Ok(status)) if status.is_ready => {
                            info!("Item {} is ready after {} polls", session.item_id, session.polls);
                            session.transition(SessionState::Ready);
                        }
                        Some(Ok(_)) => {
                            let delay = session.backoff.advance();
                            debug!("Item {} not ready, next poll in {:?}", session.item_id, delay);
                            session.arm_timer();
                        }
                        Some(Err(e)) => {
                            warn!(
                                "Status check for item {} failed, polling stalled until dismissed: {}",
                                session.item_id, e
                            );
                            session.record_stall(e.to_string());
                            cancel.cancelled().await;
                            Self::finish_cancelled(session);
                        }
                    }
                }
                state @ (SessionState::Ready | SessionState::Cancelled) => return state,
            }
        }
    }

    fn finish_cancelled(session: &mut ConversionSession) {
        info!("Conversion polling for item {} cancelled", session.item_id);
        session.transition(SessionState::Cancelled);
    }
}
