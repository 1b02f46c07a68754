//! Ties a polling loop to the lifetime of a progress dialog.
//!
//! Opening an item checks it once, asking the server to start converting.
//! A ready item is navigated to straight away; otherwise a progress dialog
//! is shown and a [`PollScheduler`] runs in the background until the item is
//! ready (navigate) or the dialog is dismissed (cancel).

pub mod registry;


use crate::client::types::ItemId;
use crate::client::StatusClient;
use crate::config::PollConfig;
use crate::error::ClientResult;
use crate::links::Links;
use crate::poller::{ConversionSession, PollScheduler, SessionState, SessionStatus};
use log::{debug, info};
use registry::SessionRegistry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// The progress dialog shown while an item converts
pub trait ProgressDialog: Send + Sync {
    /// Show the dialog for `item`. Closing the dialog must call
    /// [`DismissHandle::dismiss`] on `on_dismiss`.
    fn show(&self, item: &ItemId, on_dismiss: DismissHandle);
}

/// Moves the user to another location once an item can be read
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str);
}

/// Dismissal hook handed to the dialog. Dismissing twice is harmless.
#[derive(Debug, Clone)]
pub struct DismissHandle {
    item_id: ItemId,
    cancel: CancellationToken,
}

impl DismissHandle {
    pub fn dismiss(&self) {
        if !self.cancel.is_cancelled() {
            info!("Progress dialog for item {} dismissed", self.item_id);
        }
        self.cancel.cancel();
    }

    pub fn is_dismissed(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Caller-side view of a running session
#[derive(Debug, Clone)]
pub struct SessionHandle {
    item_id: ItemId,
    cancel: CancellationToken,
    status_rx: watch::Receiver<SessionStatus>,
    finished_rx: watch::Receiver<bool>,
}

impl SessionHandle {
    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn state(&self) -> SessionState {
        self.status_rx.borrow().state
    }

    pub fn status(&self) -> SessionStatus {
        self.status_rx.borrow().clone()
    }

    /// Neither finished nor dismissed
    pub fn is_live(&self) -> bool {
        !self.cancel.is_cancelled() && !self.state().is_terminal()
    }

    /// Cancel the session, same as dismissing its dialog
    pub fn dismiss(&self) {
        self.dismiss_handle().dismiss();
    }

    pub fn dismiss_handle(&self) -> DismissHandle {
        DismissHandle {
            item_id: self.item_id.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Wait until the session is ready or cancelled.
    ///
    /// Resolves only after the session has been wound down, so a ready
    /// item has already been navigated to when this returns.
    pub async fn wait(&self) -> SessionState {
        let mut finished_rx = self.finished_rx.clone();
        // An error means the task is gone; the last published state stands.
        let _ = finished_rx.wait_for(|finished| *finished).await;
        self.state()
    }
}

/// Result of opening an item
#[derive(Debug)]
pub enum OpenOutcome {
    /// The item was ready; the navigator was sent to this target.
    Navigated(String),
    /// The item is converting; a dialog is up and polling runs in the background.
    Converting(SessionHandle),
}

pub struct SessionLifecycle {
    client: Arc<dyn StatusClient>,
    dialog: Arc<dyn ProgressDialog>,
    navigator: Arc<dyn Navigator>,
    links: Links,
    poll: PollConfig,
    registry: Arc<SessionRegistry>,
    next_serial: AtomicU64,
}

impl SessionLifecycle {
    pub fn new(
        client: Arc<dyn StatusClient>,
        dialog: Arc<dyn ProgressDialog>,
        navigator: Arc<dyn Navigator>,
        links: Links,
        poll: PollConfig,
    ) -> Self {
        Self {
            client,
            dialog,
            navigator,
            links,
            poll,
            registry: Arc::new(SessionRegistry::new()),
            next_serial: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Open `item`: navigate if it is ready, otherwise start a session.
    ///
    /// An item that already has a live session gets that session back and
    /// no new check is issued. A failed first check is returned to the
    /// caller and leaves nothing behind.
    pub async fn open_item(&self, item: ItemId) -> ClientResult<OpenOutcome> {
        // Held until the new session is registered, so a concurrent open of
        // the same item finds it instead of starting another.
        let _opening = self.registry.lock_item(&item).await;

        if let Some(existing) = self.registry.get(&item).await {
            debug!("Item {} already has a live conversion session", item);
            return Ok(OpenOutcome::Converting(existing));
        }

        let status = self.client.check_status(&item, true).await?;
        let target = self.links.reader_url(&item);

        if status.is_ready {
            info!("Item {} is ready, opening {}", item, target);
            self.navigator.navigate(&target);
            return Ok(OpenOutcome::Navigated(target));
        }

        if let Some(uri) = &status.uri {
            debug!("Server reports reader location {} for item {}", uri, item);
        }
        info!(
            "Item {} is converting, polling every {:?} and growing",
            item, self.poll.initial_delay
        );

        let cancel = CancellationToken::new();
        let (mut session, status_rx) = ConversionSession::new(item.clone(), &self.poll, cancel.clone());
        let (finished_tx, finished_rx) = watch::channel(false);
        let handle = SessionHandle {
            item_id: item.clone(),
            cancel,
            status_rx,
            finished_rx,
        };

        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        self.registry.insert(serial, handle.clone()).await;
        self.dialog.show(&item, handle.dismiss_handle());

        let scheduler = PollScheduler::new(self.client.clone());
        let navigator = self.navigator.clone();
        let registry = self.registry.clone();

        tokio::spawn(async move {
            if scheduler.run(&mut session).await == SessionState::Ready {
                info!("Item {} converted, opening {}", item, target);
                navigator.navigate(&target);
            }
            registry.remove(&item, serial).await;
            finished_tx.send_replace(true);
        });

        Ok(OpenOutcome::Converting(handle))
    }
}
