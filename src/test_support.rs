//! In-process fakes for the status endpoint and the UI collaborators.

use crate::client::types::{ItemId, ReaderStatus};
use crate::client::StatusClient;
use crate::error::{ClientError, ClientResult};
use crate::session::{DismissHandle, Navigator, ProgressDialog};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::time::Instant;

/// What the fake server answers to one check
#[derive(Clone)]
pub(crate) enum Step {
    Ready,
    NotReady,
    Fail,
    /// Hold the request open until notified, then answer `is_ready`
    Hold(Arc<Notify>, bool),
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub item: ItemId,
    pub at: Instant,
    pub trigger: bool,
}

/// Answers checks from a script; once it runs out every check is not-ready.
#[derive(Default)]
pub(crate) struct ScriptedClient {
    script: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedClient {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn never_ready() -> Arc<Self> {
        Self::new(Vec::<Step>::new())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Gaps between consecutive checks, in milliseconds
    pub fn gaps_ms(&self) -> Vec<u128> {
        self.calls()
            .windows(2)
            .map(|pair| (pair[1].at - pair[0].at).as_millis())
            .collect()
    }
}

fn status(is_ready: bool) -> ReaderStatus {
    ReaderStatus { is_ready, uri: None }
}

#[async_trait]
impl StatusClient for ScriptedClient {
    async fn check_status(&self, item: &ItemId, trigger_conversion: bool) -> ClientResult<ReaderStatus> {
        self.calls.lock().unwrap().push(Call {
            item: item.clone(),
            at: Instant::now(),
            trigger: trigger_conversion,
        });

        let step = self.script.lock().unwrap().pop_front().unwrap_or(Step::NotReady);
        match step {
            Step::Ready => Ok(status(true)),
            Step::NotReady => Ok(status(false)),
            Step::Fail => Err(ClientError::UnexpectedStatus {
                status: 503,
                url: format!("http://books.local/api/{}/status.json", item),
            }),
            Step::Hold(gate, is_ready) => {
                gate.notified().await;
                Ok(status(is_ready))
            }
        }
    }
}

/// Records how often it was shown and keeps the dismissal handles.
#[derive(Default)]
pub(crate) struct RecordingDialog {
    shown: Mutex<Vec<ItemId>>,
    handles: Mutex<Vec<DismissHandle>>,
}

impl RecordingDialog {
    pub fn shown(&self) -> Vec<ItemId> {
        self.shown.lock().unwrap().clone()
    }

    /// Simulate the user closing the most recent dialog
    pub fn dismiss(&self) {
        if let Some(handle) = self.handles.lock().unwrap().last() {
            handle.dismiss();
        }
    }
}

impl ProgressDialog for RecordingDialog {
    fn show(&self, item: &ItemId, on_dismiss: DismissHandle) {
        self.shown.lock().unwrap().push(item.clone());
        self.handles.lock().unwrap().push(on_dismiss);
    }
}

#[derive(Default)]
pub(crate) struct RecordingNavigator {
    targets: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &str) {
        self.targets.lock().unwrap().push(target.to_string());
    }
}
