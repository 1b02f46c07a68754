#![allow(dead_code)]

use std::sync::Mutex;
use weblibri_client::{DismissHandle, ItemId, Navigator, ProgressDialog};

#[derive(Default)]
pub struct RecordingDialog {
    shown: Mutex<Vec<ItemId>>,
    handle: Mutex<Option<DismissHandle>>,
}

impl RecordingDialog {
    pub fn shown(&self) -> Vec<ItemId> {
        self.shown.lock().unwrap().clone()
    }

    pub fn dismiss(&self) {
        if let Some(handle) = self.handle.lock().unwrap().as_ref() {
            handle.dismiss();
        }
    }
}

impl ProgressDialog for RecordingDialog {
    fn show(&self, item: &ItemId, on_dismiss: DismissHandle) {
        self.shown.lock().unwrap().push(item.clone());
        *self.handle.lock().unwrap() = Some(on_dismiss);
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
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
