//! Request-id-keyed response body buffer
//!
//! ResponseLogger records each response body here as it passes; stages
//! further from the transport can fall back to the recorded copy if the
//! body was taken along the way. Entries are cleared by ErrorClassifier at
//! every terminal state so the map never grows across operations.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct BodyBuffer {
    entries: Arc<Mutex<HashMap<Uuid, Option<Bytes>>>>,
}

impl BodyBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the body seen for a request; `None` marks "observed, no body".
    /// A retry of the same request id overwrites the prior entry.
    pub fn record(&self, request_id: Uuid, body: Option<Bytes>) {
        self.entries.lock().insert(request_id, body);
    }

    /// Recorded body for a request, if any stage captured one.
    pub fn get(&self, request_id: &Uuid) -> Option<Bytes> {
        self.entries.lock().get(request_id).cloned().flatten()
    }

    pub fn clear(&self, request_id: &Uuid) {
        self.entries.lock().remove(request_id);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
