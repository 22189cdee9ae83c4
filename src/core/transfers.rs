/*
 * Runs blob uploads, replacements, downloads and deletions off the calling thread. Each job
 * marks its file id busy until its completion has been collected with `poll`,
 * so the UI can disable actions on in-flight files without blocking others.
 * A failed job is reported like a successful one, carrying its error; either
 * way the busy marker is cleared.
 */
use super::blob_store::BlobStoreOperations;
use super::storage::StorageError;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    Upload,
    /* Overwrites the blob of a file that already has metadata. */
    Replace,
    Download,
    Delete,
}

#[derive(Debug)]
pub struct TransferCompletion {
    pub file_id: String,
    pub kind: TransferKind,
    /* Downloaded bytes for downloads, empty for the other kinds. */
    pub outcome: Result<Vec<u8>, StorageError>,
}

pub struct BlobTransfers {
    store: Arc<dyn BlobStoreOperations>,
    busy: HashSet<String>,
    tx: Sender<TransferCompletion>,
    rx: Receiver<TransferCompletion>,
}

impl BlobTransfers {
    pub fn new(store: Arc<dyn BlobStoreOperations>) -> Self {
        let (tx, rx) = mpsc::channel();
        BlobTransfers {
            store,
            busy: HashSet::new(),
            tx,
            rx,
        }
    }

    pub fn is_busy(&self, file_id: &str) -> bool {
        self.busy.contains(file_id)
    }

    pub fn busy_count(&self) -> usize {
        self.busy.len()
    }

    /* Returns false, starting nothing, when the file already has a job in flight. */
    fn spawn<F>(&mut self, file_id: &str, kind: TransferKind, job: F) -> bool
    where
        F: FnOnce(&dyn BlobStoreOperations) -> Result<Vec<u8>, StorageError> + Send + 'static,
    {
        if !self.busy.insert(file_id.to_string()) {
            log::warn!("BlobTransfers: '{file_id}' is busy, {kind:?} not started.");
            return false;
        }
        let store = Arc::clone(&self.store);
        let tx = self.tx.clone();
        let file_id = file_id.to_string();
        log::debug!("BlobTransfers: Starting {kind:?} of '{file_id}'.");
        thread::spawn(move || {
            let outcome = job(store.as_ref());
            if tx
                .send(TransferCompletion {
                    file_id,
                    kind,
                    outcome,
                })
                .is_err()
            {
                log::debug!("BlobTransfers: Completion receiver dropped.");
            }
        });
        true
    }

    pub fn begin_upload(&mut self, course_id: &str, file_id: &str, content: Vec<u8>) -> bool {
        let (course, file) = (course_id.to_string(), file_id.to_string());
        self.spawn(file_id, TransferKind::Upload, move |store| {
            store.put(&course, &file, &content).map(|_| Vec::new())
        })
    }

    pub fn begin_replace(&mut self, course_id: &str, file_id: &str, content: Vec<u8>) -> bool {
        let (course, file) = (course_id.to_string(), file_id.to_string());
        self.spawn(file_id, TransferKind::Replace, move |store| {
            store.put(&course, &file, &content).map(|_| Vec::new())
        })
    }

    pub fn begin_download(&mut self, course_id: &str, file_id: &str) -> bool {
        let (course, file) = (course_id.to_string(), file_id.to_string());
        self.spawn(file_id, TransferKind::Download, move |store| {
            store.get(&course, &file)
        })
    }

    pub fn begin_delete(&mut self, course_id: &str, file_id: &str) -> bool {
        let (course, file) = (course_id.to_string(), file_id.to_string());
        self.spawn(file_id, TransferKind::Delete, move |store| {
            store.delete(&course, &file).map(|_| Vec::new())
        })
    }

    fn finish(&mut self, completion: TransferCompletion) -> TransferCompletion {
        self.busy.remove(&completion.file_id);
        match &completion.outcome {
            Ok(_) => log::debug!(
                "BlobTransfers: {:?} of '{}' completed.",
                completion.kind,
                completion.file_id
            ),
            Err(e) => log::error!(
                "BlobTransfers: {:?} of '{}' failed: {e}",
                completion.kind,
                completion.file_id
            ),
        }
        completion
    }

    /* Collects every completion available right now without blocking. */
    pub fn poll(&mut self) -> Vec<TransferCompletion> {
        let mut done = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(completion) => done.push(self.finish(completion)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        done
    }

    /* Blocks up to `timeout` for the next completion. */
    pub fn wait_next(&mut self, timeout: Duration) -> Option<TransferCompletion> {
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => Some(self.finish(completion)),
            Err(_) => None,
        }
    }
}
