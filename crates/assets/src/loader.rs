use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use orbitview_scene::ModelPart;

use crate::{AssetError, import_gltf};

/// Ticket for one outstanding load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadHandle(pub u64);

/// Result of a load request.
#[derive(Debug)]
pub enum LoadOutcome {
    Success(ModelPart),
    Failure(AssetError),
}

/// A finished load, delivered by [`AssetLoader::poll`].
#[derive(Debug)]
pub struct LoadCompletion {
    pub handle: LoadHandle,
    pub path: PathBuf,
    pub outcome: LoadOutcome,
}

/// One-shot reply slot for a single request.
///
/// Consumed by [`CompletionSender::complete`]. Dropping it unsent (for
/// example when a worker thread panics) reports
/// [`AssetError::Abandoned`], so a request always resolves once its sender
/// is gone.
#[derive(Debug)]
pub struct CompletionSender {
    handle: LoadHandle,
    path: PathBuf,
    tx: Option<Sender<LoadCompletion>>,
}

impl CompletionSender {
    pub fn handle(&self) -> LoadHandle {
        self.handle
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn complete(mut self, outcome: LoadOutcome) {
        self.send(outcome);
    }

    fn send(&mut self, outcome: LoadOutcome) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        let completion = LoadCompletion {
            handle: self.handle,
            path: self.path.clone(),
            outcome,
        };
        if tx.send(completion).is_err() {
            tracing::debug!(handle = ?self.handle, "loader dropped before completion");
        }
    }
}

impl Drop for CompletionSender {
    fn drop(&mut self) {
        if self.tx.is_some() {
            let path = self.path.clone();
            self.send(LoadOutcome::Failure(AssetError::Abandoned(path)));
        }
    }
}

/// Where model bytes come from and how the fetch is scheduled.
pub trait ModelSource {
    /// Begin fetching `path`. The outcome goes through `reply`, either
    /// before returning or later from another thread.
    fn fetch(&self, path: PathBuf, reply: CompletionSender);
}

/// Reads and decodes glTF files on a dedicated worker thread per request.
#[derive(Debug, Clone, Copy, Default)]
pub struct GltfSource;

impl ModelSource for GltfSource {
    fn fetch(&self, path: PathBuf, reply: CompletionSender) {
        let spawned = std::thread::Builder::new()
            .name("orbitview-load".into())
            .spawn(move || {
                let outcome = match import_gltf(&path) {
                    Ok(model) => LoadOutcome::Success(model),
                    Err(e) => LoadOutcome::Failure(e),
                };
                reply.complete(outcome);
            });
        // On spawn failure the closure, and with it `reply`, is dropped,
        // which resolves the request as abandoned.
        if let Err(e) = spawned {
            tracing::error!("failed to spawn load worker: {e}");
        }
    }
}

/// Holds every reply until the caller resolves it by hand.
///
/// Lets tests and headless tools decide when, and whether, a load finishes.
#[derive(Debug, Clone, Default)]
pub struct DeferredSource {
    held: Arc<Mutex<Vec<CompletionSender>>>,
}

impl DeferredSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every reply received so far.
    pub fn take_pending(&self) -> Vec<CompletionSender> {
        std::mem::take(&mut *self.held.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn pending(&self) -> usize {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl ModelSource for DeferredSource {
    fn fetch(&self, _path: PathBuf, reply: CompletionSender) {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(reply);
    }
}

/// Two-phase model loader: `request_load` returns at once, completions are
/// collected later with `poll` on the frame thread.
#[derive(Debug)]
pub struct AssetLoader<S = GltfSource> {
    source: S,
    tx: Sender<LoadCompletion>,
    rx: Receiver<LoadCompletion>,
    next_handle: u64,
    pending: BTreeMap<LoadHandle, PathBuf>,
}

impl AssetLoader<GltfSource> {
    pub fn new() -> Self {
        Self::with_source(GltfSource)
    }
}

impl Default for AssetLoader<GltfSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ModelSource> AssetLoader<S> {
    pub fn with_source(source: S) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            tx,
            rx,
            next_handle: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Start loading `path`. Never blocks.
    pub fn request_load(&mut self, path: impl Into<PathBuf>) -> LoadHandle {
        let path = path.into();
        let handle = LoadHandle(self.next_handle);
        self.next_handle += 1;
        tracing::info!(?handle, path = %path.display(), "model load requested");

        self.pending.insert(handle, path.clone());
        let reply = CompletionSender {
            handle,
            path: path.clone(),
            tx: Some(self.tx.clone()),
        };
        self.source.fetch(path, reply);
        handle
    }

    /// Drain every completion that has arrived, without blocking.
    pub fn poll(&mut self) -> Vec<LoadCompletion> {
        let mut done = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            if let Some(completion) = self.accept(completion) {
                done.push(completion);
            }
        }
        done
    }

    /// Block until one completion arrives or `timeout` elapses.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<LoadCompletion> {
        match self.rx.recv_timeout(timeout) {
            Ok(completion) => self.accept(completion),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, handle: LoadHandle) -> bool {
        self.pending.contains_key(&handle)
    }

    fn accept(&mut self, completion: LoadCompletion) -> Option<LoadCompletion> {
        if self.pending.remove(&completion.handle).is_none() {
            tracing::warn!(handle = ?completion.handle, "dropping completion for unknown load");
            return None;
        }
        match &completion.outcome {
            LoadOutcome::Success(model) => tracing::info!(
                handle = ?completion.handle,
                meshes = model.mesh_count(),
                "model load finished"
            ),
            LoadOutcome::Failure(e) => tracing::warn!(
                handle = ?completion.handle,
                path = %completion.path.display(),
                "model load failed: {e}"
            ),
        }
        Some(completion)
    }
}
