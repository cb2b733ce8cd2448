//! Priority queue for image fetches with bounded concurrency.
//!
//! Every reader view shares one [`ImageLoader`] so that rapid page navigation
//! never fetches the same address twice: an address that is in flight or
//! already loaded short-circuits to an immediately-resolved handle. Dispatch
//! order is ascending priority; equal priorities keep submission order.
//!
//! There is no ambient global instance. The loader is cheap to clone (shared
//! state behind an `Arc`), so the application constructs one and hands clones
//! to whoever needs it; tests build fully isolated instances the same way.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::prelude::*;

/// Completion handle for one load request.
///
/// Settles exactly once: `Ok(())` when the image finished loading, `Err` with
/// the fetch error on failure, or `Err(LoadError::Cancelled)` when the
/// request was discarded by [`ImageLoader::clear`] or [`ImageLoader::reset`].
/// Dropping the handle does not cancel the underlying fetch.
pub struct LoadHandle {
    rx: oneshot::Receiver<Result<(), LoadError>>,
}

impl LoadHandle {
    fn settled(result: Result<(), LoadError>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(result);
        Self { rx }
    }
}

impl Future for LoadHandle {
    type Output = Result<(), LoadError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            // Sender dropped without settling: the request was discarded.
            Poll::Ready(Err(_)) => Poll::Ready(Err(LoadError::Cancelled)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// A request waiting in the pending queue.
struct PendingLoad {
    src: String,
    priority: i32,
    /// Generation current when the request was enqueued. A completion whose
    /// generation no longer matches the loader's must not touch bookkeeping.
    generation: u64,
    done: oneshot::Sender<Result<(), LoadError>>,
}

struct LoaderState {
    /// Pending requests, sorted ascending by priority (stable).
    queue: Vec<PendingLoad>,
    /// Addresses currently in flight.
    loading: HashSet<String>,
    /// Addresses that have loaded successfully. Permanent until `clear`.
    loaded: HashSet<String>,
    config: LoaderConfig,
    /// Bumped by `clear`/`reset` to invalidate outstanding requests.
    generation: u64,
}

/// Image load queue with per-address de-duplication.
#[derive(Clone)]
pub struct ImageLoader {
    state: Arc<Mutex<LoaderState>>,
    fetcher: Arc<dyn ImageFetcher>,
}

impl ImageLoader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, config: LoaderConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(LoaderState {
                queue: Vec::new(),
                loading: HashSet::new(),
                loaded: HashSet::new(),
                config: config.sanitize(),
                generation: 0,
            })),
            fetcher,
        }
    }

    /// Loader backed by [`HttpImageFetcher`], the usual frontend setup.
    pub fn http(config: LoaderConfig) -> Self {
        Self::new(Arc::new(HttpImageFetcher::new()), config)
    }

    /// Queue an image for loading.
    ///
    /// Lower `priority` dispatches first; ties keep submission order. If the
    /// address is already loading or loaded, no new fetch is issued and the
    /// returned handle is already resolved.
    pub fn add(&self, src: impl Into<String>, priority: i32) -> LoadHandle {
        let src = src.into();
        if src.is_empty() {
            return LoadHandle::settled(Err(LoadError::EmptyAddress));
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut state = self.state.lock().unwrap();
            if state.loaded.contains(&src) || state.loading.contains(&src) {
                debug!("skipping {}: already loading or loaded", src);
                return LoadHandle::settled(Ok(()));
            }

            debug!("queueing {} at priority {}", src, priority);
            let generation = state.generation;
            state.queue.push(PendingLoad {
                src,
                priority,
                generation,
                done: tx,
            });
            // Stable sort: equal priorities stay in submission order.
            state.queue.sort_by_key(|p| p.priority);
        }

        self.process_queue();
        LoadHandle { rx }
    }

    /// Preload a list of images, resolving after every one has settled.
    ///
    /// Each url is queued with priority equal to its position, so the list
    /// order is honored. `sequential` overrides the configured mode for the
    /// duration of the batch; the previous flag is restored once all loads
    /// settle, including when some of them fail or the batch is dropped.
    /// Failures do not short-circuit: the result holds one entry per url.
    pub async fn preload_images<I, S>(&self, urls: I, sequential: bool) -> Vec<Result<(), LoadError>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let previous = {
            let mut state = self.state.lock().unwrap();
            std::mem::replace(&mut state.config.sequential, sequential)
        };
        let _restore = SequentialRestore {
            loader: self.clone(),
            previous,
        };

        let handles: Vec<LoadHandle> = urls
            .into_iter()
            .enumerate()
            .map(|(index, url)| self.add(url, index as i32))
            .collect();

        futures::future::join_all(handles).await
    }

    /// Dispatch as many pending requests as the current mode allows.
    ///
    /// Safe to call redundantly; does nothing without capacity or work.
    fn process_queue(&self) {
        let mut to_dispatch = Vec::new();
        {
            let mut state = self.state.lock().unwrap();
            if state.config.sequential {
                // One image at a time.
                if state.loading.is_empty() && !state.queue.is_empty() {
                    let item = state.queue.remove(0);
                    state.loading.insert(item.src.clone());
                    to_dispatch.push(item);
                }
            } else {
                while state.loading.len() < state.config.max_concurrent
                    && !state.queue.is_empty()
                {
                    let item = state.queue.remove(0);
                    state.loading.insert(item.src.clone());
                    to_dispatch.push(item);
                }
            }
        }

        for item in to_dispatch {
            self.spawn_load(item);
        }
    }

    fn spawn_load(&self, item: PendingLoad) {
        let loader = self.clone();
        tokio::spawn(async move {
            debug!("loading {}", item.src);
            let result = loader.fetcher.fetch(&item.src).await;
            loader.finish_load(item, result);
        });
    }

    fn finish_load(&self, item: PendingLoad, result: Result<(), LoadError>) {
        {
            let mut state = self.state.lock().unwrap();
            if item.generation != state.generation {
                // The queue was cleared or reset while this fetch was in
                // flight; its bookkeeping is gone and must stay gone.
                debug!("stale completion for {}", item.src);
                let _ = item.done.send(Err(LoadError::Cancelled));
                return;
            }

            state.loading.remove(&item.src);
            match &result {
                Ok(()) => {
                    state.loaded.insert(item.src.clone());
                    debug!("loaded {}", item.src);
                }
                Err(e) => warn!("failed to load {}: {}", item.src, e),
            }
        }

        let _ = item.done.send(result);
        // A slot just freed up; keep the queue draining.
        self.process_queue();
    }

    /// Drop all bookkeeping, including the loaded set.
    ///
    /// Pending requests settle with [`LoadError::Cancelled`]; in-flight
    /// fetches keep running but their completions are ignored and their
    /// handles settle with [`LoadError::Cancelled`] as well.
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        debug!("clearing queue");
        state.generation += 1;
        for item in state.queue.drain(..) {
            let _ = item.done.send(Err(LoadError::Cancelled));
        }
        state.loading.clear();
        state.loaded.clear();
    }

    /// Like [`clear`](Self::clear), but the loaded set survives so a second
    /// pass skips addresses that already succeeded.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        debug!("resetting queue");
        state.generation += 1;
        for item in state.queue.drain(..) {
            let _ = item.done.send(Err(LoadError::Cancelled));
        }
        state.loading.clear();
    }

    /// Percentage of submitted addresses that have loaded, in `[0, 100]`.
    /// Returns `0.0` when nothing has ever been submitted.
    pub fn progress(&self) -> f32 {
        let state = self.state.lock().unwrap();
        let total = state.queue.len() + state.loading.len() + state.loaded.len();
        if total == 0 {
            0.0
        } else {
            state.loaded.len() as f32 / total as f32 * 100.0
        }
    }

    pub fn config(&self) -> LoaderConfig {
        self.state.lock().unwrap().config.clone()
    }

    pub fn set_config(&self, config: LoaderConfig) {
        self.state.lock().unwrap().config = config.sanitize();
        // The new limits may have opened capacity.
        self.process_queue();
    }

    pub fn set_sequential(&self, sequential: bool) {
        self.state.lock().unwrap().config.sequential = sequential;
        self.process_queue();
    }

    pub fn set_max_concurrent(&self, max_concurrent: usize) {
        self.state.lock().unwrap().config.max_concurrent = max_concurrent.max(1);
        self.process_queue();
    }

    pub fn pending_count(&self) -> usize {
        self.state.lock().unwrap().queue.len()
    }

    pub fn loading_count(&self) -> usize {
        self.state.lock().unwrap().loading.len()
    }

    pub fn loaded_count(&self) -> usize {
        self.state.lock().unwrap().loaded.len()
    }
}

/// Restores the sequential flag when a preload batch settles or is dropped.
struct SequentialRestore {
    loader: ImageLoader,
    previous: bool,
}

impl Drop for SequentialRestore {
    fn drop(&mut self) {
        self.loader
            .state
            .lock()
            .unwrap()
            .config
            .sequential = self.previous;
        self.loader.process_queue();
    }
}
