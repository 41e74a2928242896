use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

use super::{AssetError, Image};

/// Upper bound on concurrent decodes.
const MAX_DECODERS: usize = 4;

/// Notification produced by [`AssetStore::poll`].
#[derive(Debug, Clone)]
pub enum AssetEvent {
    /// An image finished decoding and is now returned by `get`.
    Loaded { key: String },
    /// A load failed; `get` keeps returning `None` for this key.
    Failed { key: String, error: Arc<AssetError> },
    /// Fraction of the current batch that has finished, in `[0, 1]`.
    Progress(f32),
    /// Every requested load of the current batch has finished.
    AllComplete,
}

/// Observable state of a key.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoadState {
    Missing,
    Pending,
    Ready,
    Failed,
}

#[derive(Debug)]
enum Slot {
    Pending,
    Ready(Arc<Image>),
    Failed(Arc<AssetError>),
}

struct Completion {
    key: String,
    result: Result<Image, AssetError>,
}

/// Path-keyed image cache with background decoding.
///
/// Keys are the path as given to [`load`](Self::load); aliases map onto keys.
/// Loading the same path twice is a no-op that returns the same key.
pub struct AssetStore {
    slots: HashMap<String, Slot>,
    aliases: HashMap<String, String>,

    tx: flume::Sender<Completion>,
    rx: flume::Receiver<Completion>,

    /// Created on the first background load.
    runtime: Option<Runtime>,

    /// Loads issued since the last `AllComplete`.
    requested: usize,
    /// Loads of the current batch that have finished (either way).
    finished: usize,
}

impl AssetStore {
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            slots: HashMap::new(),
            aliases: HashMap::new(),
            tx,
            rx,
            runtime: None,
            requested: 0,
            finished: 0,
        }
    }

    /// Starts loading `path` in the background and returns its key.
    ///
    /// `alias`, when given, becomes an additional lookup name for the same asset.
    /// A pending or loaded key is returned as is; a key whose previous load
    /// failed is loaded again.
    pub fn load(&mut self, path: impl AsRef<Path>, alias: Option<&str>) -> String {
        let path = path.as_ref();
        let key = path.to_string_lossy().into_owned();

        if let Some(alias) = alias {
            self.aliases.insert(alias.to_string(), key.clone());
        }

        match self.slots.get(&key) {
            Some(Slot::Pending | Slot::Ready(_)) => return key,
            Some(Slot::Failed(_)) => log::debug!("retrying failed asset: {key}"),
            None => {}
        }

        self.slots.insert(key.clone(), Slot::Pending);
        self.requested += 1;
        log::debug!("asset load requested: {key}");

        self.spawn_decode(key.clone(), path.to_path_buf());
        key
    }

    /// Reads and decodes on the blocking pool of the asset runtime. The result
    /// comes back through the channel drained by `poll`.
    fn spawn_decode(&mut self, key: String, path: PathBuf) {
        if self.runtime.is_none() {
            match asset_runtime() {
                Ok(rt) => self.runtime = Some(rt),
                Err(source) => {
                    log::error!("failed to start asset runtime: {source}");
                    let _ = self.tx.send(Completion {
                        key: key.clone(),
                        result: Err(AssetError::Io { path: key, source }),
                    });
                    return;
                }
            }
        }

        let Some(rt) = self.runtime.as_ref() else { return };
        let tx = self.tx.clone();
        rt.spawn_blocking(move || {
            let result = read_image(&key, &path);
            // The store may have been dropped; nothing left to notify.
            let _ = tx.send(Completion { key, result });
        });
    }

    /// Loads `path` on the calling thread and stores the result immediately.
    pub fn load_blocking(
        &mut self,
        path: impl AsRef<Path>,
        alias: Option<&str>,
    ) -> Result<Arc<Image>, AssetError> {
        let path = path.as_ref();
        let key = path.to_string_lossy().into_owned();
        if let Some(alias) = alias {
            self.aliases.insert(alias.to_string(), key.clone());
        }
        if let Some(Slot::Ready(img)) = self.slots.get(&key) {
            return Ok(img.clone());
        }

        let image = Arc::new(read_image(&key, path)?);
        self.slots.insert(key, Slot::Ready(image.clone()));
        Ok(image)
    }

    /// Registers an already decoded image under `key`.
    pub fn insert(&mut self, key: impl Into<String>, image: Image) -> Arc<Image> {
        let image = Arc::new(image);
        self.slots.insert(key.into(), Slot::Ready(image.clone()));
        image
    }

    /// Looks an image up by key or alias. `None` while missing, pending or failed.
    pub fn get(&self, key: &str) -> Option<Arc<Image>> {
        match self.slots.get(self.resolve(key))? {
            Slot::Ready(img) => Some(img.clone()),
            Slot::Pending | Slot::Failed(_) => None,
        }
    }

    pub fn state(&self, key: &str) -> LoadState {
        match self.slots.get(self.resolve(key)) {
            None => LoadState::Missing,
            Some(Slot::Pending) => LoadState::Pending,
            Some(Slot::Ready(_)) => LoadState::Ready,
            Some(Slot::Failed(_)) => LoadState::Failed,
        }
    }

    /// Error of a failed key, if any.
    pub fn error(&self, key: &str) -> Option<Arc<AssetError>> {
        match self.slots.get(self.resolve(key))? {
            Slot::Failed(e) => Some(e.clone()),
            _ => None,
        }
    }

    /// Number of loads still in flight.
    pub fn pending(&self) -> usize {
        self.slots.values().filter(|s| matches!(s, Slot::Pending)).count()
    }

    /// Fraction of the current batch that has finished. `1.0` when idle.
    pub fn progress(&self) -> f32 {
        if self.requested == 0 {
            1.0
        } else {
            self.finished as f32 / self.requested as f32
        }
    }

    /// Applies finished background loads. Call once per frame.
    ///
    /// Events are returned in completion order; a `Progress` event follows every
    /// completion, and `AllComplete` closes a batch once nothing is pending.
    pub fn poll(&mut self) -> Vec<AssetEvent> {
        let mut events = Vec::new();
        while let Ok(done) = self.rx.try_recv() {
            self.apply(done, &mut events);
        }
        self.finish_batch(&mut events);
        events
    }

    /// Like [`poll`](Self::poll), but waits up to `timeout` for the first completion
    /// when nothing has finished yet.
    pub fn poll_timeout(&mut self, timeout: Duration) -> Vec<AssetEvent> {
        let mut events = Vec::new();
        if self.pending() > 0 {
            if let Ok(done) = self.rx.recv_timeout(timeout) {
                self.apply(done, &mut events);
            }
        }
        while let Ok(done) = self.rx.try_recv() {
            self.apply(done, &mut events);
        }
        self.finish_batch(&mut events);
        events
    }

    fn apply(&mut self, done: Completion, events: &mut Vec<AssetEvent>) {
        let Completion { key, result } = done;
        self.finished += 1;

        match result {
            Ok(image) => {
                log::debug!("asset loaded: {key} ({}x{})", image.width(), image.height());
                self.slots.insert(key.clone(), Slot::Ready(Arc::new(image)));
                events.push(AssetEvent::Loaded { key });
            }
            Err(err) => {
                log::warn!("asset failed: {err}");
                let err = Arc::new(err);
                self.slots.insert(key.clone(), Slot::Failed(err.clone()));
                events.push(AssetEvent::Failed { key, error: err });
            }
        }

        events.push(AssetEvent::Progress(self.progress()));
    }

    fn finish_batch(&mut self, events: &mut Vec<AssetEvent>) {
        if self.requested > 0 && self.finished >= self.requested && self.pending() == 0 {
            events.push(AssetEvent::AllComplete);
            self.requested = 0;
            self.finished = 0;
        }
    }

    fn resolve<'a>(&'a self, key: &'a str) -> &'a str {
        self.aliases.get(key).map_or(key, String::as_str)
    }
}

impl Default for AssetStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AssetStore {
    fn drop(&mut self) {
        // In-flight decodes finish on their own; their results are discarded.
        if let Some(rt) = self.runtime.take() {
            rt.shutdown_background();
        }
    }
}

fn asset_runtime() -> std::io::Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(1)
        .max_blocking_threads(MAX_DECODERS)
        .thread_name("kite-asset")
        .build()
}

fn read_image(key: &str, path: &Path) -> Result<Image, AssetError> {
    let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
        path: key.to_string(),
        source,
    })?;
    Image::decode(key, &bytes)
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        ::image::RgbaImage::from_pixel(w, h, ::image::Rgba([255, 0, 0, 255]))
            .save(&path)
            .unwrap();
        path
    }

    fn drain(store: &mut AssetStore) -> Vec<AssetEvent> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while Instant::now() < deadline {
            events.extend(store.poll_timeout(Duration::from_millis(50)));
            if events.iter().any(|e| matches!(e, AssetEvent::AllComplete)) {
                break;
            }
        }
        events
    }

    // ── lookup ────────────────────────────────────────────────────────────

    #[test]
    fn missing_key_is_absent() {
        let store = AssetStore::new();
        assert!(store.get("nope.png").is_none());
        assert_eq!(store.state("nope.png"), LoadState::Missing);
        assert_eq!(store.progress(), 1.0);
    }

    #[test]
    fn inserted_image_is_ready_immediately() {
        let mut store = AssetStore::new();
        store.insert("white", Image::solid(1, 1, [255; 4]).unwrap());
        assert_eq!(store.state("white"), LoadState::Ready);
        assert_eq!(store.get("white").unwrap().width(), 1);
    }

    // ── background loads ──────────────────────────────────────────────────

    #[test]
    fn load_then_poll_delivers_image_by_path_and_alias() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "hero.png", 3, 2);

        let mut store = AssetStore::new();
        let key = store.load(&path, Some("hero"));
        assert_eq!(store.state("hero"), LoadState::Pending);
        assert!(store.get("hero").is_none());

        let events = drain(&mut store);
        assert!(events.iter().any(|e| matches!(e, AssetEvent::Loaded { key: k } if *k == key)));
        assert!(matches!(events.last(), Some(AssetEvent::AllComplete)));

        let by_alias = store.get("hero").unwrap();
        let by_path = store.get(&key).unwrap();
        assert_eq!(by_alias.id(), by_path.id());
        assert_eq!((by_alias.width(), by_alias.height()), (3, 2));
    }

    #[test]
    fn loading_twice_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "a.png", 1, 1);

        let mut store = AssetStore::new();
        let k1 = store.load(&path, None);
        let k2 = store.load(&path, None);
        assert_eq!(k1, k2);

        let events = drain(&mut store);
        let loaded = events.iter().filter(|e| matches!(e, AssetEvent::Loaded { .. })).count();
        assert_eq!(loaded, 1);
    }

    #[test]
    fn missing_file_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AssetStore::new();
        let key = store.load(dir.path().join("absent.png"), None);

        let events = drain(&mut store);
        assert!(events.iter().any(|e| matches!(e, AssetEvent::Failed { .. })));
        assert_eq!(store.state(&key), LoadState::Failed);
        assert!(matches!(store.error(&key).as_deref(), Some(AssetError::Io { .. })));
        assert!(store.get(&key).is_none());
    }

    #[test]
    fn failed_key_can_be_loaded_again() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.png");

        let mut store = AssetStore::new();
        let key = store.load(&path, Some("late"));
        drain(&mut store);
        assert_eq!(store.state("late"), LoadState::Failed);

        write_png(dir.path(), "late.png", 2, 2);
        assert_eq!(store.load(&path, None), key);
        assert_eq!(store.state("late"), LoadState::Pending);

        let events = drain(&mut store);
        assert!(events.iter().any(|e| matches!(e, AssetEvent::Loaded { .. })));
        assert_eq!(store.get("late").unwrap().width(), 2);
    }

    #[test]
    fn many_loads_complete_on_bounded_pool() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = AssetStore::new();
        for i in 0..(MAX_DECODERS * 3) {
            let path = write_png(dir.path(), &format!("tile{i}.png"), 1, 1);
            store.load(&path, None);
        }
        assert_eq!(store.pending(), MAX_DECODERS * 3);

        let events = drain(&mut store);
        let loaded = events.iter().filter(|e| matches!(e, AssetEvent::Loaded { .. })).count();
        assert_eq!(loaded, MAX_DECODERS * 3);
        assert_eq!(store.pending(), 0);
    }

    #[test]
    fn progress_reaches_one() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 1, 1);
        let b = write_png(dir.path(), "b.png", 1, 1);

        let mut store = AssetStore::new();
        store.load(&a, None);
        store.load(&b, None);

        let events = drain(&mut store);
        let fractions: Vec<f32> = events
            .iter()
            .filter_map(|e| match e {
                AssetEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(fractions, vec![0.5, 1.0]);
    }

    #[test]
    fn load_blocking_caches_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "b.png", 4, 4);

        let mut store = AssetStore::new();
        let first = store.load_blocking(&path, Some("b")).unwrap();
        let second = store.load_blocking(&path, None).unwrap();
        assert_eq!(first.id(), second.id());
        assert_eq!(store.get("b").unwrap().id(), first.id());
    }
}
