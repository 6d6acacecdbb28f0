//! Mapped Diagnostic Context
//!
//! Each thread owns a key/value map that layouts can render into every record
//! emitted from that thread (`%X`, `%X{key}`). The map keeps insertion order:
//! re-putting an existing key updates it in place, removing a key leaves the
//! remaining keys in their original order.
//!
//! Callbacks registered with [`register_init`] run once per thread, on that
//! thread's first MDC access, before the access itself proceeds. Logging an
//! enabled record counts as an access, so a freshly spawned thread always
//! starts from the same baseline keys as its siblings.
//!
//! # Example
//!
//! ```
//! use hierarchical_logger::mdc;
//!
//! mdc::put("request", "r-17");
//! assert_eq!(mdc::get("request").as_deref(), Some("r-17"));
//!
//! {
//!     let _guard = mdc::put_scoped("phase", "load");
//!     assert_eq!(mdc::len(), 2);
//! }
//! assert_eq!(mdc::get("phase"), None);
//! mdc::remove("request");
//! ```

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

type InitCallback = Arc<dyn Fn() + Send + Sync>;

static INIT_CALLBACKS: Lazy<RwLock<Vec<InitCallback>>> = Lazy::new(|| RwLock::new(Vec::new()));

thread_local! {
    static THREAD_MDC: RefCell<ThreadMdc> = RefCell::new(ThreadMdc::default());
}

#[derive(Default)]
struct ThreadMdc {
    initialized: bool,
    map: MdcMap,
}

/// Insertion-ordered diagnostic map owned by a single thread
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MdcMap {
    entries: IndexMap<String, String>,
}

impl MdcMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a key, keeping its original position when overwriting
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Remove a key; absent keys are ignored
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy the current contents into an immutable snapshot
    pub fn snapshot(&self) -> MdcSnapshot {
        MdcSnapshot {
            entries: self
                .entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Immutable copy of a thread's MDC taken when a record is emitted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MdcSnapshot {
    entries: Vec<(String, String)>,
}

impl MdcSnapshot {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MdcSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = MdcMap::new();
        for (k, v) in iter {
            map.put(k, v);
        }
        map.snapshot()
    }
}

/// Renders the whole map as `{{k1,v1}{k2,v2}}`, or `{}` when empty
impl fmt::Display for MdcSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (key, value) in &self.entries {
            write!(f, "{{{},{}}}", key, value)?;
        }
        f.write_str("}")
    }
}

/// Mark this thread initialized, reporting whether this was its first touch
fn mark_initialized() -> bool {
    THREAD_MDC
        .try_with(|state| !std::mem::replace(&mut state.borrow_mut().initialized, true))
        .unwrap_or(false)
}

fn run_callback(index: usize, callback: &InitCallback) {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback()));
    if result.is_err() {
        eprintln!(
            "[LOGGER ERROR] MDC init callback #{} panicked on thread {:?}",
            index,
            std::thread::current().id()
        );
    }
}

fn ensure_initialized() {
    if mark_initialized() {
        // Clone out so callbacks can use the MDC or register more callbacks
        let callbacks: Vec<InitCallback> = INIT_CALLBACKS.read().clone();
        for (index, callback) in callbacks.iter().enumerate() {
            run_callback(index, callback);
        }
    }
}

fn with_map<R>(default: R, f: impl FnOnce(&mut MdcMap) -> R) -> R {
    ensure_initialized();
    THREAD_MDC
        .try_with(|state| f(&mut state.borrow_mut().map))
        .unwrap_or(default)
}

/// Register a callback that seeds the MDC of every thread
///
/// The callback runs once on each thread when that thread first touches the
/// MDC. It also runs right away on the calling thread. Threads that touched
/// the MDC before registration do not run it. Returns the number of
/// registered callbacks.
pub fn register_init<F>(callback: F) -> usize
where
    F: Fn() + Send + Sync + 'static,
{
    let callback: InitCallback = Arc::new(callback);
    let count = {
        let mut callbacks = INIT_CALLBACKS.write();
        callbacks.push(Arc::clone(&callback));
        callbacks.len()
    };

    if mark_initialized() {
        let callbacks: Vec<InitCallback> = INIT_CALLBACKS.read().clone();
        for (index, cb) in callbacks.iter().enumerate() {
            run_callback(index, cb);
        }
    } else {
        run_callback(count - 1, &callback);
    }
    count
}

pub fn put(key: impl Into<String>, value: impl ToString) {
    let key = key.into();
    let value = value.to_string();
    with_map((), move |map| map.put(key, value));
}

pub fn get(key: &str) -> Option<String> {
    with_map(None, |map| map.get(key).map(str::to_string))
}

/// Remove a key from this thread's MDC; absent keys are ignored
pub fn remove(key: &str) {
    with_map((), |map| {
        map.remove(key);
    });
}

pub fn clear() {
    with_map((), MdcMap::clear);
}

pub fn len() -> usize {
    with_map(0, |map| map.len())
}

pub fn is_empty() -> bool {
    with_map(true, |map| map.is_empty())
}

/// Snapshot this thread's MDC
pub fn snapshot() -> MdcSnapshot {
    with_map(MdcSnapshot::default(), |map| map.snapshot())
}

/// Put a key for the lifetime of the returned guard
pub fn put_scoped(key: impl Into<String>, value: impl ToString) -> MdcGuard {
    let key = key.into();
    put(key.clone(), value);
    MdcGuard {
        key,
        _thread_bound: PhantomData,
    }
}

/// RAII guard for a scoped MDC key
///
/// When dropped, removes the key from the MDC of the thread that created it.
pub struct MdcGuard {
    key: String,
    _thread_bound: PhantomData<*const ()>,
}

impl Drop for MdcGuard {
    fn drop(&mut self) {
        remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_insertion_order() {
        let mut map = MdcMap::new();
        map.put("x", "3");
        map.put("y", "foo");
        map.put("z", "bar");
        map.put("x", "4");
        assert_eq!(map.snapshot().to_string(), "{{x,4}{y,foo}{z,bar}}");

        map.remove("y");
        assert_eq!(map.snapshot().to_string(), "{{x,4}{z,bar}}");
        assert_eq!(map.remove("absent"), None);
    }

    #[test]
    fn test_empty_snapshot_display() {
        assert_eq!(MdcSnapshot::default().to_string(), "{}");
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut map = MdcMap::new();
        map.put("k", "before");
        let snapshot = map.snapshot();
        map.put("k", "after");
        assert_eq!(snapshot.get("k"), Some("before"));
        assert_eq!(map.get("k"), Some("after"));
    }

    #[test]
    fn test_thread_local_isolation() {
        std::thread::spawn(|| {
            put("mdc_isolation", 1);
            let other = std::thread::spawn(|| get("mdc_isolation")).join().unwrap();
            assert_eq!(other, None);
            assert_eq!(get("mdc_isolation").as_deref(), Some("1"));
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_scoped_guard_removes_key() {
        std::thread::spawn(|| {
            {
                let _guard = put_scoped("mdc_scoped", "v");
                assert_eq!(get("mdc_scoped").as_deref(), Some("v"));
            }
            assert_eq!(get("mdc_scoped"), None);
        })
        .join()
        .unwrap();
    }
}
