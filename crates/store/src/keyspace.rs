use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::StoreError;

/// A durable string key-value space.
///
/// Each call is atomic on its own; there are no multi-key transactions.
/// Values are opaque serialized records.
pub trait KeySpace: Send + Sync {
    /// Returns the raw value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Inserts or overwrites `key`.
    fn put(&self, key: &str, value: String) -> Result<(), StoreError>;

    /// Removes `key`. Returns `true` if it existed.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Returns every entry whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError>;

    /// Removes every entry whose key starts with `prefix`. Returns the count.
    fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError>;
}

fn scan(map: &BTreeMap<String, String>, prefix: &str) -> Vec<(String, String)> {
    map.range(prefix.to_string()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn matching_keys(map: &BTreeMap<String, String>, prefix: &str) -> Vec<String> {
    map.range(prefix.to_string()..)
        .map(|(k, _)| k)
        .take_while(|k| k.starts_with(prefix))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// MemoryKeySpace
// ---------------------------------------------------------------------------

/// Ephemeral key space held in memory.
#[derive(Default)]
pub struct MemoryKeySpace {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryKeySpace {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeySpace for MemoryKeySpace {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let map = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        let mut map = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut map = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(map.remove(key).is_some())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        let map = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(scan(&map, prefix))
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let mut map = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let keys = matching_keys(&map, prefix);
        for key in &keys {
            map.remove(key);
        }
        Ok(keys.len())
    }
}

// ---------------------------------------------------------------------------
// FileKeySpace
// ---------------------------------------------------------------------------

/// Characters escaped in on-disk segment names.
///
/// `.` is escaped so no segment can be `.` or `..` or end in the value
/// suffix.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// On-disk name of an empty segment. Encoding never yields a lone `%`.
const EMPTY_SEGMENT: &str = "%";

const VALUE_SUFFIX: &str = ".json";

/// Attempts for a write racing a concurrent directory cleanup.
const WRITE_ATTEMPTS: usize = 3;

fn encode_segment(segment: &str) -> String {
    if segment.is_empty() {
        return EMPTY_SEGMENT.to_string();
    }
    utf8_percent_encode(segment, SEGMENT).to_string()
}

fn decode_segment(name: &str) -> Option<String> {
    if name == EMPTY_SEGMENT {
        return Some(String::new());
    }
    percent_decode_str(name)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

/// Key space stored as one file per key under a root directory.
///
/// Every `/`-separated key segment but the last becomes a directory level;
/// the last one names a `<segment>.json` value file. A write goes to a
/// uniquely named temporary sibling that is then renamed over the value
/// file, so a crash leaves either the old or the new value, and handles in
/// other processes sharing the directory never overwrite each other's keys.
pub struct FileKeySpace {
    root: PathBuf,
}

/// Value files and directories found below a key prefix.
#[derive(Default)]
struct Listing {
    /// `(key, value file)` pairs in key order.
    values: Vec<(String, PathBuf)>,
    /// Directories lying entirely inside the prefix, parents first.
    dirs: Vec<PathBuf>,
}

impl FileKeySpace {
    /// Opens (or creates) the key space rooted at `root`.
    pub fn open(root: PathBuf) -> Result<Self, StoreError> {
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn value_path(&self, key: &str) -> PathBuf {
        let mut path = self.root.clone();
        let mut segments = key.split('/');
        let leaf = segments.next_back().unwrap_or_default();
        for segment in segments {
            path.push(encode_segment(segment));
        }
        path.push(format!("{}{VALUE_SUFFIX}", encode_segment(leaf)));
        path
    }

    /// Writes `value` to `path` through a temporary sibling.
    fn write_value(&self, path: &Path, value: &str) -> io::Result<()> {
        let parent = path.parent().unwrap_or(&self.root);
        let tmp = parent.join(format!(".{}.tmp", Uuid::new_v4()));

        let result = (|| {
            let mut file = fs::File::create(&tmp)?;
            set_permissions_0600(&tmp);
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            fs::rename(&tmp, path)
        })();
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result
    }

    /// Walks the deepest directory fully named by `prefix`.
    fn list(&self, prefix: &str) -> Result<Listing, StoreError> {
        let mut listing = Listing::default();

        let (base, base_key) = match prefix.rsplit_once('/') {
            Some((dirs, _)) => {
                let mut base = self.root.clone();
                for segment in dirs.split('/') {
                    base.push(encode_segment(segment));
                }
                (base, format!("{dirs}/"))
            }
            None => (self.root.clone(), String::new()),
        };
        if !prefix.is_empty() && base_key == prefix {
            listing.dirs.push(base.clone());
        }

        let mut stack = vec![(base, base_key)];
        while let Some((dir, key)) = stack.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            for entry in entries {
                let entry = entry?;
                let file_name = entry.file_name();
                // Temporaries start with a dot; encoded segments never do.
                let Some(name) = file_name.to_str().filter(|n| !n.starts_with('.')) else {
                    continue;
                };

                let file_type = entry.file_type()?;
                if file_type.is_dir() {
                    let Some(segment) = decode_segment(name) else {
                        continue;
                    };
                    let child = format!("{key}{segment}/");
                    if child.starts_with(prefix) {
                        listing.dirs.push(entry.path());
                        stack.push((entry.path(), child));
                    } else if prefix.starts_with(&child) {
                        stack.push((entry.path(), child));
                    }
                } else if file_type.is_file()
                    && let Some(segment) = name.strip_suffix(VALUE_SUFFIX).and_then(decode_segment)
                {
                    let full = format!("{key}{segment}");
                    if full.starts_with(prefix) {
                        listing.values.push((full, entry.path()));
                    }
                }
            }
        }

        listing.values.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(listing)
    }
}

impl KeySpace for FileKeySpace {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        read_value(&self.value_path(key))
    }

    fn put(&self, key: &str, value: String) -> Result<(), StoreError> {
        let path = self.value_path(key);
        let parent = path.parent().unwrap_or(&self.root).to_path_buf();

        let mut attempt = 1;
        loop {
            fs::create_dir_all(&parent)?;
            match self.write_value(&path, &value) {
                // The directory was pruned by a concurrent prefix delete.
                Err(e) if e.kind() == ErrorKind::NotFound && attempt < WRITE_ATTEMPTS => {
                    trace!(key, attempt, "value directory vanished, retrying write");
                    attempt += 1;
                }
                result => return Ok(result?),
            }
        }
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        match fs::remove_file(self.value_path(key)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError> {
        let mut entries = Vec::new();
        for (key, path) in self.list(prefix)?.values {
            // Removed since the walk: skip.
            if let Some(value) = read_value(&path)? {
                entries.push((key, value));
            }
        }
        Ok(entries)
    }

    fn delete_prefix(&self, prefix: &str) -> Result<usize, StoreError> {
        let listing = self.list(prefix)?;

        let mut removed = 0;
        for (_, path) in &listing.values {
            match fs::remove_file(path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        // Children first; directories refilled concurrently stay.
        for dir in listing.dirs.iter().rev() {
            let _ = fs::remove_dir(dir);
        }

        if removed > 0 {
            debug!(prefix, count = removed, root = %self.root.display(), "deleted by prefix");
        }
        Ok(removed)
    }
}

/// Reads one value file. Invalid UTF-8 is passed on lossily so the record
/// fails to decode upstream and is discarded there.
fn read_value(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8(bytes).unwrap_or_else(|e| {
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn set_permissions_0600(path: &Path) {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(path, fs::Permissions::from_mode(0o600));
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
}
