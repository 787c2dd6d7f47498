//! A thread-safe, on-disk cache for rendered tiles with LRU eviction.

use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use lru::LruCache;

use crate::graphics::Bitmap;
use crate::renderer::RendererJob;

const FILE_EXTENSION: &str = "tile";

struct Inner {
    /// `None` when the capacity is zero and the cache only pretends.
    lru: Option<LruCache<RendererJob, PathBuf>>,
    /// Monotonic counter naming the cache files.
    cache_id: u64,
}

/// Keeps PNG-compressed tiles as numbered files in a scratch directory,
/// keyed by the job that produced them. All operations share one lock, so
/// the cache can be used from several rendering workers at once.
///
/// Storage failures are never propagated; a tile that cannot be cached or
/// read back is simply rendered again.
pub struct FileSystemTileCache {
    directory: PathBuf,
    capacity: usize,
    inner: Mutex<Inner>,
}

impl FileSystemTileCache {
    /// Create a cache holding up to `capacity` tiles under `directory`.
    /// The directory is created if missing. Capacity 0 disables writes.
    pub fn new(capacity: usize, directory: impl Into<PathBuf>) -> std::io::Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;

        Ok(Self {
            directory,
            capacity,
            inner: Mutex::new(Inner {
                lru: NonZeroUsize::new(capacity).map(LruCache::new),
                cache_id: 0,
            }),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains_key(&self, job: &RendererJob) -> bool {
        let mut inner = self.lock();
        inner
            .lru
            .as_mut()
            .is_some_and(|lru| lru.contains(job))
    }

    /// Read the cached tile back, or `None` when it was never cached or its
    /// file has gone bad in the meantime. A tile that fails to decode is
    /// evicted.
    pub fn get(&self, job: &RendererJob) -> Option<Bitmap> {
        let mut inner = self.lock();
        let path = inner.lru.as_mut()?.get(job)?.clone();

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(error) => {
                log::error!("could not read cached tile {}: {error}", path.display());
                remove_entry(&mut inner, job);
                return None;
            }
        };

        match Bitmap::decode(&bytes) {
            Ok(bitmap) => Some(bitmap),
            Err(error) => {
                log::error!("corrupt cached tile {}: {error}", path.display());
                remove_entry(&mut inner, job);
                None
            }
        }
    }

    /// Compress and store the tile. With capacity 0 this does nothing.
    pub fn put(&self, job: &RendererJob, bitmap: &Bitmap) {
        let mut inner = self.lock();
        if inner.lru.is_none() {
            return;
        }

        let bytes = match bitmap.encode_png() {
            Ok(bytes) => bytes,
            Err(error) => {
                log::error!("could not compress tile for {:?}: {error}", job.tile);
                return;
            }
        };

        let path = self.output_file(&mut inner);
        if let Err(error) = fs::write(&path, bytes) {
            log::error!("could not write cached tile {}: {error}", path.display());
            return;
        }

        if let Some(lru) = inner.lru.as_mut() {
            if let Some((_, evicted)) = lru.push(job.clone(), path) {
                // Either an overwrite of the same key or an LRU eviction;
                // the file on disk is stale in both cases.
                if let Err(error) = fs::remove_file(&evicted) {
                    log::warn!(
                        "could not delete evicted tile {}: {error}",
                        evicted.display()
                    );
                }
            }
        }
    }

    /// Forget all entries and delete this cache's tile files.
    pub fn destroy(&self) {
        let mut inner = self.lock();
        if let Some(lru) = inner.lru.as_mut() {
            lru.clear();
        }

        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(error) => {
                log::error!(
                    "could not list cache directory {}: {error}",
                    self.directory.display()
                );
                return;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if is_tile_file(&path) {
                if let Err(error) = fs::remove_file(&path) {
                    log::error!("could not delete file {}: {error}", path.display());
                }
            }
        }
    }

    fn output_file(&self, inner: &mut Inner) -> PathBuf {
        loop {
            inner.cache_id += 1;
            let path = self
                .directory
                .join(format!("{}.{FILE_EXTENSION}", inner.cache_id));
            if !path.exists() {
                return path;
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A worker panicking mid-render leaves the table intact, so the
        // cache stays usable.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn remove_entry(inner: &mut Inner, job: &RendererJob) {
    if let Some(lru) = inner.lru.as_mut() {
        lru.pop(job);
    }
}

fn is_tile_file(path: &Path) -> bool {
    path.extension().is_some_and(|extension| extension == FILE_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Tile;

    fn job(x: u32) -> RendererJob {
        RendererJob::new(
            Tile { x, y: 0, zoom: 5 },
            "test.map",
            1.0,
        )
        .unwrap()
    }

    fn bitmap() -> Bitmap {
        Bitmap::new(4, 4)
    }

    #[test]
    fn put_then_get_roundtrips() {
        let directory = tempfile::tempdir().unwrap();
        let cache = FileSystemTileCache::new(4, directory.path()).unwrap();

        assert!(!cache.contains_key(&job(1)));
        cache.put(&job(1), &bitmap());
        assert!(cache.contains_key(&job(1)));
        assert_eq!(Some(bitmap()), cache.get(&job(1)));
    }

    #[test]
    fn capacity_zero_disables_writes() {
        let directory = tempfile::tempdir().unwrap();
        let cache = FileSystemTileCache::new(0, directory.path()).unwrap();

        cache.put(&job(1), &bitmap());
        assert!(!cache.contains_key(&job(1)));
        assert!(cache.get(&job(1)).is_none());
        assert_eq!(0, fs::read_dir(directory.path()).unwrap().count());
    }

    #[test]
    fn least_recently_used_tile_is_evicted_with_its_file() {
        let directory = tempfile::tempdir().unwrap();
        let cache = FileSystemTileCache::new(2, directory.path()).unwrap();

        cache.put(&job(1), &bitmap());
        cache.put(&job(2), &bitmap());
        cache.put(&job(3), &bitmap());

        assert!(!cache.contains_key(&job(1)));
        assert!(cache.contains_key(&job(2)));
        assert!(cache.contains_key(&job(3)));
        assert_eq!(2, fs::read_dir(directory.path()).unwrap().count());
    }

    #[test]
    fn corrupt_file_is_evicted_on_get() {
        let directory = tempfile::tempdir().unwrap();
        let cache = FileSystemTileCache::new(4, directory.path()).unwrap();

        cache.put(&job(1), &bitmap());
        // Scribble over the cached file.
        let file = fs::read_dir(directory.path())
            .unwrap()
            .flatten()
            .next()
            .unwrap()
            .path();
        fs::write(&file, b"scribble").unwrap();

        assert!(cache.get(&job(1)).is_none());
        assert!(!cache.contains_key(&job(1)));
    }

    #[test]
    fn destroy_clears_entries_and_files() {
        let directory = tempfile::tempdir().unwrap();
        let stranger = directory.path().join("keep.txt");
        fs::write(&stranger, b"not a tile").unwrap();

        let cache = FileSystemTileCache::new(4, directory.path()).unwrap();
        cache.put(&job(1), &bitmap());
        cache.put(&job(2), &bitmap());
        cache.destroy();

        assert!(!cache.contains_key(&job(1)));
        // Only this cache's tile files are gone.
        let remaining: Vec<PathBuf> = fs::read_dir(directory.path())
            .unwrap()
            .flatten()
            .map(|entry| entry.path())
            .collect();
        assert_eq!(vec![stranger], remaining);
    }
}
