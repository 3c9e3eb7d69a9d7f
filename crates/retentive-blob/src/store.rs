//! Content-addressed blob storage
//!
//! Blobs are immutable once written and named by the blake3 hash of their
//! bytes, laid out as `<root>/<hash[0:2]>/<hash>`. Writes are idempotent:
//! identical content lands on an identical path, so concurrent writers are
//! safe by construction.

use retentive_core::{MemoryError, MemoryResult};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const IO_CHUNK: usize = 256 * 1024;
const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(30);

pub struct BlobStore {
    root: PathBuf,
    io_timeout: Duration,
}

impl BlobStore {
    /// Open (creating if needed) a blob directory
    pub fn open(root: impl Into<PathBuf>) -> MemoryResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| MemoryError::StorageUnavailable(format!("{}: {e}", root.display())))?;
        Ok(Self {
            root,
            io_timeout: DEFAULT_IO_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a hash maps to: two-hex fan-out directory, then the full hash
    pub fn path_for(&self, hash: &str) -> PathBuf {
        self.root.join(&hash[..2.min(hash.len())]).join(hash)
    }

    /// Store bytes, returning their hash. A failure never leaves a partial
    /// blob behind: content goes to a temp file first and is renamed into
    /// place only when complete.
    pub fn write(&self, bytes: &[u8]) -> MemoryResult<String> {
        let hash = blake3::hash(bytes).to_hex().to_string();
        let path = self.path_for(&hash);
        if path.exists() {
            return Ok(hash);
        }

        let parent = path.parent().expect("blob path always has a parent");
        std::fs::create_dir_all(parent)
            .map_err(|e| MemoryError::StorageUnavailable(format!("{}: {e}", parent.display())))?;

        let temp = parent.join(format!(".tmp-{hash}"));
        let result = self.write_chunked(&temp, bytes);
        if let Err(e) = result {
            let _ = std::fs::remove_file(&temp);
            return Err(e);
        }
        std::fs::rename(&temp, &path).map_err(|e| {
            let _ = std::fs::remove_file(&temp);
            MemoryError::StorageUnavailable(format!("rename {}: {e}", path.display()))
        })?;
        tracing::debug!(hash = %hash, size = bytes.len(), "blob written");
        Ok(hash)
    }

    fn write_chunked(&self, temp: &Path, bytes: &[u8]) -> MemoryResult<()> {
        let started = Instant::now();
        let mut file = std::fs::File::create(temp)
            .map_err(|e| MemoryError::StorageUnavailable(format!("{}: {e}", temp.display())))?;
        for chunk in bytes.chunks(IO_CHUNK) {
            if started.elapsed() > self.io_timeout {
                return Err(MemoryError::StorageUnavailable(format!(
                    "blob write exceeded {:?}",
                    self.io_timeout
                )));
            }
            file.write_all(chunk)
                .map_err(|e| MemoryError::StorageUnavailable(e.to_string()))?;
        }
        file.sync_all()
            .map_err(|e| MemoryError::StorageUnavailable(e.to_string()))?;
        Ok(())
    }

    /// Read a blob back by hash
    pub fn read(&self, hash: &str) -> MemoryResult<Vec<u8>> {
        let path = self.path_for(hash);
        let started = Instant::now();
        let mut file = std::fs::File::open(&path).map_err(|e| {
            MemoryError::StorageUnavailable(format!("blob {hash} unreadable: {e}"))
        })?;
        let mut out = Vec::new();
        let mut chunk = vec![0u8; IO_CHUNK];
        loop {
            if started.elapsed() > self.io_timeout {
                return Err(MemoryError::StorageUnavailable(format!(
                    "blob read exceeded {:?}",
                    self.io_timeout
                )));
            }
            let n = file
                .read(&mut chunk)
                .map_err(|e| MemoryError::StorageUnavailable(e.to_string()))?;
            if n == 0 {
                break;
            }
            out.extend_from_slice(&chunk[..n]);
        }
        Ok(out)
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.path_for(hash).exists()
    }

    /// Blob count and total bytes on disk
    pub fn stats(&self) -> MemoryResult<(usize, u64)> {
        let hashes = self.list()?;
        let mut total = 0u64;
        for hash in &hashes {
            total += std::fs::metadata(self.path_for(hash)).map(|m| m.len()).unwrap_or(0);
        }
        Ok((hashes.len(), total))
    }

    /// Re-hash every blob and return the names whose content no longer
    /// matches; an empty result means the store is intact
    pub fn verify(&self) -> MemoryResult<Vec<String>> {
        let mut corrupt = Vec::new();
        for hash in self.list()? {
            match self.read(&hash) {
                Ok(bytes) => {
                    if blake3::hash(&bytes).to_hex().to_string() != hash {
                        corrupt.push(hash);
                    }
                }
                Err(_) => corrupt.push(hash),
            }
        }
        Ok(corrupt)
    }

    /// Hashes of every stored blob, sorted
    pub fn list(&self) -> MemoryResult<Vec<String>> {
        let mut hashes = Vec::new();
        for fan_out in std::fs::read_dir(&self.root).map_err(MemoryError::Io)? {
            let fan_out = fan_out.map_err(MemoryError::Io)?;
            if !fan_out.path().is_dir() {
                continue;
            }
            for entry in std::fs::read_dir(fan_out.path()).map_err(MemoryError::Io)? {
                let entry = entry.map_err(MemoryError::Io)?;
                let name = entry.file_name().to_string_lossy().into_owned();
                if !name.starts_with(".tmp-") {
                    hashes.push(name);
                }
            }
        }
        hashes.sort();
        Ok(hashes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_and_read_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();
        let hash = store.write(b"checkpoint payload").unwrap();
        assert_eq!(store.read(&hash).unwrap(), b"checkpoint payload");
    }

    #[test]
    fn test_layout_is_two_hex_fanout() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();
        let hash = store.write(b"data").unwrap();
        let path = store.path_for(&hash);
        assert!(path.exists());
        assert_eq!(
            path.parent().unwrap().file_name().unwrap().to_str().unwrap(),
            &hash[..2]
        );
    }

    #[test]
    fn test_identical_content_deduplicates() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();
        let a = store.write(b"same bytes").unwrap();
        let b = store.write(b"same bytes").unwrap();
        assert_eq!(a, b);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn test_different_content_different_hash() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();
        let a = store.write(b"alpha").unwrap();
        let b = store.write(b"beta").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_missing_blob_is_an_error_not_a_panic() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();
        let err = store.read("deadbeef".repeat(8).as_str()).unwrap_err();
        assert!(err.to_string().contains("unreadable"));
    }

    #[test]
    fn test_unwritable_root_surfaces_error() {
        let err = BlobStore::open("/proc/retentive-cannot-write-here");
        assert!(err.is_err());
    }

    #[test]
    fn test_verify_detects_tampered_blob() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();
        let good = store.write(b"intact").unwrap();
        let bad = store.write(b"about to rot").unwrap();
        std::fs::write(store.path_for(&bad), b"rotten").unwrap();

        let corrupt = store.verify().unwrap();
        assert_eq!(corrupt, vec![bad]);
        assert!(store.verify().unwrap().iter().all(|h| *h != good));
    }

    #[test]
    fn test_stats_totals_blob_sizes() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();
        store.write(b"12345").unwrap();
        store.write(b"123").unwrap();
        let (count, bytes) = store.stats().unwrap();
        assert_eq!(count, 2);
        assert_eq!(bytes, 8);
    }

    #[test]
    fn test_list_skips_temp_files() {
        let dir = TempDir::new().unwrap();
        let store = BlobStore::open(dir.path()).unwrap();
        let hash = store.write(b"real").unwrap();
        let stray = store.path_for(&hash).parent().unwrap().join(".tmp-stray");
        std::fs::write(&stray, b"partial").unwrap();
        assert_eq!(store.list().unwrap(), vec![hash]);
    }
}
