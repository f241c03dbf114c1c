use super::{Identity, IdentityStore, MemoryIdentityStore, StoreError};
use crate::crypto::certificate::PublicCertificate;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::Zeroizing;

#[derive(Serialize, Deserialize)]
struct StoredIdentity {
    host: PublicCertificate,
    identity: Identity,
}

#[derive(Serialize, Deserialize, Default)]
struct StoreFile {
    identities: Vec<StoredIdentity>,
}

/// An [`IdentityStore`] persisted as a JSON file.
///
/// Lookups and inserts work on an in-memory copy; `save` writes the whole
/// file to a sibling temporary path, syncs it and renames it into place, so
/// readers of the file never see a partial write. Saves are serialized: the
/// snapshot taken by the last `save` to finish always contains every identity
/// added before it started.
///
/// 以 JSON 文件持久化的身份存储。查找与插入作用于内存副本；
/// `save` 先写入同目录下的临时文件并落盘，再重命名，读取方永远不会看到写入一半的文件。
/// 多次 `save` 串行执行，最后完成的一次总包含其开始前加入的全部身份。
#[derive(Debug)]
pub struct FileIdentityStore {
    path: PathBuf,
    inner: MemoryIdentityStore,
    save_lock: Mutex<()>,
}

impl FileIdentityStore {
    /// Opens the store at `path`, loading it if the file exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let inner = MemoryIdentityStore::new();

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let file: StoreFile = serde_json::from_str(&contents)?;
            for entry in file.identities {
                inner.add_identity(&entry.host, entry.identity);
            }
            debug!(path = %path.display(), count = inner.len(), "loaded identity store");
        }

        Ok(Self {
            path,
            inner,
            save_lock: Mutex::new(()),
        })
    }
}

/// Writes `bytes` next to `path`, syncs them, then renames over `path`.
fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    // Directory sync makes the rename itself durable on POSIX.
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if let Ok(dir) = File::open(dir) {
            let _ = dir.sync_all();
        }
    }
    Ok(())
}

impl IdentityStore for FileIdentityStore {
    fn get_identity(&self, host: &PublicCertificate) -> Option<Identity> {
        self.inner.get_identity(host)
    }

    fn add_identity(&self, host: &PublicCertificate, identity: Identity) -> Option<Identity> {
        self.inner.add_identity(host, identity)
    }

    fn remove_identity(&self, host: &PublicCertificate) -> Option<Identity> {
        self.inner.remove_identity(host)
    }

    fn save(&self) -> Result<(), StoreError> {
        let _guard = self.save_lock.lock();
        let file = StoreFile {
            identities: self
                .inner
                .identities
                .read()
                .iter()
                .map(|(host, identity)| StoredIdentity {
                    host: host.clone(),
                    identity: identity.clone(),
                })
                .collect(),
        };
        // Holds every private exponent in the store.
        let json = Zeroizing::new(serde_json::to_string_pretty(&file)?);

        atomic_write(&self.path, json.as_bytes())?;
        debug!(path = %self.path.display(), count = file.identities.len(), "saved identity store");
        Ok(())
    }
}
