use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::payment::ProofImage;
use crate::domain::ports::ProofStorage;

/// Keeps payment proofs as plain files under one directory.
pub struct FsProofStore {
    root: PathBuf,
}

impl FsProofStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ProofStorage for FsProofStore {
    fn store(&self, order_id: Uuid, image: &ProofImage) -> Result<String, DomainError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            DomainError::Internal(format!("cannot create {}: {}", self.root.display(), e))
        })?;

        let nonce = Uuid::new_v4().simple().to_string();
        let file_name = format!(
            "pay_{}_{}_{}.{}",
            order_id.simple(),
            Utc::now().timestamp_millis(),
            &nonce[..8],
            image.kind.extension()
        );
        let dest = self.root.join(&file_name);
        // Never overwrite a proof another payment row may point to.
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&dest)
            .map_err(|e| DomainError::Internal(format!("cannot create {}: {}", dest.display(), e)))?;
        file.write_all(&image.bytes).map_err(|e| {
            DomainError::Internal(format!("cannot write {}: {}", dest.display(), e))
        })?;
        Ok(file_name)
    }

    fn discard(&self, path: &str) {
        let full = self.root.join(path);
        if let Err(e) = fs::remove_file(&full) {
            log::warn!("Could not remove orphaned proof {}: {}", full.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("proofs-{}", Uuid::new_v4()))
    }

    #[test]
    fn stores_and_discards_files() {
        let root = scratch_dir();
        let store = FsProofStore::new(&root);
        let order_id = Uuid::new_v4();
        let image = ProofImage::new("image/webp", vec![1, 2, 3]).unwrap();

        let name = store.store(order_id, &image).expect("store failed");
        assert!(name.starts_with(&format!("pay_{}_", order_id.simple())));
        assert!(name.ends_with(".webp"));
        assert_eq!(fs::read(root.join(&name)).unwrap(), vec![1, 2, 3]);

        store.discard(&name);
        assert!(!root.join(&name).exists());
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn repeated_uploads_for_one_order_get_their_own_files() {
        let root = scratch_dir();
        let store = FsProofStore::new(&root);
        let order_id = Uuid::new_v4();
        let first = ProofImage::new("image/png", vec![1]).unwrap();
        let second = ProofImage::new("image/png", vec![2]).unwrap();

        let names: Vec<String> = (0..5)
            .map(|_| store.store(order_id, &first).expect("store failed"))
            .collect();
        let last = store.store(order_id, &second).expect("store failed");

        let mut unique = names.clone();
        unique.push(last.clone());
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 6);
        assert_eq!(fs::read(root.join(&names[0])).unwrap(), vec![1]);
        assert_eq!(fs::read(root.join(&last)).unwrap(), vec![2]);

        store.discard(&last);
        assert!(root.join(&names[0]).exists());
        fs::remove_dir_all(&root).ok();
    }
}
