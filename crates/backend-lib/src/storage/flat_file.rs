// ============================
// crates/backend-lib/src/storage/flat_file.rs
// ============================
//! Flat-file account store: one JSON record per account.
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use tokio::fs as tokio_fs;
use tracing::warn;
use uuid::Uuid;

use super::{AccountStore, StoreError};
use crate::account::Account;

const ACCOUNTS_DIR: &str = "accounts";
const TMP_DIR: &str = "tmp";

/// Flat-file implementation of the `AccountStore` trait
///
/// Layout under `root`:
/// - `accounts/<base64url(login)>.json`: one record per account
/// - `tmp/`: staging area for records being created
#[derive(Clone, Debug)]
pub struct FlatFileAccountStore {
    root: PathBuf,
}

impl FlatFileAccountStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(ACCOUNTS_DIR))?;
        fs::create_dir_all(root.join(TMP_DIR))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Logins may hold any character, so file names are the URL-safe
    /// base64 of the login bytes.
    fn record_path(&self, login: &str) -> PathBuf {
        let file_name = format!("{}.json", URL_SAFE_NO_PAD.encode(login.as_bytes()));
        self.root.join(ACCOUNTS_DIR).join(file_name)
    }
}

#[async_trait]
impl AccountStore for FlatFileAccountStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<Account>, StoreError> {
        let path = self.record_path(login);

        let content = match tokio_fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let account: Account =
            serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                login: login.to_string(),
                source,
            })?;

        Ok(Some(account))
    }

    async fn create(&self, login: &str, password: &str) -> Result<Account, StoreError> {
        let account = Account::open(login, password);
        let json = serde_json::to_string_pretty(&account)?;

        // Stage the full record first, then link it into place. `hard_link`
        // fails if the target exists, which makes the uniqueness check and
        // the insert one atomic step, and readers never see a partial file.
        let staged = self.root.join(TMP_DIR).join(format!("{}.json", Uuid::new_v4()));
        let linked = match tokio_fs::write(&staged, json).await {
            Ok(()) => tokio_fs::hard_link(&staged, self.record_path(login)).await,
            Err(e) => Err(e),
        };

        // A failed write may still have left a partial file behind
        match tokio_fs::remove_file(&staged).await {
            Ok(()) => {},
            Err(e) if e.kind() == ErrorKind::NotFound => {},
            Err(e) => {
                warn!(path = %staged.display(), error = %e, "failed to remove staged account record");
            },
        }

        match linked {
            Ok(()) => Ok(account),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::Conflict(login.to_string()))
            },
            Err(e) => Err(e.into()),
        }
    }
}
