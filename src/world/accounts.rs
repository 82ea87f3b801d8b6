//! Account records backed by sled.
//!
//! The world core only asks whether an account exists; login and registration use the
//! rest. Records are bincode-encoded under `accounts:<lowercase name>` and carry an
//! Argon2id PHC hash, never the password itself.

use std::path::Path;

use argon2::Argon2;
use chrono::{DateTime, Utc};
use log::info;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde::{Deserialize, Serialize};

use crate::world::errors::WorldError;

const TREE_ACCOUNTS: &str = "accounts";
const ACCOUNT_SCHEMA_VERSION: u16 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccountRecord {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub banned: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub schema_version: u16,
}

pub struct AccountStore {
    _db: sled::Db,
    accounts: sled::Tree,
    argon2: Argon2<'static>,
}

impl AccountStore {
    /// Open (or create) the account database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WorldError> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;
        let db = sled::open(path)?;
        let accounts = db.open_tree(TREE_ACCOUNTS)?;
        Ok(Self {
            _db: db,
            accounts,
            argon2: Argon2::default(),
        })
    }

    fn key(name: &str) -> Vec<u8> {
        format!("accounts:{}", name.trim().to_lowercase()).into_bytes()
    }

    fn hash(&self, password: &str) -> Result<String, WorldError> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| WorldError::Internal(format!("password hashing failed: {e}")))
    }

    fn put(&self, record: &AccountRecord) -> Result<(), WorldError> {
        let bytes = bincode::serialize(record)?;
        self.accounts.insert(Self::key(&record.name), bytes)?;
        self.accounts.flush()?;
        Ok(())
    }

    pub fn account_exists(&self, name: &str) -> Result<bool, WorldError> {
        Ok(self.accounts.contains_key(Self::key(name))?)
    }

    pub fn get(&self, name: &str) -> Result<AccountRecord, WorldError> {
        let Some(bytes) = self.accounts.get(Self::key(name))? else {
            return Err(WorldError::NotFound(format!("account: {}", name)));
        };
        Ok(bincode::deserialize(&bytes)?)
    }

    pub fn create_account(&self, name: &str, email: &str, password: &str) -> Result<AccountRecord, WorldError> {
        if self.account_exists(name)? {
            return Err(WorldError::PermissionDenied(format!(
                "account '{}' already exists",
                name
            )));
        }
        let record = AccountRecord {
            name: name.trim().to_string(),
            email: email.trim().to_string(),
            password_hash: self.hash(password)?,
            banned: false,
            created_at: Utc::now(),
            last_login: None,
            schema_version: ACCOUNT_SCHEMA_VERSION,
        };
        self.put(&record)?;
        info!("created account '{}'", record.name);
        Ok(record)
    }

    /// Check credentials and stamp the login time. Wrong passwords and banned accounts
    /// are `PermissionDenied`.
    pub fn verify_password(&self, name: &str, password: &str) -> Result<AccountRecord, WorldError> {
        let mut record = self.get(name)?;
        let parsed = PasswordHash::new(&record.password_hash)
            .map_err(|e| WorldError::Internal(format!("corrupt password hash: {e}")))?;
        if self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            return Err(WorldError::PermissionDenied("bad password".to_string()));
        }
        if record.banned {
            return Err(WorldError::PermissionDenied(format!(
                "account '{}' is banned",
                record.name
            )));
        }
        record.last_login = Some(Utc::now());
        self.put(&record)?;
        Ok(record)
    }

    pub fn set_banned(&self, name: &str, banned: bool) -> Result<(), WorldError> {
        let mut record = self.get(name)?;
        record.banned = banned;
        self.put(&record)?;
        info!(
            "account '{}' {}",
            record.name,
            if banned { "banned" } else { "unbanned" }
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn create_and_verify() {
        let tmp = TempDir::new().unwrap();
        let store = AccountStore::open(tmp.path().join("accounts.db")).unwrap();
        store.create_account("Kira", "kira@example.org", "hunter22").unwrap();

        assert!(store.account_exists("kira").unwrap());
        assert!(store.verify_password("KIRA", "hunter22").is_ok());
        assert!(matches!(
            store.verify_password("Kira", "wrong"),
            Err(WorldError::PermissionDenied(_))
        ));
        assert!(store.create_account("kira", "", "x").is_err());
    }

    #[test]
    fn banned_accounts_cannot_log_in() {
        let tmp = TempDir::new().unwrap();
        let store = AccountStore::open(tmp.path()).unwrap();
        store.create_account("Vex", "", "pw").unwrap();
        store.set_banned("vex", true).unwrap();
        assert!(store.verify_password("Vex", "pw").is_err());
        store.set_banned("vex", false).unwrap();
        assert!(store.verify_password("Vex", "pw").unwrap().last_login.is_some());
    }

    #[test]
    fn missing_account_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let store = AccountStore::open(tmp.path()).unwrap();
        assert!(!store.account_exists("nobody").unwrap());
        assert!(matches!(store.get("nobody"), Err(WorldError::NotFound(_))));
    }
}
