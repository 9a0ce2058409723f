// Copyright (C) 2025 Joseph Sacchini
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU Affero General Public License as published by the Free
// Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more
// details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Flat-file user directory.
//!
//! Users live in a single JSON object keyed by username. Every mutation holds
//! an exclusive lock on `<file>.lock` for the whole read-modify-write cycle and
//! replaces the file atomically with mode `0600`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::fsutil::{self, FileLock};
use crate::timestamp;

/// Maximum username length in bytes.
pub const MAX_USERNAME_LEN: usize = 50;

/// Minimum password length in bytes.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A stored user. The username is the key in [`Users`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Argon2 PHC string, or a legacy bcrypt hash.
    pub password_hash: String,
    /// Inactive users cannot log in.
    pub is_active: bool,
    /// When the user was created.
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last password or status change.
    #[serde(default, with = "timestamp::option", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Last successful login.
    #[serde(default, with = "timestamp::option")]
    pub last_login: Option<DateTime<Utc>>,
}

/// The whole user directory, ordered by username.
pub type Users = BTreeMap<String, UserRecord>;

/// Failures of [`UserStore`] operations. Messages are shown to CLI users verbatim.
#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum UserStoreError {
    #[error("Invalid username format (alphanumeric and underscore only, max 50 chars)")]
    InvalidUsername,

    #[error("Password must be at least 8 characters long")]
    WeakPassword,

    #[error("Username '{0}' already exists")]
    DuplicateUser(String),

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("users file is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("failed to serialize users: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("password hashing failed")]
    PasswordHash,

    #[error("could not access users file: {0}")]
    Io(#[from] std::io::Error),
}

type Result<T> = std::result::Result<T, UserStoreError>;

/// `[A-Za-z0-9_]{1,50}`
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && username
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| UserStoreError::PasswordHash)
}

static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("wgpanel-unused-password").unwrap_or_default());

/// Run a full argon2 verify against a throwaway hash and discard the result.
/// Rejecting an unknown or inactive account this way costs the same as
/// rejecting a wrong password.
pub fn verify_dummy(password: &str) {
    if let Ok(parsed) = PasswordHash::new(&DUMMY_HASH) {
        let _ = Argon2::default().verify_password(password.as_bytes(), &parsed);
    }
}

/// Hashes written by earlier deployments use bcrypt (`$2y$`, `$2b$`, `$2a$`).
pub fn is_legacy_hash(hash: &str) -> bool {
    hash.starts_with("$2")
}

/// Handle on the users file. Cheap to clone; holds no cached state.
#[derive(Debug, Clone)]
pub struct UserStore {
    path: PathBuf,
}

impl UserStore {
    /// Store backed by the JSON file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the users file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole directory. A missing file is an empty directory.
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load(&self) -> Result<Users> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Users::new()),
            Ok(contents) => serde_json::from_str(&contents).map_err(UserStoreError::Corrupt),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("users file not found, treating as empty");
                Ok(Users::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a single user.
    #[tracing::instrument(skip(self))]
    pub fn get(&self, username: &str) -> Result<Option<UserRecord>> {
        Ok(self.load()?.remove(username))
    }

    fn save(&self, users: &Users) -> Result<()> {
        let json = serde_json::to_string_pretty(users).map_err(UserStoreError::Serialize)?;
        fsutil::write_atomic(&self.path, json.as_bytes())?;
        debug!(path = %self.path.display(), user_count = users.len(), "saved users file");
        Ok(())
    }

    fn modify<T>(&self, f: impl FnOnce(&mut Users) -> Result<T>) -> Result<T> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut users = self.load()?;
        let out = f(&mut users)?;
        self.save(&users)?;
        Ok(out)
    }

    fn modify_existing(
        &self,
        username: &str,
        f: impl FnOnce(&mut UserRecord) -> Result<()>,
    ) -> Result<()> {
        self.modify(|users| {
            let record = users
                .get_mut(username)
                .ok_or_else(|| UserStoreError::UserNotFound(username.to_owned()))?;
            f(record)
        })
    }

    /// Add an active user with a freshly hashed password.
    #[tracing::instrument(skip(self, password))]
    pub fn create(&self, username: &str, password: &str) -> Result<UserRecord> {
        if !is_valid_username(username) {
            return Err(UserStoreError::InvalidUsername);
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(UserStoreError::WeakPassword);
        }
        let password_hash = hash_password(password)?;

        let record = self.modify(|users| {
            if users.contains_key(username) {
                return Err(UserStoreError::DuplicateUser(username.to_owned()));
            }
            let record = UserRecord {
                password_hash,
                is_active: true,
                created_at: Some(Utc::now()),
                updated_at: None,
                last_login: None,
            };
            users.insert(username.to_owned(), record.clone());
            Ok(record)
        })?;

        info!(username, "user created");
        Ok(record)
    }

    /// Replace a user's password hash.
    #[tracing::instrument(skip(self, new_password))]
    pub fn update_password(&self, username: &str, new_password: &str) -> Result<()> {
        if new_password.len() < MIN_PASSWORD_LEN {
            return Err(UserStoreError::WeakPassword);
        }
        let password_hash = hash_password(new_password)?;

        self.modify_existing(username, |record| {
            record.password_hash = password_hash;
            record.updated_at = Some(Utc::now());
            Ok(())
        })?;

        info!(username, "password updated");
        Ok(())
    }

    /// Activate or deactivate a user.
    #[tracing::instrument(skip(self))]
    pub fn set_active(&self, username: &str, active: bool) -> Result<()> {
        self.modify_existing(username, |record| {
            record.is_active = active;
            record.updated_at = Some(Utc::now());
            Ok(())
        })?;

        info!(username, active, "user status changed");
        Ok(())
    }

    /// Remove a user.
    #[tracing::instrument(skip(self))]
    pub fn delete(&self, username: &str) -> Result<()> {
        self.modify(|users| {
            users
                .remove(username)
                .map(|_| ())
                .ok_or_else(|| UserStoreError::UserNotFound(username.to_owned()))
        })?;

        info!(username, "user deleted");
        Ok(())
    }

    /// Stamp `last_login`. A verified legacy bcrypt hash is replaced with an
    /// argon2 hash of `password` in the same write.
    #[tracing::instrument(skip(self, password))]
    pub fn record_login(&self, username: &str, password: &str) -> Result<()> {
        self.modify_existing(username, |record| {
            if is_legacy_hash(&record.password_hash) {
                record.password_hash = hash_password(password)?;
                info!(username, "upgraded legacy password hash");
            }
            record.last_login = Some(Utc::now());
            Ok(())
        })
    }

    /// Check `password` against the record's hash.
    #[tracing::instrument(skip(self, record, password))]
    pub fn verify_password(&self, record: &UserRecord, password: &str) -> Result<bool> {
        if is_legacy_hash(&record.password_hash) {
            return bcrypt::verify(password, &record.password_hash)
                .map_err(|_| UserStoreError::PasswordHash);
        }

        let parsed = PasswordHash::new(&record.password_hash)
            .map_err(|_| UserStoreError::PasswordHash)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Human-readable table of all users.
    #[tracing::instrument(skip(self))]
    pub fn list(&self) -> Result<String> {
        Ok(format_report(&self.load()?))
    }
}

fn format_report(users: &Users) -> String {
    if users.is_empty() {
        return "No users found".to_owned();
    }

    let mut out = String::from("Users:\n");
    out.push_str(&format!(
        "{:<20}{:<10}{:<20}{}\n",
        "Username", "Status", "Created", "Last Login"
    ));
    out.push_str(&"-".repeat(70));
    out.push('\n');

    for (username, user) in users {
        let status = if user.is_active { "Active" } else { "Inactive" };
        let created = user
            .created_at
            .as_ref()
            .map_or_else(|| "Unknown".to_owned(), timestamp::format);
        let last_login = user
            .last_login
            .as_ref()
            .map_or_else(|| "Never".to_owned(), timestamp::format);
        out.push_str(&format!("{username:<20}{status:<10}{created:<20}{last_login}\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn temp_store() -> (tempfile::TempDir, UserStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::new(dir.path().join("users.json"));
        (dir, store)
    }

    #[test_case("admin", true; "plain")]
    #[test_case("user_01", true; "underscore and digits")]
    #[test_case("", false; "empty")]
    #[test_case("has space", false; "space")]
    #[test_case("dash-name", false; "dash")]
    #[test_case("ünïcode", false; "non ascii")]
    fn username_charset(name: &str, expected: bool) {
        assert_eq!(is_valid_username(name), expected);
    }

    #[test]
    fn username_length_limit() {
        assert!(is_valid_username(&"a".repeat(50)));
        assert!(!is_valid_username(&"a".repeat(51)));
    }

    #[test]
    fn create_and_verify() {
        let (_dir, store) = temp_store();
        let record = store.create("admin", "correct horse").unwrap();
        assert!(record.is_active);
        assert!(record.created_at.is_some());
        assert!(record.last_login.is_none());

        let stored = store.get("admin").unwrap().unwrap();
        assert!(store.verify_password(&stored, "correct horse").unwrap());
        assert!(!store.verify_password(&stored, "wrong horse").unwrap());
    }

    #[test]
    fn create_rejects_duplicate_and_weak() {
        let (_dir, store) = temp_store();
        store.create("admin", "password1").unwrap();

        assert!(matches!(
            store.create("admin", "password2"),
            Err(UserStoreError::DuplicateUser(name)) if name == "admin"
        ));
        assert!(matches!(
            store.create("other", "short"),
            Err(UserStoreError::WeakPassword)
        ));
        assert!(matches!(
            store.create("bad name", "password1"),
            Err(UserStoreError::InvalidUsername)
        ));
    }

    #[test]
    fn missing_user_operations_fail() {
        let (_dir, store) = temp_store();
        assert!(matches!(
            store.update_password("ghost", "password1"),
            Err(UserStoreError::UserNotFound(_))
        ));
        assert!(matches!(
            store.set_active("ghost", false),
            Err(UserStoreError::UserNotFound(_))
        ));
        assert!(matches!(store.delete("ghost"), Err(UserStoreError::UserNotFound(_))));
    }

    #[test]
    fn update_toggle_delete() {
        let (_dir, store) = temp_store();
        store.create("admin", "password1").unwrap();

        store.update_password("admin", "password2").unwrap();
        let record = store.get("admin").unwrap().unwrap();
        assert!(store.verify_password(&record, "password2").unwrap());
        assert!(record.updated_at.is_some());

        store.set_active("admin", false).unwrap();
        assert!(!store.get("admin").unwrap().unwrap().is_active);

        store.delete("admin").unwrap();
        assert!(store.get("admin").unwrap().is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let (_dir, store) = temp_store();
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.load(), Err(UserStoreError::Corrupt(_))));
        assert!(matches!(
            store.create("admin", "password1"),
            Err(UserStoreError::Corrupt(_))
        ));
    }

    #[test]
    fn dummy_hash_is_a_real_argon2_hash() {
        assert!(DUMMY_HASH.starts_with("$argon2"));
        assert!(PasswordHash::new(&DUMMY_HASH).is_ok());
        verify_dummy("anything");
    }

    #[test]
    fn reads_legacy_records() {
        let (_dir, store) = temp_store();
        let hash = bcrypt::hash("legacy-pass", 4).unwrap();
        let json = serde_json::json!({
            "admin": {
                "password_hash": hash,
                "is_active": true,
                "created_at": "2024-01-01 10:00:00",
                "last_login": null
            }
        });
        std::fs::write(store.path(), json.to_string()).unwrap();

        let record = store.get("admin").unwrap().unwrap();
        assert!(store.verify_password(&record, "legacy-pass").unwrap());

        store.record_login("admin", "legacy-pass").unwrap();
        let upgraded = store.get("admin").unwrap().unwrap();
        assert!(!is_legacy_hash(&upgraded.password_hash));
        assert!(upgraded.last_login.is_some());
        assert!(store.verify_password(&upgraded, "legacy-pass").unwrap());
    }

    #[test]
    fn list_report() {
        let (_dir, store) = temp_store();
        assert_eq!(store.list().unwrap(), "No users found");

        store.create("alice", "password1").unwrap();
        store.create("bob", "password1").unwrap();
        store.set_active("bob", false).unwrap();

        let report = store.list().unwrap();
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines[0], "Users:");
        assert!(lines[1].starts_with("Username            Status    Created"));
        assert_eq!(lines[2], "-".repeat(70));
        assert!(lines[3].starts_with("alice               Active    "));
        assert!(lines[3].ends_with("Never"));
        assert!(lines[4].starts_with("bob                 Inactive  "));
    }
}
