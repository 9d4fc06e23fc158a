//! File-backed token storage
//!
//! A JSON file mapping profile names to `TokenSet`s. The client never writes
//! here on its own; callers hook `put()` into the refresh callback so rotated
//! refresh tokens survive restarts. Writes go through a temp file + rename and
//! are serialized by a tokio Mutex.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::token::TokenSet;

/// Token file manager.
pub struct TokenStore {
    path: PathBuf,
    state: Mutex<HashMap<String, TokenSet>>,
}

impl TokenStore {
    /// Load tokens from `path`, creating an empty `{}` file if it is missing.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading token file: {e}")))?;
            let tokens: HashMap<String, TokenSet> = serde_json::from_str(&contents)
                .map_err(|e| Error::StoreParse(format!("parsing token file: {e}")))?;
            info!(path = %path.display(), profiles = tokens.len(), "loaded tokens");
            tokens
        } else {
            info!(path = %path.display(), "token file not found, starting empty");
            let empty = HashMap::new();
            write_atomic(&path, &empty).await?;
            empty
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone of the tokens stored under `profile`.
    pub async fn get(&self, profile: &str) -> Option<TokenSet> {
        let state = self.state.lock().await;
        state.get(profile).cloned()
    }

    /// All profile names.
    pub async fn profiles(&self) -> Vec<String> {
        let state = self.state.lock().await;
        state.keys().cloned().collect()
    }

    /// Insert or replace the tokens for `profile` and persist.
    pub async fn put(&self, profile: &str, tokens: TokenSet) -> Result<()> {
        let mut state = self.state.lock().await;
        state.insert(profile.to_string(), tokens);
        debug!(profile, "stored tokens");
        write_atomic(&self.path, &state).await
    }

    /// Remove `profile` and persist. Returns the removed tokens, if any.
    pub async fn remove(&self, profile: &str) -> Result<Option<TokenSet>> {
        let mut state = self.state.lock().await;
        let removed = state.remove(profile);
        if removed.is_some() {
            debug!(profile, "removed tokens");
            write_atomic(&self.path, &state).await?;
        }
        Ok(removed)
    }

    pub async fn len(&self) -> usize {
        self.state.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Write the token map via a sibling temp file and rename, mode 0600.
async fn write_atomic(path: &Path, data: &HashMap<String, TokenSet>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::StoreParse(format!("serializing tokens: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("token path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".tokens.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp token file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting token file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp token file: {e}")))?;

    debug!(path = %path.display(), "persisted tokens");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(suffix: &str) -> TokenSet {
        TokenSet::new(format!("at_{suffix}"), format!("rt_{suffix}"), 1_735_500_000)
    }

    #[tokio::test]
    async fn put_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");

        let store = TokenStore::load(path.clone()).await.unwrap();
        store.put("default", tokens("1")).await.unwrap();

        let reloaded = TokenStore::load(path).await.unwrap();
        assert_eq!(reloaded.get("default").await, Some(tokens("1")));
    }

    #[tokio::test]
    async fn missing_file_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");

        let store = TokenStore::load(path.clone()).await.unwrap();
        assert!(store.is_empty().await);
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: HashMap<String, TokenSet> = serde_json::from_str(&contents).unwrap();
        assert!(parsed.is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let result = TokenStore::load(path).await;
        assert!(matches!(result, Err(Error::StoreParse(_))));
    }

    #[tokio::test]
    async fn put_replaces_existing_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::load(dir.path().join("tokens.json"))
            .await
            .unwrap();

        store.put("default", tokens("old")).await.unwrap();
        store.put("default", tokens("new")).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("default").await.unwrap().access_token, "at_new");
    }

    #[tokio::test]
    async fn remove_profile() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::load(dir.path().join("tokens.json"))
            .await
            .unwrap();
        store.put("a", tokens("a")).await.unwrap();
        store.put("b", tokens("b")).await.unwrap();

        assert!(store.remove("a").await.unwrap().is_some());
        assert!(store.remove("a").await.unwrap().is_none());

        let mut profiles = store.profiles().await;
        profiles.sort();
        assert_eq!(profiles, vec!["b"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_permissions_are_0600() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.json");
        let store = TokenStore::load(path.clone()).await.unwrap();
        store.put("default", tokens("1")).await.unwrap();

        let mode = tokio::fs::metadata(&path)
            .await
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600, "token file must be 0600, got {mode:o}");
    }
}
