use std::path::{Path, PathBuf};

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use tokio::fs;

use crate::creature::Species;
use crate::remote::{
    PlayerDto, PlayerId, PokedexUpdate, RemoteError, RemoteInventory, ResourcesUpdate,
};

pub const TOKEN_ENV: &str = "POKEWALK_TOKEN";

/// REST client for the player store.
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    cache_dir: PathBuf,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>, token: Option<String>, cache_dir: PathBuf) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            cache_dir,
        }
    }

    /// Reads the bearer token from `POKEWALK_TOKEN`.
    pub fn from_env(base_url: impl Into<String>, cache_dir: PathBuf) -> Self {
        let token = std::env::var(TOKEN_ENV).ok().filter(|token| !token.is_empty());
        Self::new(base_url, token, cache_dir)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        player: Option<PlayerId>,
    ) -> Result<T, RemoteError> {
        let bytes = self.send_bytes(request, player).await?;
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::Parse(e.to_string()))
    }

    async fn send_bytes(
        &self,
        request: reqwest::RequestBuilder,
        player: Option<PlayerId>,
    ) -> Result<Vec<u8>, RemoteError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| RemoteError::Request(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = player {
                return Err(RemoteError::NotFound(id));
            }
        }
        if !status.is_success() {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body.get("message").and_then(|m| m.as_str()).map(String::from))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(RemoteError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|e| RemoteError::Request(e.to_string()))
    }

    fn cache_path(&self, url: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        self.cache_dir.join("http").join(hex::encode(hasher.finalize()))
    }
}

#[async_trait::async_trait]
impl RemoteInventory for HttpRemote {
    async fn fetch_player(&self, id: PlayerId) -> Result<PlayerDto, RemoteError> {
        let request = self.client.get(self.url(&format!("/players/{id}")));
        self.send(request, Some(id)).await
    }

    async fn update_resources(
        &self,
        id: PlayerId,
        update: ResourcesUpdate,
    ) -> Result<PlayerDto, RemoteError> {
        let request = self
            .client
            .put(self.url(&format!("/players/{id}/resources")))
            .json(&update);
        self.send(request, Some(id)).await
    }

    async fn update_pokedex(
        &self,
        id: PlayerId,
        update: PokedexUpdate,
    ) -> Result<PlayerDto, RemoteError> {
        let request = self
            .client
            .put(self.url(&format!("/players/{id}/pokedex")))
            .json(&update);
        self.send(request, Some(id)).await
    }

    /// The catalog rarely changes, so it is served from disk once fetched.
    async fn list_creatures(&self) -> Result<Vec<Species>, RemoteError> {
        let url = self.url("/pokemons");
        let cache_path = self.cache_path(&url);
        if let Some(bytes) = read_cache(&cache_path).await {
            match serde_json::from_slice(&bytes) {
                Ok(species) => return Ok(species),
                Err(error) => {
                    tracing::warn!(%error, "dropping unreadable catalog cache");
                    let _ = fs::remove_file(&cache_path).await;
                }
            }
        }

        let bytes = self.send_bytes(self.client.get(&url), None).await?;
        let species: Vec<Species> =
            serde_json::from_slice(&bytes).map_err(|e| RemoteError::Parse(e.to_string()))?;
        write_cache(&cache_path, &bytes).await;
        Ok(species)
    }

    async fn random_creature(&self) -> Result<Species, RemoteError> {
        let request = self.client.get(self.url("/pokemons/random"));
        self.send(request, None).await
    }
}

async fn read_cache(path: &Path) -> Option<Vec<u8>> {
    fs::read(path).await.ok()
}

async fn write_cache(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent).await;
    }
    if let Err(error) = fs::write(path, bytes).await {
        tracing::warn!(path = %path.display(), %error, "failed to cache catalog");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_without_double_slash() {
        let remote = HttpRemote::new("http://localhost:3000/", None, PathBuf::from("/tmp"));
        assert_eq!(remote.url("/players/3"), "http://localhost:3000/players/3");
    }

    #[test]
    fn catalog_cache_is_keyed_by_url_hash() {
        let remote = HttpRemote::new("http://a", None, PathBuf::from("/cache"));
        let first = remote.cache_path("http://a/pokemons");
        let second = remote.cache_path("http://b/pokemons");
        assert_ne!(first, second);
        assert!(first.starts_with("/cache/http"));
        assert_eq!(first.file_name().map(|n| n.len()), Some(64));
    }

    #[tokio::test]
    async fn cached_catalog_skips_the_network() {
        let dir = tempfile::tempdir().expect("tempdir");
        let remote = HttpRemote::new("http://127.0.0.1:9", None, dir.path().to_path_buf());
        let path = remote.cache_path(&remote.url("/pokemons"));
        write_cache(&path, br#"[{"name":"pidgey","sprite":"p.png","type":"normal,flying"}]"#)
            .await;

        let species = remote.list_creatures().await.expect("cached catalog");
        assert_eq!(species.len(), 1);
        assert_eq!(species[0].types, "normal,flying");
    }
}
