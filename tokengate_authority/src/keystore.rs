use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use reqwest::header::{self, HeaderValue};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokengate::jwa::Algorithm;
use tokengate::jwk::KeyIdRef;
use tokengate::{Jwk, KeySet};

/// Failure to retrieve or parse the remote JWKS document
///
/// Never fatal to a request: the previously published key set stays in
/// place and verification proceeds against it.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request to the JWKS endpoint failed or timed out
    #[error("JWKS endpoint request failed")]
    Transport(#[source] reqwest::Error),

    /// The JWKS endpoint answered with an unexpected status
    #[error("JWKS endpoint answered {0}")]
    Status(StatusCode),

    /// The response body was not a parseable JWKS document
    #[error("JWKS document could not be parsed")]
    Parse(#[source] reqwest::Error),
}

#[derive(Debug)]
struct CachedKeys {
    keys: KeySet,
    fetched_at: Option<Instant>,
    generation: u64,
    etag: Option<HeaderValue>,
    last_modified: Option<HeaderValue>,
}

impl CachedKeys {
    fn empty() -> Self {
        Self {
            keys: KeySet::default(),
            fetched_at: None,
            generation: 0,
            etag: None,
            last_modified: None,
        }
    }
}

#[derive(Debug)]
struct RemoteJwks {
    url: String,
    client: Client,
}

#[derive(Debug)]
struct Inner {
    cache: ArcSwap<CachedKeys>,
    remote: Option<RemoteJwks>,
    ttl: Duration,
    refresh_lock: tokio::sync::Mutex<()>,
}

/// The issuer's public signing keys: cached, TTL-bounded, and replaced by
/// atomic pointer swap
///
/// Lookups read the current snapshot without locking. A lookup that misses
/// (unknown key id) or finds the snapshot past its time-to-live forces one
/// synchronous refresh and retries once; concurrent refreshes collapse into
/// a single in-flight fetch. A failed refresh leaves the previous key set
/// published, so a reachable issuer yesterday beats no keys today — while
/// a token that still cannot be matched to a key is rejected as usual.
///
/// Cloning is cheap; clones share the cache.
#[derive(Clone, Debug)]
#[must_use]
pub struct KeyStore {
    inner: Arc<Inner>,
}

impl KeyStore {
    /// A store over a fixed key set that never goes stale and never fetches
    pub fn fixed(keys: KeySet) -> Self {
        Self {
            inner: Arc::new(Inner {
                cache: ArcSwap::from_pointee(CachedKeys {
                    keys,
                    fetched_at: None,
                    generation: 0,
                    etag: None,
                    last_modified: None,
                }),
                remote: None,
                ttl: Duration::MAX,
                refresh_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// A store that fetches its keys from `jwks_url`
    ///
    /// The store starts empty; the first lookup forces the initial fetch.
    /// `timeout` bounds every request to the endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn remote(
        jwks_url: impl Into<String>,
        ttl: Duration,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("tokengate_authority/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(FetchError::Transport)?;

        Ok(Self {
            inner: Arc::new(Inner {
                cache: ArcSwap::from_pointee(CachedKeys::empty()),
                remote: Some(RemoteJwks {
                    url: jwks_url.into(),
                    client,
                }),
                ttl,
                refresh_lock: tokio::sync::Mutex::new(()),
            }),
        })
    }

    /// Replaces the cached key set directly
    pub fn install(&self, keys: KeySet) {
        let current = self.inner.cache.load();
        self.inner.cache.store(Arc::new(CachedKeys {
            keys,
            fetched_at: Some(Instant::now()),
            generation: current.generation + 1,
            etag: None,
            last_modified: None,
        }));
    }

    fn is_stale(&self, data: &CachedKeys) -> bool {
        if self.inner.remote.is_none() {
            return false;
        }

        match data.fetched_at {
            Some(fetched_at) => fetched_at.elapsed() >= self.inner.ttl,
            None => true,
        }
    }

    /// Looks up the key for `kid`, forcing at most one refresh when the
    /// cached set is stale or does not know the identifier
    ///
    /// Returns `None` when no compatible key exists even after the refresh
    /// attempt; the caller treats that as a hard verification failure
    /// rather than retrying, to bound request latency.
    pub async fn lookup(&self, kid: &KeyIdRef, alg: Algorithm) -> Option<Jwk> {
        let observed = {
            let data = self.inner.cache.load();
            if !self.is_stale(&data) {
                if let Some(key) = data.keys.get(kid, alg) {
                    return Some(key.clone());
                }
            }
            data.generation
        };

        // Unknown kid or expired snapshot: force one refresh, retry once.
        if let Err(err) = self.refresh_generation(observed).await {
            let error: &dyn std::error::Error = &err;
            tracing::warn!(error, "JWKS refresh failed; serving previous key set");
        }

        let data = self.inner.cache.load();
        let key = data.keys.get(kid, alg)?.clone();
        if self.is_stale(&data) {
            tracing::warn!(jwk.kid = %kid, "serving key from a stale key set");
        }
        Some(key)
    }

    /// Refreshes the key set from the remote JWKS endpoint
    ///
    /// No retries are attempted, and on failure no change is made to the
    /// published key set. Callers that race an in-flight refresh wait for
    /// it to finish and then return without issuing a second fetch.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch fails or the document cannot be
    /// parsed. A store without a remote endpoint always succeeds.
    pub async fn refresh(&self) -> Result<(), FetchError> {
        let observed = self.inner.cache.load().generation;
        self.refresh_generation(observed).await
    }

    #[tracing::instrument(skip(self), fields(jwks.url = tracing::field::Empty))]
    async fn refresh_generation(&self, observed: u64) -> Result<(), FetchError> {
        let Some(remote) = &self.inner.remote else {
            return Ok(());
        };

        let _flight = self.inner.refresh_lock.lock().await;
        if self.inner.cache.load().generation != observed {
            // Someone else published a newer key set while we waited.
            return Ok(());
        }

        let span = tracing::Span::current();
        span.record("jwks.url", remote.url.as_str());
        tracing::debug!("refreshing JWKS");

        let mut request = remote.client.get(&remote.url);
        {
            let data = self.inner.cache.load();
            if let Some(etag) = &data.etag {
                request = request.header(header::IF_NONE_MATCH, etag);
            } else if let Some(last_modified) = &data.last_modified {
                request = request.header(header::IF_MODIFIED_SINCE, last_modified);
            }
        }

        let response = request.send().await.map_err(FetchError::Transport)?;

        if response.status() == StatusCode::NOT_MODIFIED {
            let data = self.inner.cache.load_full();
            self.inner.cache.store(Arc::new(CachedKeys {
                keys: data.keys.clone(),
                fetched_at: Some(Instant::now()),
                generation: data.generation + 1,
                etag: data.etag.clone(),
                last_modified: data.last_modified.clone(),
            }));
            tracing::debug!("JWKS not modified");
            return Ok(());
        }

        if !response.status().is_success() {
            tracing::warn!(
                http.status_code = response.status().as_u16(),
                "JWKS refresh failed; unexpected response status",
            );
            return Err(FetchError::Status(response.status()));
        }

        let etag = response.headers().get(header::ETAG).map(ToOwned::to_owned);
        let last_modified = response
            .headers()
            .get(header::LAST_MODIFIED)
            .map(ToOwned::to_owned);

        let keys = response
            .json::<KeySet>()
            .await
            .map_err(FetchError::Parse)?;

        self.inner.cache.store(Arc::new(CachedKeys {
            keys,
            fetched_at: Some(Instant::now()),
            generation: observed + 1,
            etag,
            last_modified,
        }));
        tracing::info!("JWKS refreshed");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::State;
    use axum::http::{header, HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::Router;
    use tokengate::jwk::KeyId;
    use tokengate::test_util;

    use super::*;

    const KID: &str = test_util::TEST_KEY_ID;

    #[derive(Clone)]
    struct StubState {
        hits: Arc<AtomicUsize>,
        body: Arc<String>,
        /// Requests beyond this count answer 500.
        fail_after: usize,
        /// Whether to emit an ETag and honor If-None-Match with a 304.
        conditional: bool,
    }

    async fn jwks_endpoint(State(state): State<StubState>, headers: HeaderMap) -> impl IntoResponse {
        let hit = state.hits.fetch_add(1, Ordering::SeqCst) + 1;

        if hit > state.fail_after {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }

        if state.conditional && headers.contains_key(header::IF_NONE_MATCH) {
            return StatusCode::NOT_MODIFIED.into_response();
        }

        let mut response = (
            [(header::CONTENT_TYPE, "application/json")],
            (*state.body).clone(),
        )
            .into_response();
        if state.conditional {
            response
                .headers_mut()
                .insert(header::ETAG, HeaderValue::from_static("\"jwks-v1\""));
        }
        response
    }

    async fn spawn_stub(fail_after: usize, conditional: bool) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = StubState {
            hits: hits.clone(),
            body: Arc::new(test_util::JWKS.to_owned()),
            fail_after,
            conditional,
        };

        let app = Router::new()
            .route("/.well-known/jwks.json", get(jwks_endpoint))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/.well-known/jwks.json"), hits)
    }

    fn remote_store(url: &str, ttl: Duration) -> KeyStore {
        KeyStore::remote(url, ttl, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn first_lookup_fetches_and_later_lookups_hit_the_cache() {
        let (url, hits) = spawn_stub(usize::MAX, false).await;
        let store = remote_store(&url, Duration::from_secs(60));
        let kid = KeyId::new(KID.to_string());

        assert!(store.lookup(&kid, Algorithm::RS256).await.is_some());
        assert!(store.lookup(&kid, Algorithm::RS256).await.is_some());
        assert!(store.lookup(&kid, Algorithm::PS256).await.is_some());

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_collapse_into_one_fetch() {
        let (url, hits) = spawn_stub(usize::MAX, false).await;
        let store = remote_store(&url, Duration::from_secs(60));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                let kid = KeyId::new(KID.to_string());
                store.lookup(&kid, Algorithm::RS256).await
            }));
        }

        for task in tasks {
            assert!(task.await.unwrap().is_some());
        }

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_ttl_forces_a_refresh_per_lookup() {
        let (url, hits) = spawn_stub(usize::MAX, false).await;
        let store = remote_store(&url, Duration::ZERO);
        let kid = KeyId::new(KID.to_string());

        assert!(store.lookup(&kid, Algorithm::RS256).await.is_some());
        assert!(store.lookup(&kid, Algorithm::RS256).await.is_some());

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stale_cache_survives_a_failed_refresh() {
        let (url, hits) = spawn_stub(1, false).await;
        let store = remote_store(&url, Duration::ZERO);
        let kid = KeyId::new(KID.to_string());

        // First lookup fetches successfully; the second finds the snapshot
        // expired, fails to refresh (the stub now answers 500), and serves
        // the stale keys anyway.
        assert!(store.lookup(&kid, Algorithm::RS256).await.is_some());
        assert!(store.lookup(&kid, Algorithm::RS256).await.is_some());

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fresh_cache_is_served_without_contacting_an_unreachable_issuer() {
        let (url, hits) = spawn_stub(usize::MAX, false).await;
        let store = remote_store(&url, Duration::from_secs(300));
        let kid = KeyId::new(KID.to_string());

        assert!(store.lookup(&kid, Algorithm::RS256).await.is_some());
        // Endpoint availability no longer matters while the snapshot is
        // fresh; no further requests are made.
        assert!(store.lookup(&kid, Algorithm::RS256).await.is_some());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_kid_triggers_exactly_one_refresh_per_lookup() {
        let (url, hits) = spawn_stub(usize::MAX, false).await;
        let store = remote_store(&url, Duration::from_secs(60));
        let kid = KeyId::new("never-published".to_string());

        assert!(store.lookup(&kid, Algorithm::RS256).await.is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(store.lookup(&kid, Algorithm::RS256).await.is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn not_modified_restamps_freshness() {
        let (url, hits) = spawn_stub(usize::MAX, true).await;
        let store = remote_store(&url, Duration::ZERO);
        let kid = KeyId::new(KID.to_string());

        assert!(store.lookup(&kid, Algorithm::RS256).await.is_some());
        // The snapshot is expired again, but the conditional fetch comes
        // back 304 and the cached keys keep serving.
        assert!(store.lookup(&kid, Algorithm::RS256).await.is_some());

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn fixed_store_never_fetches() {
        let store = KeyStore::fixed(test_util::key_set());
        let kid = KeyId::new(KID.to_string());

        assert!(store.lookup(&kid, Algorithm::RS256).await.is_some());
        assert!(store
            .lookup(&KeyId::new("unknown".to_string()), Algorithm::RS256)
            .await
            .is_none());
        assert!(store.refresh().await.is_ok());
    }

    #[tokio::test]
    async fn install_replaces_the_published_set() {
        let store = KeyStore::fixed(KeySet::default());
        let kid = KeyId::new(KID.to_string());
        assert!(store.lookup(&kid, Algorithm::RS256).await.is_none());

        store.install(test_util::key_set());
        assert!(store.lookup(&kid, Algorithm::RS256).await.is_some());
    }
}
