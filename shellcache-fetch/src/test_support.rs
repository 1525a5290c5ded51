//! Scripted fetcher and context helpers for unit tests.

use async_trait::async_trait;
use shellcache_core::{Request, Response};
use shellcache_store::MemoryStoreProvider;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;

use crate::config::EngineConfig;
use crate::context::EngineContext;
use crate::error::FetchError;
use crate::host::Fetcher;

/// Fetcher answering from a URL table.
#[derive(Default)]
pub(crate) struct MockFetcher {
    routes: Mutex<HashMap<String, Option<Response>>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl MockFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every fetch waits for one `notify_one` on the gate.
    pub(crate) fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub(crate) fn respond(&self, url: &str, response: Response) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Some(response));
    }

    pub(crate) fn fail(&self, url: &str) {
        self.routes.lock().unwrap().insert(url.to_string(), None);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let route = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        match route {
            Some(Some(response)) => Ok(response),
            Some(None) => Err(FetchError::Network("connection reset".into())),
            None => Err(FetchError::Offline),
        }
    }
}

pub(crate) fn config() -> EngineConfig {
    EngineConfig::new("bus", Url::parse("https://bus.example/").unwrap())
        .with_dynamic_host("api.example")
}

pub(crate) fn context(fetcher: Arc<MockFetcher>) -> EngineContext {
    EngineContext::new(config(), fetcher, Arc::new(MemoryStoreProvider::new()))
}

pub(crate) fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}
