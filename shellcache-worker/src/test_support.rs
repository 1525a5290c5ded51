//! Scripted fetcher and context helpers for unit tests.

use async_trait::async_trait;
use shellcache_core::{Request, Response};
use shellcache_fetch::{EngineConfig, EngineContext, FetchError, Fetcher};
use shellcache_store::MemoryStoreProvider;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

/// Fetcher answering from a URL table and recording request bodies.
#[derive(Default)]
pub(crate) struct MockFetcher {
    routes: Mutex<HashMap<String, Option<Response>>>,
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
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

    /// Answers the default core manifest.
    pub(crate) fn serve_manifest(&self) {
        self.respond("https://bus.example/", Response::ok("root"));
        self.respond("https://bus.example/index.html", Response::ok("<shell>"));
        self.respond("https://bus.example/manifest.json", Response::ok("{}"));
        self.respond("https://bus.example/icons/icon.ico", Response::ok(vec![0u8, 1, 2]));
    }

    pub(crate) fn last_body(&self, url: &str) -> Option<Vec<u8>> {
        self.bodies.lock().unwrap().get(url).cloned()
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(body) = &request.body {
            self.bodies
                .lock()
                .unwrap()
                .insert(request.url.to_string(), body.clone());
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
    context_with(config(), fetcher)
}

pub(crate) fn context_with(config: EngineConfig, fetcher: Arc<MockFetcher>) -> EngineContext {
    EngineContext::new(config, fetcher, Arc::new(MemoryStoreProvider::new()))
}
