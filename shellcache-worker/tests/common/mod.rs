//! Shared helpers for worker integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use shellcache_core::{Request, Response};
use shellcache_fetch::{EngineConfig, EngineContext, FetchError, Fetcher};
use shellcache_store::{MemoryStoreProvider, StoreProvider};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;

/// Scripted network: a URL table, per-URL call counts and optional gates.
#[derive(Default)]
pub struct ScriptedNetwork {
    routes: Mutex<HashMap<String, Option<Response>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, url: &str, response: Response) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Some(response));
    }

    pub fn fail(&self, url: &str) {
        self.routes.lock().unwrap().insert(url.to_string(), None);
    }

    /// Makes fetches of `url` wait until the returned gate is notified.
    pub fn gate(&self, url: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert(url.to_string(), Arc::clone(&gate));
        gate
    }

    pub fn ungate(&self, url: &str) {
        self.gates.lock().unwrap().remove(url);
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Fetcher for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        let url = request.url.to_string();
        *self.calls.lock().unwrap().entry(url.clone()).or_default() += 1;

        let gate = self.gates.lock().unwrap().get(&url).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let route = self.routes.lock().unwrap().get(&url).cloned();
        match route {
            Some(Some(response)) => Ok(response),
            Some(None) => Err(FetchError::Network("connection reset".into())),
            None => Err(FetchError::Offline),
        }
    }
}

pub const ORIGIN: &str = "https://bus.example/";

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

pub fn config(version: &str) -> EngineConfig {
    EngineConfig::new("kaohsiung-bus", url(ORIGIN))
        .with_version(version)
        .with_manifest(["/shell.html", "/app.css"])
        .with_entry_point("/shell.html")
        .with_dynamic_host("api.example")
}

pub fn serve_shell(network: &ScriptedNetwork, body: &str) {
    network.respond("https://bus.example/shell.html", Response::ok(body));
    network.respond("https://bus.example/app.css", Response::ok("body{}"));
}

pub fn context(
    config: EngineConfig,
    network: Arc<ScriptedNetwork>,
    provider: Arc<dyn StoreProvider>,
) -> EngineContext {
    EngineContext::new(config, network, provider)
}

pub fn memory() -> Arc<dyn StoreProvider> {
    Arc::new(MemoryStoreProvider::new())
}
