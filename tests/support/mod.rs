// Not every test binary uses every helper
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use autonorte_client::http::{ApiRequest, HttpError, Transport, UploadForm};
use autonorte_client::store::LocalStore;
use autonorte_client::MarketplaceClient;

/// In-memory transport scripted per path. Paths without a scripted response
/// answer 404; `offline` makes every call fail like a dead network.
#[derive(Default)]
pub struct StubTransport {
    routes: Mutex<HashMap<String, Value>>,
    pub calls: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<UploadForm>>,
    pub offline: bool,
}

impl StubTransport {
    pub fn offline() -> Self {
        Self { offline: true, ..Self::default() }
    }

    pub fn with_routes(routes: Vec<(&str, Value)>) -> Self {
        Self {
            routes: Mutex::new(
                routes.into_iter().map(|(path, v)| (path.to_string(), v)).collect(),
            ),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn execute(&self, req: &ApiRequest) -> Result<Value, HttpError> {
        self.calls.lock().unwrap().push(req.path.clone());
        if self.offline {
            return Err(HttpError::Status(503));
        }
        match self.routes.lock().unwrap().get(&req.path) {
            Some(value) => Ok(value.clone()),
            None => Err(HttpError::Status(404)),
        }
    }

    async fn upload(&self, path: &str, form: UploadForm) -> Result<Value, HttpError> {
        self.calls.lock().unwrap().push(path.to_string());
        if self.offline {
            return Err(HttpError::Status(503));
        }
        self.uploads.lock().unwrap().push(form);
        Ok(Value::Null)
    }
}

/// Client wired to a stub transport and a temp-dir store. The tempdir guard
/// must outlive the client.
pub fn client_with(
    transport: StubTransport,
) -> (MarketplaceClient, Arc<StubTransport>, Arc<LocalStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(LocalStore::new(dir.path()));
    let transport = Arc::new(transport);
    let client = MarketplaceClient::with_transport(transport.clone(), store.clone());
    (client, transport, store, dir)
}
