use std::{sync::Arc, time::Duration};

use futures::{StreamExt, future::BoxFuture};
use reqwest::{Client, Method, header::ACCEPT};
use serde_json::Value;
use tokio::{sync::watch, time::sleep};
use tracing::{debug, info, warn};

use crate::dao::{
    game_store::{GameStore, Subscription},
    models::{DocumentPatch, GameDocument},
    storage::StorageResult,
};

use super::{
    config::FirebaseConfig,
    error::{FirebaseError, FirebaseResult},
    events::{EventDecoder, PathChange},
};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);

/// Game store backed by a Firebase Realtime Database node, accessed over its REST API.
#[derive(Clone)]
pub struct FirebaseGameStore {
    client: Client,
    url: Arc<str>,
    auth: Option<Arc<str>>,
    live: Arc<watch::Sender<Option<GameDocument>>>,
}

impl FirebaseGameStore {
    /// Fetch the current document and start the streaming listener feeding subscribers.
    pub async fn connect(config: FirebaseConfig) -> FirebaseResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| FirebaseError::ClientBuilder { source })?;

        let (live, _receiver) = watch::channel(None);
        let store = Self {
            client,
            url: Arc::from(config.document_url()),
            auth: config.auth.map(Arc::from),
            live: Arc::new(live),
        };

        let initial = store.fetch().await?;
        store.live.send_replace(initial);

        tokio::spawn(listen(store.clone()));
        info!(url = %store.url, "connected to Firebase realtime database");
        Ok(store)
    }

    fn request(&self, method: Method) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url.as_ref());
        match &self.auth {
            Some(auth) => builder.query(&[("auth", auth.as_ref())]),
            None => builder,
        }
    }

    async fn fetch(&self) -> FirebaseResult<Option<GameDocument>> {
        let response = self
            .request(Method::GET)
            .send()
            .await
            .map_err(|source| FirebaseError::RequestSend {
                path: self.url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FirebaseError::RequestStatus {
                path: self.url.to_string(),
                status: response.status(),
            });
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|source| FirebaseError::DecodeResponse {
                path: self.url.to_string(),
                source,
            })?;

        self.decode(value)
    }

    fn decode(&self, value: Value) -> FirebaseResult<Option<GameDocument>> {
        if value.is_null() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|source| FirebaseError::DeserializeValue {
                path: self.url.to_string(),
                source,
            })
    }

    async fn send_json(&self, method: Method, body: &Value) -> FirebaseResult<()> {
        let response = self
            .request(method)
            .json(body)
            .send()
            .await
            .map_err(|source| FirebaseError::RequestSend {
                path: self.url.to_string(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(FirebaseError::RequestStatus {
                path: self.url.to_string(),
                status: response.status(),
            })
        }
    }

    /// Consume one streaming connection until Firebase closes it.
    async fn stream_once(&self) -> FirebaseResult<()> {
        let response = self
            .request(Method::GET)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|source| FirebaseError::RequestSend {
                path: self.url.to_string(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(FirebaseError::RequestStatus {
                path: self.url.to_string(),
                status: response.status(),
            });
        }

        let mut tree = Value::Null;
        let mut decoder = EventDecoder::default();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|source| FirebaseError::DecodeResponse {
                path: self.url.to_string(),
                source,
            })?;

            for event in decoder.push(&chunk) {
                match event.name.as_str() {
                    "put" | "patch" => {
                        let change: PathChange =
                            serde_json::from_str(&event.data).map_err(|source| {
                                FirebaseError::MalformedEvent {
                                    event: event.name.clone(),
                                    source,
                                }
                            })?;
                        if event.name == "put" {
                            change.apply_put(&mut tree);
                        } else {
                            change.apply_patch(&mut tree);
                        }

                        match self.decode(tree.clone()) {
                            Ok(document) => {
                                self.live.send_replace(document);
                            }
                            Err(err) => warn!(error = %err, "ignoring undecodable game document"),
                        }
                    }
                    "keep-alive" => {}
                    "cancel" | "auth_revoked" => {
                        return Err(FirebaseError::StreamCancelled { reason: event.data });
                    }
                    other => debug!(event = other, "ignoring Firebase stream event"),
                }
            }
        }

        Ok(())
    }
}

/// Keep a streaming subscription open, reconnecting with exponential backoff.
async fn listen(store: FirebaseGameStore) {
    let mut delay = INITIAL_DELAY;

    loop {
        match store.stream_once().await {
            Ok(()) => {
                info!("Firebase stream closed by server; reconnecting");
                delay = INITIAL_DELAY;
            }
            Err(err) => {
                warn!(error = %err, "Firebase stream failed");
            }
        }

        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

impl GameStore for FirebaseGameStore {
    fn read(&self) -> BoxFuture<'static, StorageResult<Option<GameDocument>>> {
        let store = self.clone();
        Box::pin(async move { store.fetch().await.map_err(Into::into) })
    }

    fn subscribe(&self) -> Subscription {
        self.live.subscribe()
    }

    fn update(&self, patch: DocumentPatch) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let body = Value::Object(patch.to_update_map());
            store
                .send_json(Method::PATCH, &body)
                .await
                .map_err(Into::into)
        })
    }

    fn replace(&self, document: GameDocument) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let body = serde_json::to_value(&document).map_err(|source| {
                FirebaseError::DeserializeValue {
                    path: store.url.to_string(),
                    source,
                }
            })?;
            store
                .send_json(Method::PUT, &body)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let response = store
                .request(Method::GET)
                .query(&[("shallow", "true")])
                .send()
                .await
                .map_err(|source| FirebaseError::RequestSend {
                    path: store.url.to_string(),
                    source,
                })?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(FirebaseError::RequestStatus {
                    path: store.url.to_string(),
                    status: response.status(),
                }
                .into())
            }
        })
    }
}
