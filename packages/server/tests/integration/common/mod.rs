use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;

use server::config::{AppConfig, CorsConfig, ServerConfig, StorageConfig};
use server::state::AppState;
use store::{BlobStore, FilesystemBlobStore, RecordStore};

pub mod routes {
    pub const INVENTORY: &str = "/inventory";

    pub fn item(id: u64) -> String {
        format!("/inventory/{id}")
    }

    pub fn item_raw(id: &str) -> String {
        format!("/inventory/{id}")
    }

    pub fn photo(id: u64) -> String {
        format!("/inventory/{id}/photo")
    }
}

/// A running test server over a throwaway data directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    data_dir: tempfile::TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub content_type: String,
    /// Raw response body as text (empty for binary bodies).
    pub text: String,
    /// Raw response body bytes.
    pub bytes: Vec<u8>,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn read(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let bytes = res.bytes().await.expect("Failed to read body").to_vec();
        let text = String::from_utf8(bytes.clone()).unwrap_or_default();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Self {
            status,
            content_type,
            text,
            bytes,
            body,
        }
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let data_dir = tempfile::tempdir().expect("Failed to create temp data dir");

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            storage: StorageConfig {
                data_dir: data_dir.path().to_path_buf(),
                max_photo_size: 1024 * 1024,
            },
        };

        let blobs: Arc<dyn BlobStore> = Arc::new(
            FilesystemBlobStore::new(
                config.storage.data_dir.clone(),
                config.storage.max_photo_size,
            )
            .await
            .expect("Failed to create blob store"),
        );
        let records = Arc::new(RecordStore::new(
            config.storage.data_dir.join("db.json"),
            blobs.clone(),
        ));

        let state = AppState {
            records,
            blobs,
            config,
        };
        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            data_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST /inventory with multipart form data. Every field is optional so
    /// tests can exercise the validation paths.
    pub async fn register_item(
        &self,
        name: Option<&str>,
        description: Option<&str>,
        photo: Option<(&str, Vec<u8>)>,
    ) -> TestResponse {
        let mut form = reqwest::multipart::Form::new();
        if let Some(name) = name {
            form = form.text("name", name.to_string());
        }
        if let Some(description) = description {
            form = form.text("description", description.to_string());
        }
        if let Some((filename, bytes)) = photo {
            form = form.part(
                "photo",
                reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string()),
            );
        }

        let res = self
            .client
            .post(self.url(routes::INVENTORY))
            .multipart(form)
            .send()
            .await
            .expect("Request failed");
        TestResponse::read(res).await
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed");
        TestResponse::read(res).await
    }

    pub async fn put_json(&self, path: &str, body: Value) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .json(&body)
            .send()
            .await
            .expect("Request failed");
        TestResponse::read(res).await
    }

    pub async fn put_photo(&self, path: &str, filename: &str, bytes: Vec<u8>) -> TestResponse {
        let form = reqwest::multipart::Form::new().part(
            "photo",
            reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string()),
        );
        let res = self
            .client
            .put(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Request failed");
        TestResponse::read(res).await
    }

    /// PUT a multipart body with no `photo` field.
    pub async fn put_empty_form(&self, path: &str) -> TestResponse {
        let form = reqwest::multipart::Form::new().text("unrelated", "field");
        let res = self
            .client
            .put(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Request failed");
        TestResponse::read(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Request failed");
        TestResponse::read(res).await
    }

    /// Remove a photo file from disk directly, simulating store/disk divergence.
    pub fn remove_blob_file(&self, name: &str) {
        std::fs::remove_file(self.data_dir.path().join(name)).expect("Failed to remove blob file");
    }

    /// Photo filenames currently present in the data directory, excluding the
    /// table document and the staging subdirectory.
    pub fn blob_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.data_dir.path())
            .expect("Failed to read data dir")
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name != "db.json" && name != ".tmp")
            .collect();
        names.sort();
        names
    }
}
