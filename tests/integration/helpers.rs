//! Test helpers and utilities

use std::time::Duration;

use reqwest::{Client, Response};
use tokio::net::TcpListener;
use tokio_health::{endpoint, Checker};

/// A health endpoint served on an ephemeral local port.
pub struct TestEndpoint {
    pub base_url: String,
    pub client: Client,
}

impl TestEndpoint {
    /// Bind an ephemeral port and serve the checker's health endpoint.
    pub async fn spawn(checker: Checker) -> Self {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");

        tokio::spawn(async move {
            let _ = endpoint::serve(listener, checker).await;
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{}", addr),
            client,
        }
    }

    /// Make a GET request to the health endpoint.
    pub async fn get_health(&self) -> Response {
        self.client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .expect("GET request failed")
    }
}
