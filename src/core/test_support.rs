//! Local HTTP fixtures for tests of the network-facing sources.

use axum::Router;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::core::downloader::Downloader;

/// An axum router served on a random localhost port until dropped.
pub struct TestHttpServer {
    base_url: String,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestHttpServer {
    pub async fn new(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test HTTP listener");
        let addr = listener.local_addr().expect("read test listener addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let server = axum::serve(listener, router).with_graceful_shutdown(async {
            shutdown_rx.await.ok();
        });
        tokio::spawn(async move {
            server.await.expect("run test HTTP server");
        });

        Self {
            base_url: format!("http://{addr}"),
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `path` must start with `/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestHttpServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub fn downloader() -> Downloader {
    Downloader::new(reqwest::Client::new())
}

/// Serves one response that promises `declared` bytes, sends `sent`, then
/// hangs up. Returns the URL to request.
pub async fn truncating_server(declared: usize, sent: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind truncating listener");
    let addr = listener.local_addr().expect("read truncating listener addr");

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/java-archive\r\nContent-Length: {declared}\r\n\r\n"
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&vec![0u8; sent]).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{addr}/mod.jar")
}

/// Serves `body` one byte at a time with `pause` between bytes, so the whole
/// transfer outlasts any single read timeout shorter than the total.
pub async fn trickling_server(body: &'static [u8], pause: std::time::Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind trickling listener");
    let addr = listener.local_addr().expect("read trickling listener addr");

    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            let head = format!("HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n", body.len());
            let _ = socket.write_all(head.as_bytes()).await;
            for byte in body {
                tokio::time::sleep(pause).await;
                if socket.write_all(&[*byte]).await.is_err() {
                    return;
                }
                let _ = socket.flush().await;
            }
        }
    });

    format!("http://{addr}/slow.jar")
}
