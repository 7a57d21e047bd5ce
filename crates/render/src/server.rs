//! Local static file server used to load decks over HTTP.

use axum::Router;
use keynote_core::{Error, Result};
use std::net::SocketAddr;
use std::path::Path;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;

/// A running static server rooted at a directory.
///
/// Stops when [`StaticServer::shutdown`] is called or the value is dropped.
pub struct StaticServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl StaticServer {
    /// Serve `root` on `127.0.0.1:port`. Port 0 picks a free port.
    pub async fn start(root: &Path, port: u16) -> Result<Self> {
        let app = Router::new().fallback_service(ServeDir::new(root));

        let listener = TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|e| Error::RenderError(format!("Failed to bind port {}: {}", port, e)))?;
        let addr = listener.local_addr()?;

        let (tx, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = rx.await;
            });
            if let Err(e) = server.await {
                log::warn!("Static server stopped: {}", e);
            }
        });

        log::debug!("Serving {} at http://{}", root.display(), addr);

        Ok(Self {
            addr,
            shutdown: Some(tx),
            task,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// URL of a path relative to the served root.
    pub fn url_for(&self, relative: &str) -> String {
        format!(
            "http://localhost:{}/{}",
            self.addr.port(),
            relative.trim_start_matches('/')
        )
    }

    /// Stop accepting connections and wait for the server task to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            log::debug!("Static server task ended abnormally: {}", e);
        }
    }
}

impl Drop for StaticServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!(
            "GET {} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
            path
        );
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_serves_deck_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("decks/demo")).unwrap();
        std::fs::write(dir.path().join("decks/demo/index.html"), "<main>deck</main>").unwrap();

        let server = StaticServer::start(dir.path(), 0).await.unwrap();
        let response = get(server.addr(), "/decks/demo/index.html").await;
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("<main>deck</main>"));

        let missing = get(server.addr(), "/decks/other/index.html").await;
        assert!(missing.starts_with("HTTP/1.1 404"));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_url_for() {
        let dir = tempfile::tempdir().unwrap();
        let server = StaticServer::start(dir.path(), 0).await.unwrap();
        let port = server.addr().port();
        assert_eq!(
            server.url_for("/decks/demo/index.html"),
            format!("http://localhost:{}/decks/demo/index.html", port)
        );
        server.shutdown().await;
    }
}
