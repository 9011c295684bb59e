//! User-agent side of the interactive authorization.

use std::time::Duration;

use async_trait::async_trait;
use tether_application::ports::IdentityError;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

const CALLBACK_PATH: &str = "/callback";

/// Presents the authorization URL to the user and captures the redirect.
#[async_trait]
pub trait AuthorizationAgent: Send + Sync {
    /// Redirect URI registered with the identity provider.
    fn redirect_uri(&self) -> String;

    /// Sends the user to `authorize_url` and returns the URL the provider
    /// redirected back to.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::UserCancelled`] if the user never comes
    /// back, or another error if the redirect cannot be received.
    async fn authorize(&self, authorize_url: &Url) -> Result<Url, IdentityError>;
}

/// Receives the redirect on a loopback HTTP listener.
///
/// The authorization URL is logged for the user to open in a browser.
#[derive(Debug, Clone)]
pub struct LoopbackAgent {
    port: u16,
    timeout: Duration,
}

impl LoopbackAgent {
    /// Creates an agent listening on `127.0.0.1:port`.
    #[must_use]
    pub const fn new(port: u16) -> Self {
        Self {
            port,
            timeout: Duration::from_secs(300),
        }
    }

    /// Sets how long to wait for the user.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn wait_for_callback(&self, listener: TcpListener) -> Result<Url, IdentityError> {
        loop {
            let (mut stream, _) = listener.accept().await.map_err(network)?;
            let Some(path) = read_request_path(&mut stream).await? else {
                continue;
            };
            if !path.starts_with(CALLBACK_PATH) {
                respond(&mut stream, "404 Not Found", "Not found").await;
                continue;
            }

            let url = Url::parse(&format!("http://127.0.0.1:{}{path}", self.port)).map_err(|e| {
                IdentityError::InvalidCallback {
                    message: e.to_string(),
                }
            })?;
            respond(
                &mut stream,
                "200 OK",
                "Sign-in complete. You can close this window.",
            )
            .await;
            return Ok(url);
        }
    }
}

fn network(e: std::io::Error) -> IdentityError {
    IdentityError::Network {
        message: e.to_string(),
    }
}

/// Reads the request line of a GET request and returns its path.
async fn read_request_path(stream: &mut TcpStream) -> Result<Option<String>, IdentityError> {
    let mut buffer = [0_u8; 8192];
    let size = stream.read(&mut buffer).await.map_err(network)?;
    if size == 0 {
        return Ok(None);
    }
    let request = String::from_utf8_lossy(&buffer[..size]);
    let mut parts = request.lines().next().unwrap_or_default().split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(path)) if path.starts_with('/') => Ok(Some(path.to_string())),
        _ => {
            respond(stream, "400 Bad Request", "Expected a GET request.").await;
            Ok(None)
        }
    }
}

async fn respond(stream: &mut TcpStream, status: &str, message: &str) {
    let body = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>Tether</title></head>\
         <body style=\"font-family: sans-serif; padding: 24px;\"><p>{message}</p></body></html>"
    );
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    if let Err(e) = stream.write_all(response.as_bytes()).await {
        tracing::debug!(event = "callback_response_failed", error = %e, "Could not answer browser");
    }
}

#[async_trait]
impl AuthorizationAgent for LoopbackAgent {
    fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}{CALLBACK_PATH}", self.port)
    }

    async fn authorize(&self, authorize_url: &Url) -> Result<Url, IdentityError> {
        let listener = TcpListener::bind(("127.0.0.1", self.port))
            .await
            .map_err(network)?;
        tracing::info!(
            event = "authorization_started",
            url = %authorize_url,
            "Open the URL in a browser to sign in"
        );

        tokio::time::timeout(self.timeout, self.wait_for_callback(listener))
            .await
            .map_err(|_| IdentityError::UserCancelled)?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn free_port() -> u16 {
        std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    async fn get(url: &str) -> reqwest::Response {
        for _ in 0..50 {
            if let Ok(response) = reqwest::get(url).await {
                return response;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("listener never came up");
    }

    #[test]
    fn test_redirect_uri() {
        assert_eq!(
            LoopbackAgent::new(8080).redirect_uri(),
            "http://127.0.0.1:8080/callback"
        );
    }

    #[tokio::test]
    async fn test_captures_callback_after_ignoring_other_paths() {
        let port = free_port();
        let agent = LoopbackAgent::new(port);
        let authorize_url = Url::parse("https://id.example.com/authorize").unwrap();
        let waiting = tokio::spawn(async move { agent.authorize(&authorize_url).await });

        let favicon = get(&format!("http://127.0.0.1:{port}/favicon.ico")).await;
        assert_eq!(favicon.status().as_u16(), 404);
        let callback = get(&format!("http://127.0.0.1:{port}/callback?code=abc&state=xyz")).await;
        assert_eq!(callback.status().as_u16(), 200);

        let url = waiting.await.unwrap().unwrap();
        assert_eq!(url.path(), "/callback");
        assert_eq!(url.query(), Some("code=abc&state=xyz"));
    }

    #[tokio::test]
    async fn test_times_out_as_cancelled() {
        let agent = LoopbackAgent::new(free_port()).with_timeout(Duration::from_millis(20));
        let authorize_url = Url::parse("https://id.example.com/authorize").unwrap();

        let result = agent.authorize(&authorize_url).await;

        assert!(matches!(result, Err(IdentityError::UserCancelled)));
    }
}
