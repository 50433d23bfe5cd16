//! Loopback listener for the authorization redirect
//!
//! The redirect URI is the application root. After consent the provider
//! sends the browser to `<redirect_uri>?code=...`; this listener accepts that
//! request, answers it, and hands the full location back to the auth
//! manager.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::time::Duration;
use tokio::task::JoinSet;
use url::Url;

use crate::error::{Result, SpotRemoteError};

const SUCCESS_BODY: &str = "Authorization received. You may close this tab.";
const NOT_FOUND_BODY: &str = "Not found";

/// How long a connection may stay silent before it is dropped
const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(2);

/// One-shot HTTP listener bound to the redirect URI's host and port
pub struct RedirectListener {
    listener: tokio::net::TcpListener,
    root: Url,
}

impl RedirectListener {
    /// Binds the host and port of `root`
    ///
    /// # Errors
    ///
    /// Returns [`SpotRemoteError::Callback`] when `root` has no host or port
    /// or the address cannot be bound.
    pub async fn bind(root: &Url) -> Result<Self> {
        let host = root
            .host_str()
            .ok_or_else(|| SpotRemoteError::Callback(format!("redirect URI {root} has no host")))?;
        let port = root
            .port_or_known_default()
            .ok_or_else(|| SpotRemoteError::Callback(format!("redirect URI {root} has no port")))?;

        let listener = tokio::net::TcpListener::bind(format!("{host}:{port}"))
            .await
            .map_err(|e| {
                SpotRemoteError::Callback(format!("failed to bind redirect listener: {e}"))
            })?;

        let mut root = root.clone();
        if root.port().is_some() {
            let bound = listener
                .local_addr()
                .map_err(|e| SpotRemoteError::Callback(format!("failed to get local address: {e}")))?;
            // Port 0 asks the OS for a free port; report the real one.
            let _ = root.set_port(Some(bound.port()));
        }

        tracing::debug!("Listening for authorization redirect on {}", root);
        Ok(Self { listener, root })
    }

    /// The application root as actually bound
    pub fn root(&self) -> &Url {
        &self.root
    }

    /// Waits for the redirect and returns the full location it carried
    ///
    /// Connections are served concurrently, so a browser's idle preconnect
    /// cannot hold up the redirect. Requests for any path other than the
    /// root's (a browser fetching `/favicon.ico`, for instance) are answered
    /// with `404` and ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SpotRemoteError::Callback`] when the listening socket fails.
    pub async fn accept(&self) -> Result<Url> {
        let mut connections = JoinSet::new();
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer) = accepted.map_err(|e| {
                        SpotRemoteError::Callback(format!("failed to accept redirect connection: {e}"))
                    })?;
                    tracing::debug!("Redirect connection from {}", peer);

                    let root = self.root.clone();
                    // Plain std I/O on a blocking thread is enough for one request line.
                    connections.spawn_blocking(move || handle_connection(stream, &root));
                }
                Some(joined) = connections.join_next(), if !connections.is_empty() => {
                    match joined {
                        Ok(Ok(Some(location))) => return Ok(location),
                        Ok(Ok(None)) => {}
                        Ok(Err(e)) => tracing::warn!("Redirect connection failed: {}", e),
                        Err(e) => {
                            return Err(SpotRemoteError::Callback(format!(
                                "callback task panicked: {e}"
                            ))
                            .into())
                        }
                    }
                }
            }
        }
    }
}

/// Reads one request, answers it, and returns the location if it hit the root
fn handle_connection(stream: tokio::net::TcpStream, root: &Url) -> Result<Option<Url>> {
    let std_stream = stream
        .into_std()
        .map_err(|e| SpotRemoteError::Callback(format!("stream conversion failed: {e}")))?;
    std_stream
        .set_nonblocking(false)
        .map_err(|e| SpotRemoteError::Callback(format!("stream mode change failed: {e}")))?;
    std_stream
        .set_read_timeout(Some(REQUEST_READ_TIMEOUT))
        .map_err(|e| SpotRemoteError::Callback(format!("stream timeout change failed: {e}")))?;

    let mut write_stream = std_stream
        .try_clone()
        .map_err(|e| SpotRemoteError::Callback(format!("stream clone failed: {e}")))?;

    let reader = BufReader::new(std_stream);
    let mut request_line = String::new();
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                tracing::debug!("Dropping idle redirect connection");
                return Ok(None);
            }
            Err(e) => {
                return Err(SpotRemoteError::Callback(format!(
                    "failed to read redirect request: {e}"
                ))
                .into())
            }
        };
        // Headers end at the first empty line.
        if line.is_empty() {
            break;
        }
        if request_line.is_empty() {
            request_line = line;
        }
    }

    let location = location_from_request_line(&request_line, root);
    let response = match &location {
        Some(_) => http_response("200 OK", SUCCESS_BODY),
        None => http_response("404 Not Found", NOT_FOUND_BODY),
    };
    let _ = write_stream.write_all(response.as_bytes());
    let _ = write_stream.flush();

    Ok(location)
}

/// Resolves `GET <target> HTTP/1.1` against `root`
///
/// Returns `None` for non-GET requests and for targets whose path differs
/// from the root path.
fn location_from_request_line(request_line: &str, root: &Url) -> Option<Url> {
    let mut parts = request_line.split_whitespace();
    if parts.next()? != "GET" {
        return None;
    }
    let target = parts.next()?;
    let location = root.join(target).ok()?;
    (location.path() == root.path()).then_some(location)
}

fn http_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}
