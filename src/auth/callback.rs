//! Single-use loopback listener that captures the authorization redirect.
//!
//! Binds an ephemeral port on 127.0.0.1, serves exactly one meaningful
//! outcome for `/callback`, and releases the port on shutdown or drop.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};

use super::error::AuthError;

/// Path the authority redirects back to.
pub const CALLBACK_PATH: &str = "/callback";

const MAX_REQUEST_HEAD_BYTES: usize = 16 * 1024;
/// Connections that send no request head within this window are dropped.
const REQUEST_HEAD_TIMEOUT: Duration = Duration::from_secs(10);

/// What the redirect told us, before any network exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    Authorized { code: String },
    Denied { code: String, description: String },
    StateMismatch,
    MissingCode,
}

impl CallbackOutcome {
    /// The authorization code, or the matching terminal error.
    pub fn into_code(self) -> Result<String, AuthError> {
        match self {
            Self::Authorized { code } => Ok(code),
            Self::Denied { code, description } => {
                Err(AuthError::AuthorityDenied { code, description })
            }
            Self::StateMismatch => Err(AuthError::StateMismatch),
            Self::MissingCode => Err(AuthError::MissingCode),
        }
    }
}

/// Classify a redirect query string against the expected `state`.
///
/// An authority error wins over everything else; then the state is checked
/// before the code is looked at.
pub fn classify_callback(query: &str, expected_state: &str) -> CallbackOutcome {
    let mut code = None;
    let mut state = None;
    let mut error = None;
    let mut error_description = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(error) = error.filter(|e| !e.is_empty()) {
        return CallbackOutcome::Denied {
            code: error,
            description: error_description.unwrap_or_default(),
        };
    }
    if state.as_deref() != Some(expected_state) {
        return CallbackOutcome::StateMismatch;
    }
    match code.filter(|c| !c.is_empty()) {
        Some(code) => CallbackOutcome::Authorized { code },
        None => CallbackOutcome::MissingCode,
    }
}

type Delivery = io::Result<CallbackOutcome>;
type SharedSender = Arc<Mutex<Option<oneshot::Sender<Delivery>>>>;

/// Running loopback listener for one login attempt.
pub struct CallbackListener {
    port: u16,
    receiver: Option<oneshot::Receiver<Delivery>>,
    task: JoinHandle<()>,
}

impl CallbackListener {
    /// Bind an ephemeral loopback port and start serving in the background.
    pub async fn bind(expected_state: impl Into<String>) -> Result<Self, AuthError> {
        let listener = TcpListener::bind(("127.0.0.1", 0))
            .await
            .map_err(AuthError::Listener)?;
        let port = listener.local_addr().map_err(AuthError::Listener)?.port();
        let (sender, receiver) = oneshot::channel();
        let task = tokio::spawn(serve(listener, expected_state.into(), sender));
        tracing::debug!(port, "callback listener bound");
        Ok(Self {
            port,
            receiver: Some(receiver),
            task,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Redirect URI to register with the authority for this attempt.
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}{CALLBACK_PATH}", self.port)
    }

    /// Wait for the first callback outcome, up to `timeout`.
    pub async fn wait(&mut self, timeout: Duration) -> Result<String, AuthError> {
        let Some(receiver) = self.receiver.take() else {
            return Err(AuthError::Invalid(
                "callback listener already delivered its outcome".to_string(),
            ));
        };
        match tokio::time::timeout(timeout, receiver).await {
            Err(_) => Err(AuthError::Timeout(timeout)),
            Ok(Err(_)) => Err(AuthError::Listener(io::Error::new(
                io::ErrorKind::Other,
                "callback listener stopped before a redirect arrived",
            ))),
            Ok(Ok(Err(err))) => Err(AuthError::Listener(err)),
            Ok(Ok(Ok(outcome))) => outcome.into_code(),
        }
    }

    /// Stop serving and release the port before returning.
    pub async fn shutdown(mut self) {
        self.task.abort();
        let _ = (&mut self.task).await;
        tracing::debug!(port = self.port, "callback listener stopped");
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(listener: TcpListener, expected_state: String, sender: oneshot::Sender<Delivery>) {
    let expected_state = Arc::new(expected_state);
    let sender = Arc::new(Mutex::new(Some(sender)));
    // Dropping the set with the serve task aborts every open connection.
    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    connections.spawn(handle_connection(
                        stream,
                        Arc::clone(&expected_state),
                        Arc::clone(&sender),
                    ));
                }
                Err(err) => {
                    if let Some(tx) = take_sender(&sender) {
                        let _ = tx.send(Err(err));
                    }
                    return;
                }
            },
            Some(_) = connections.join_next() => {}
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    expected_state: Arc<String>,
    sender: SharedSender,
) {
    let head = match tokio::time::timeout(REQUEST_HEAD_TIMEOUT, read_request_head(&mut stream))
        .await
    {
        Ok(Ok(head)) => head,
        Ok(Err(err)) => {
            tracing::debug!(error = %err, "dropping unreadable callback connection");
            return;
        }
        Err(_) => {
            tracing::debug!("dropping idle callback connection");
            return;
        }
    };
    let Some(target) = request_target(&head) else {
        let _ = write_response(&mut stream, "400 Bad Request", "Malformed request.").await;
        return;
    };
    let (path, query) = target.split_once('?').unwrap_or((target, ""));
    if path != CALLBACK_PATH {
        let _ = write_response(&mut stream, "404 Not Found", "Not found.").await;
        return;
    }

    let Some(tx) = take_sender(&sender) else {
        let _ = write_response(
            &mut stream,
            "409 Conflict",
            "This login attempt was already handled. You can close this window.",
        )
        .await;
        return;
    };
    let outcome = classify_callback(query, &expected_state);
    let (status, page) = outcome_page(&outcome);
    // Hand off before the browser sees a page so the terminal never lags.
    let _ = tx.send(Ok(outcome));
    let _ = write_response(&mut stream, status, page).await;
}

fn take_sender(sender: &SharedSender) -> Option<oneshot::Sender<Delivery>> {
    match sender.lock() {
        Ok(mut guard) => guard.take(),
        Err(poisoned) => poisoned.into_inner().take(),
    }
}

async fn read_request_head(stream: &mut TcpStream) -> io::Result<String> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
        if buffer.len() >= MAX_REQUEST_HEAD_BYTES {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "callback request head too large",
            ));
        }
    }
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn request_target(head: &str) -> Option<&str> {
    let mut parts = head.lines().next()?.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    (method == "GET").then_some(target)
}

fn outcome_page(outcome: &CallbackOutcome) -> (&'static str, &'static str) {
    match outcome {
        CallbackOutcome::Authorized { .. } => (
            "200 OK",
            "<html><head><meta charset=\"UTF-8\"><title>Authorization Successful</title></head>\
             <body style=\"font-family: sans-serif; text-align: center; padding: 50px;\">\
             <h1>Authorization Successful</h1>\
             <p>You can close this window and return to the terminal.</p></body></html>",
        ),
        CallbackOutcome::Denied { .. } => (
            "400 Bad Request",
            "Authorization failed. You can close this window.",
        ),
        CallbackOutcome::StateMismatch => (
            "400 Bad Request",
            "Invalid state parameter. You can close this window.",
        ),
        CallbackOutcome::MissingCode => (
            "400 Bad Request",
            "No authorization code received. You can close this window.",
        ),
    }
}

async fn write_response(stream: &mut TcpStream, status: &str, body: &str) -> io::Result<()> {
    let content_type = if body.starts_with("<html>") {
        "text/html; charset=utf-8"
    } else {
        "text/plain; charset=utf-8"
    };
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}
