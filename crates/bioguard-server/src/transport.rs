//! TLS transport: server socket, per-connection workers, framed I/O.
//!
//! The server binds the configured TCP port and wraps every accepted
//! connection in TLS using the PKCS#12 identity from the keystore. Each
//! connection runs in its own task with a one-frame lifecycle: read exactly
//! one request frame, dispatch through the router on the blocking pool,
//! write exactly one response frame, flush, close. Transport failures are
//! logged and terminate only their own worker; an error escaping the
//! dispatch path is replaced by the generic internal-error response.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use native_tls::Identity;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_native_tls::TlsAcceptor;
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn};

use crate::protocol::message::INTERNAL_ERROR_LINE;
use crate::protocol::{FrameCodec, Response, Router};

/// Builds the TLS acceptor from a PKCS#12 keystore and its password.
///
/// # Errors
///
/// Fails when the keystore cannot be read, decrypted, or used as a server
/// identity.
pub fn build_acceptor(keystore_path: &Path, keystore_password: &str) -> Result<TlsAcceptor> {
    let keystore = std::fs::read(keystore_path)
        .with_context(|| format!("failed to read keystore {}", keystore_path.display()))?;
    let identity = Identity::from_pkcs12(&keystore, keystore_password)
        .context("failed to load PKCS#12 identity")?;
    let acceptor =
        native_tls::TlsAcceptor::new(identity).context("failed to build TLS acceptor")?;
    Ok(TlsAcceptor::from(acceptor))
}

/// Runs the accept loop until the task is cancelled.
///
/// # Errors
///
/// Returns an error only when the listening socket cannot be bound;
/// per-connection failures are logged and absorbed.
pub async fn run(port: u16, acceptor: TlsAcceptor, router: Arc<Router>) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind TCP port {port}"))?;
    info!(port, "TLS server listening");

    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let acceptor = acceptor.clone();
                let router = Arc::clone(&router);
                tokio::spawn(async move {
                    debug!(%peer, "connection accepted");
                    if let Err(e) = handle_connection(stream, &acceptor, router).await {
                        warn!(%peer, error = %e, "connection handler error");
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "failed to accept connection");
            }
        }
    }
}

/// Performs the TLS handshake, then runs the one-frame lifecycle.
async fn handle_connection(
    stream: TcpStream,
    acceptor: &TlsAcceptor,
    router: Arc<Router>,
) -> Result<()> {
    let tls_stream = acceptor
        .accept(stream)
        .await
        .context("TLS handshake failed")?;
    serve_stream(tls_stream, router).await
}

/// One-frame request/response lifecycle over an established stream.
///
/// # Errors
///
/// Fails when the request frame cannot be read or the response frame
/// cannot be written; the caller logs and drops the connection.
pub async fn serve_stream<S>(stream: S, router: Arc<Router>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut framed = Framed::new(stream, FrameCodec::new());

    let Some(frame) = framed.next().await else {
        debug!("client closed the connection before sending a request");
        return Ok(());
    };
    let message = frame.context("failed to read request frame")?;
    info!("received request frame");

    // Dispatch runs blocking filesystem I/O, so it leaves the reactor. A
    // panic inside the dispatch path must not kill the worker silently: it
    // degrades to the generic internal-error response.
    let response = match tokio::task::spawn_blocking(move || router.dispatch(&message)).await {
        Ok(response) => response,
        Err(join_error) => {
            error!(error = %join_error, "dispatch task failed");
            Response::new(500, INTERNAL_ERROR_LINE.to_owned())
        }
    };

    framed
        .send(response.render())
        .await
        .context("failed to write response frame")?;
    info!(status = response.status, "response sent");
    Ok(())
}
