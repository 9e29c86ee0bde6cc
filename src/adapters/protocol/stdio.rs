//! Newline-delimited JSON-RPC transport over byte streams.
//!
//! Each line read is one request; each response is written as one line.
//! The loop ends on end of input, a read error, or cancellation. A request
//! still running when the token fires is abandoned without a response.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::MappingAdapter;

use super::json_rpc::ProtocolError;
use super::session::ProtocolSession;

/// Serves one session over a reader/writer pair until input ends.
pub async fn serve<R, W>(
    reader: R,
    mut writer: W,
    mut session: ProtocolSession,
    cancel: CancellationToken,
) -> Result<(), ProtocolError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    session.attach()?;
    let mut lines = reader.lines();

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Protocol transport cancelled");
                break;
            }
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("Protocol input closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Protocol input failed");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                info!("Protocol transport cancelled during a request");
                break;
            }
            response = session.handle_message(&line) => response,
        };
        if let Some(response) = response {
            write_line(&mut writer, &response).await?;
        }
    }

    session.disconnect();
    Ok(())
}

async fn write_line<W>(writer: &mut W, text: &str) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    let io_err = |e: std::io::Error| ProtocolError::Internal(format!("write failed: {}", e));
    writer.write_all(text.as_bytes()).await.map_err(io_err)?;
    writer.write_all(b"\n").await.map_err(io_err)?;
    writer.flush().await.map_err(io_err)
}

/// Serves the mapping tools over the process stdin and stdout.
pub async fn serve_stdio(
    adapter: Arc<MappingAdapter>,
    cancel: CancellationToken,
) -> Result<(), ProtocolError> {
    info!(backend = adapter.backend_name(), "Serving mapping tools over stdio");
    let session = ProtocolSession::new(adapter);
    serve(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        session,
        cancel,
    )
    .await
}
