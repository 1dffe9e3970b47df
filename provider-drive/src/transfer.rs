//! Streaming transfer engine.
//!
//! One coordinator pumps the response byte stream into the destination file
//! and settles the operation with exactly one outcome: success after the
//! sink has received and flushed end-of-stream, or the first failure from
//! either side. Read failures become [`DriveError::Stream`], write failures
//! become [`DriveError::Sink`], so callers can tell the two apart.
//!
//! On failure the partial destination file is left in place; cleaning it up
//! is the caller's responsibility. The file handle itself is released on
//! every exit path.

use crate::error::{DriveError, Result};
use bytes::BytesMut;
use core_session::ByteReader;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::debug;

const COPY_BUF_SIZE: usize = 64 * 1024;

/// Pump `reader` to end-of-stream into a freshly created file at `dest`.
/// Resolves with the byte count only after the file has been flushed.
pub async fn pump_to_file(mut reader: ByteReader, dest: &Path) -> Result<u64> {
    let mut file = File::create(dest)
        .await
        .map_err(|source| DriveError::Sink {
            path: dest.to_owned(),
            source,
        })?;

    let mut buf = BytesMut::with_capacity(COPY_BUF_SIZE);
    let mut written: u64 = 0;

    loop {
        buf.clear();
        let n = reader
            .read_buf(&mut buf)
            .await
            .map_err(|e| DriveError::Stream(e.to_string()))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf)
            .await
            .map_err(|source| DriveError::Sink {
                path: dest.to_owned(),
                source,
            })?;
        written += n as u64;
    }

    file.flush().await.map_err(|source| DriveError::Sink {
        path: dest.to_owned(),
        source,
    })?;

    debug!(path = %dest.display(), bytes = written, "transfer complete");
    Ok(written)
}
