//! `multipart/form-data` body encoding.
//!
//! # Design
//! `MultipartWriter` produces RFC 7578 framing incrementally over any async
//! sink, so the body can be streamed into a pipe without being buffered in
//! full. `encode_fields` drives it over the builder's fields and owns the
//! cancellation and end-of-body rules:
//! - cancellation between (or during) fields stops immediately, with no
//!   trailer and no error;
//! - a sink that reports `BrokenPipe` means the body consumer is gone, which
//!   is the transmitter's failure to report, not ours;
//! - after the last field the trailer is written and the sink shut down,
//!   which is the only end-of-body signal.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;
use crate::form::{FieldEntry, FieldValue};

/// Boundary used by every submission in `BoundaryMode::Fixed`.
pub const MULTIPART_BOUNDARY: &str = "hmapi-form-boundary-6f1d2c9a7b3e4f58";

const COPY_CHUNK: usize = 8 * 1024;

/// How the multipart boundary is chosen per submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BoundaryMode {
    /// The process-wide `MULTIPART_BOUNDARY`, for servers that expect it.
    #[default]
    Fixed,
    /// A fresh random boundary per submission.
    Random,
}

impl BoundaryMode {
    pub fn boundary(&self) -> String {
        match self {
            BoundaryMode::Fixed => MULTIPART_BOUNDARY.to_string(),
            BoundaryMode::Random => format!("hmapi-{}", uuid::Uuid::new_v4().simple()),
        }
    }
}

/// `Content-Type` header value for a body framed with `boundary`.
pub fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={boundary}")
}

/// How a call to `encode_fields` ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoded {
    /// All parts and the trailer were written and the sink shut down.
    Finished,
    /// Cancellation was observed; nothing further was written.
    Cancelled,
    /// The reading end of the sink went away mid-body.
    Detached,
}

/// Incremental writer for `multipart/form-data` framing.
#[derive(Debug)]
pub struct MultipartWriter<W> {
    inner: W,
    boundary: String,
    started: bool,
}

impl<W: AsyncWrite + Unpin> MultipartWriter<W> {
    pub fn new(inner: W, boundary: &str) -> Self {
        Self {
            inner,
            boundary: boundary.to_string(),
            started: false,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Write the delimiter and headers of a new form-data part.
    async fn open_part(&mut self, name: &str) -> io::Result<()> {
        let delimiter = if self.started {
            format!("\r\n--{}\r\n", self.boundary)
        } else {
            format!("--{}\r\n", self.boundary)
        };
        self.started = true;
        let headers = format!(
            "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
            escape_quotes(name)
        );
        self.inner.write_all(delimiter.as_bytes()).await?;
        self.inner.write_all(headers.as_bytes()).await
    }

    pub async fn write_field(&mut self, name: &str, value: &[u8]) -> io::Result<()> {
        self.open_part(name).await?;
        self.inner.write_all(value).await
    }

    /// Stream `reader` into a new part. Errors from the reader and from the
    /// sink are reported separately so callers can tell them apart.
    pub async fn copy_field<R>(&mut self, name: &str, reader: &mut R) -> Result<u64, CopyError>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.open_part(name).await.map_err(CopyError::Sink)?;
        let mut buf = vec![0u8; COPY_CHUNK];
        let mut copied = 0u64;
        loop {
            let n = reader.read(&mut buf).await.map_err(CopyError::Source)?;
            if n == 0 {
                return Ok(copied);
            }
            self.inner.write_all(&buf[..n]).await.map_err(CopyError::Sink)?;
            copied += n as u64;
        }
    }

    /// Write the closing delimiter, flush and shut down the sink.
    pub async fn finish(mut self) -> io::Result<W> {
        let trailer = if self.started {
            format!("\r\n--{}--\r\n", self.boundary)
        } else {
            format!("--{}--\r\n", self.boundary)
        };
        self.inner.write_all(trailer.as_bytes()).await?;
        self.inner.flush().await?;
        self.inner.shutdown().await?;
        Ok(self.inner)
    }
}

/// Which side of a part copy failed.
#[derive(Debug)]
pub enum CopyError {
    Source(io::Error),
    Sink(io::Error),
}

fn escape_quotes(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Encode `fields` in order into `sink`, shutting it down at the end.
pub async fn encode_fields<W>(
    fields: Vec<FieldEntry>,
    sink: W,
    boundary: &str,
    cancel: &CancellationToken,
) -> Result<Encoded, ApiError>
where
    W: AsyncWrite + Unpin,
{
    let mut writer = MultipartWriter::new(sink, boundary);

    for mut field in fields {
        if cancel.is_cancelled() {
            return Ok(Encoded::Cancelled);
        }
        if !field.media_type.is_form_encodable() {
            return Err(ApiError::UnsupportedMediaType(field.media_type));
        }

        let written = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(Encoded::Cancelled),
            written = write_entry(&mut writer, &mut field) => written,
        };
        match written {
            Ok(()) => {}
            Err(CopyError::Sink(err)) if err.kind() == io::ErrorKind::BrokenPipe => {
                return Ok(Encoded::Detached);
            }
            Err(CopyError::Source(err) | CopyError::Sink(err)) => return Err(ApiError::Encode(err)),
        }
    }

    let finished = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Ok(Encoded::Cancelled),
        finished = writer.finish() => finished,
    };
    match finished {
        Ok(_) => Ok(Encoded::Finished),
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(Encoded::Detached),
        Err(err) => Err(ApiError::Encode(err)),
    }
}

async fn write_entry<W>(writer: &mut MultipartWriter<W>, field: &mut FieldEntry) -> Result<(), CopyError>
where
    W: AsyncWrite + Unpin,
{
    match &mut field.value {
        FieldValue::Reader(reader) => writer.copy_field(&field.name, reader.as_mut()).await.map(|_| ()),
        value => {
            let rendered = value.rendered().unwrap_or_default();
            writer.write_field(&field.name, &rendered).await.map_err(CopyError::Sink)
        }
    }
}
