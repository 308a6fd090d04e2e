//! Chunked copying of request bodies from a byte source.

use crate::transport::BodyStream;
use bytes::Bytes;
use std::fmt;
use std::io::SeekFrom;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};
use tokio::sync::{Mutex, MutexGuard};

/// Called with the cumulative number of bytes written after every chunk.
pub type ProgressCallback = Arc<dyn Fn(u64) + Send + Sync>;

/// Text recorded as the request body when logging a streamed request.
pub const STREAM_BODY_PLACEHOLDER: &str = "[STREAM CONTENT]";

/// How a streamed request body is read from its source.
///
/// # Examples
///
/// ```
/// use simplerest::StreamOptions;
///
/// let options = StreamOptions::new(64 * 1024)
///     .max_read_length(10 * 1024 * 1024)
///     .on_progress(|written| println!("{} bytes sent", written));
///
/// assert_eq!(options.buffer_size, 64 * 1024);
/// ```
#[derive(Clone)]
pub struct StreamOptions {
    /// Bytes read from the source per chunk. Must be non-zero.
    pub buffer_size: usize,

    /// Upper bound on the bytes sent. `0` sends the whole source.
    pub max_read_length: u64,

    /// Progress callback.
    pub progress: Option<ProgressCallback>,
}

impl StreamOptions {
    /// Creates options that send the whole source in `buffer_size` chunks.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size,
            max_read_length: 0,
            progress: None,
        }
    }

    /// Caps the number of bytes sent.
    pub fn max_read_length(mut self, max_read_length: u64) -> Self {
        self.max_read_length = max_read_length;
        self
    }

    /// Sets the progress callback.
    pub fn on_progress<F>(mut self, progress: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(progress));
        self
    }

    pub(crate) fn is_capped(&self) -> bool {
        self.max_read_length > 0
    }
}

impl fmt::Debug for StreamOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamOptions")
            .field("buffer_size", &self.buffer_size)
            .field("max_read_length", &self.max_read_length)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Reads a source chunk by chunk, honoring the length cap and reporting
/// progress.
pub struct BodyCopier {
    buffer: Vec<u8>,
    max_read_length: u64,
    written: u64,
    progress: Option<ProgressCallback>,
}

impl BodyCopier {
    /// Creates a copier for one attempt.
    pub fn new(options: &StreamOptions) -> Self {
        Self {
            buffer: vec![0; options.buffer_size],
            max_read_length: options.max_read_length,
            written: 0,
            progress: options.progress.clone(),
        }
    }

    /// Bytes produced so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Reads the next chunk, or `None` once the source is drained or the cap
    /// is reached.
    pub async fn next_chunk<R>(&mut self, source: &mut R) -> std::io::Result<Option<Bytes>>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        if self.max_read_length > 0 && self.written >= self.max_read_length {
            return Ok(None);
        }

        let read = source.read(&mut self.buffer).await?;
        if read == 0 {
            return Ok(None);
        }

        let count = if self.max_read_length > 0 {
            let remaining = self.max_read_length - self.written;
            read.min(usize::try_from(remaining).unwrap_or(usize::MAX))
        } else {
            read
        };

        self.written += count as u64;
        if let Some(progress) = &self.progress {
            progress(self.written);
        }

        Ok(Some(Bytes::copy_from_slice(&self.buffer[..count])))
    }

    /// Copies the whole (capped) source into memory.
    pub async fn read_to_end<R>(mut self, source: &mut R) -> std::io::Result<Bytes>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut body = Vec::new();
        while let Some(chunk) = self.next_chunk(source).await? {
            body.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(body))
    }

    /// Turns the copier into a body stream that reads `source` lazily as the
    /// transport pulls chunks.
    ///
    /// The source is locked only while a chunk is read. Once a newer
    /// generation has been taken, the stream fails instead of reading.
    pub(crate) fn into_stream<R>(
        self,
        source: Arc<SharedSource<R>>,
        generation: u64,
    ) -> BodyStream
    where
        R: AsyncRead + AsyncSeek + Unpin + Send + 'static,
    {
        let stream = futures_util::stream::try_unfold(
            (self, source),
            move |(mut copier, source)| async move {
                let chunk = {
                    let mut reader = source.lock_at(generation, copier.written).await?;
                    copier.next_chunk(&mut *reader).await?
                };
                Ok::<_, std::io::Error>(chunk.map(|chunk| (chunk, (copier, source))))
            },
        );
        Box::pin(stream)
    }
}

/// A seekable body source shared by every attempt of one call.
///
/// Each attempt takes a new generation. Reads on behalf of an older
/// generation fail, so a body the transport still holds from an earlier
/// attempt can neither block nor disturb the current one.
pub(crate) struct SharedSource<R> {
    source: Mutex<R>,
    start: u64,
    generation: AtomicU64,
}

impl<R> SharedSource<R>
where
    R: AsyncRead + AsyncSeek + Unpin + Send,
{
    /// Wraps `source`, remembering its current position as the body start.
    pub(crate) async fn new(mut source: R) -> std::io::Result<Self> {
        let start = source.stream_position().await?;
        Ok(Self {
            source: Mutex::new(source),
            start,
            generation: AtomicU64::new(0),
        })
    }

    /// Starts a new attempt, superseding every earlier one.
    pub(crate) fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Copies the whole (capped) body into memory for `generation`.
    pub(crate) async fn read_all(
        &self,
        generation: u64,
        copier: BodyCopier,
    ) -> std::io::Result<Bytes> {
        let mut reader = self.lock_at(generation, 0).await?;
        copier.read_to_end(&mut *reader).await
    }

    async fn lock_at(&self, generation: u64, offset: u64) -> std::io::Result<MutexGuard<'_, R>> {
        let mut source = self.source.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            return Err(std::io::Error::other("request body superseded by a newer attempt"));
        }
        source.seek(SeekFrom::Start(self.start + offset)).await?;
        Ok(source)
    }
}
