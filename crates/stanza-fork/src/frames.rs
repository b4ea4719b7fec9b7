//! Frame encoding and buffered writing.
//!
//! A frame is the hex-encoded JSON serialization of one [`PoolMessage`],
//! terminated by a single newline. Hex keeps the payload free of the
//! delimiter byte regardless of content.

use crate::message::{PoolMessage, PROTOCOL_VERSION};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

/// Writes are coalesced until the pending buffer would exceed this many
/// bytes, then flushed.
pub const WRITE_BUFFER_LIMIT: usize = 200;

/// How long a worker sleeps between partial-write retries, and how many
/// retries it attempts before giving up.
const PARTIAL_WRITE_BACKOFF: Duration = Duration::from_millis(500);
const PARTIAL_WRITE_RETRIES: usize = 120;

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("could not serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("could not write frame: {0}")]
    Write(#[from] std::io::Error),

    #[error("frame is not valid hex")]
    Hex(#[from] hex::FromHexError),

    #[error("unsupported frame version {0}")]
    Version(u32),
}

pub fn encode_frame<T: Serialize, A: Serialize>(
    message: &PoolMessage<T, A>,
) -> Result<Vec<u8>, FrameError> {
    let serialized = serde_json::to_vec(message)?;
    let mut frame = hex::encode(serialized).into_bytes();
    frame.push(b'\n');
    Ok(frame)
}

pub fn decode_frame<T: DeserializeOwned, A: DeserializeOwned>(
    frame: &[u8],
) -> Result<PoolMessage<T, A>, FrameError> {
    let serialized = hex::decode(frame)?;
    let message: PoolMessage<T, A> = serde_json::from_slice(&serialized)?;
    if message.version() != PROTOCOL_VERSION {
        return Err(FrameError::Version(message.version()));
    }
    Ok(message)
}

/// Buffered frame writer for one worker's pipe.
pub struct FrameWriter<W: Write> {
    inner: W,
    pending: Vec<u8>,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            pending: Vec::new(),
        }
    }

    /// Queue a frame, flushing once the pending buffer grows past
    /// [`WRITE_BUFFER_LIMIT`].
    pub fn buffer_frame<T: Serialize, A: Serialize>(
        &mut self,
        message: &PoolMessage<T, A>,
    ) -> Result<(), FrameError> {
        self.pending.extend_from_slice(&encode_frame(message)?);
        if self.pending.len() > WRITE_BUFFER_LIMIT {
            self.flush_fully()?;
        }
        Ok(())
    }

    /// Write out everything pending, retrying partial writes with a bounded
    /// sleep backoff.
    pub fn flush_fully(&mut self) -> Result<(), FrameError> {
        let mut written = 0;
        let mut stalls = 0;

        while written < self.pending.len() {
            match self.inner.write(&self.pending[written..]) {
                Ok(0) => {
                    stalls += 1;
                    if stalls > PARTIAL_WRITE_RETRIES {
                        return Err(FrameError::Write(std::io::Error::new(
                            std::io::ErrorKind::WriteZero,
                            "pipe stalled during flush",
                        )));
                    }
                    std::thread::sleep(PARTIAL_WRITE_BACKOFF);
                }
                Ok(n) => {
                    written += n;
                    stalls = 0;
                }
                Err(error) if error.kind() == std::io::ErrorKind::Interrupted => {}
                Err(error) => return Err(FrameError::Write(error)),
            }
        }

        self.pending.clear();
        self.inner.flush()?;
        Ok(())
    }
}
