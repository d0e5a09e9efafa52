use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    ChunksError(ChunksError),
    InvalidPayload,
}

/// A type for reading the `data` fields of server-sent events from a
/// chunk stream.
///
/// Completion endpoints send one `data: <payload>` line per event, so the
/// reader works line by line: blank lines, comments and fields other than
/// `data` are skipped.
pub struct Sse {
    buf: Vec<u8>,
    chunks: Chunks,
    eof: bool,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: Vec::new(),
            chunks,
            eof: false,
        }
    }

    /// Returns the payload of the next `data` line, or `None` when the
    /// stream is exhausted.
    pub async fn next_data(&mut self) -> Result<Option<String>, Error> {
        loop {
            // Drain complete lines in the buffer first.
            if let Some(data) = self.try_parse_data()? {
                return Ok(Some(data));
            }
            if self.eof {
                return Ok(None);
            }

            // Not enough data to make a line, read more. Bytes are buffered
            // raw since a multi-byte character may span two chunks.
            match self.chunks.next_chunk().await.map_err(Error::ChunksError)? {
                Some(bytes) => self.buf.extend_from_slice(&bytes),
                None => self.eof = true,
            }
        }
    }

    fn try_parse_data(&mut self) -> Result<Option<String>, Error> {
        loop {
            let line = match self.buf.iter().position(|b| *b == b'\n') {
                Some(eol_idx) => self.buf.drain(..=eol_idx).collect::<Vec<_>>(),
                // The last line may come without a line feed.
                None if self.eof && !self.buf.is_empty() => {
                    std::mem::take(&mut self.buf)
                }
                None => return Ok(None),
            };

            let Ok(line) = str::from_utf8(&line) else {
                return Err(Error::InvalidPayload);
            };
            let line = line.trim_end_matches(['\n', '\r']);
            let Some(data) = line.strip_prefix("data:") else {
                if !line.is_empty() {
                    trace!("skipping sse line: {line}");
                }
                continue;
            };
            let data = data.strip_prefix(' ').unwrap_or(data);
            return Ok(Some(data.to_owned()));
        }
    }
}
