//! Line input for the terminal chat.

use tokio::io::{AsyncBufRead, Lines};

/// Reads the next line, or `None` at end of input.
///
/// The same `lines` must be reused across calls: lines pasted at once sit
/// in its buffer until they are read.
pub async fn read_line<R>(lines: &mut Lines<R>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    match lines.next_line().await {
        Ok(line) => line,
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
