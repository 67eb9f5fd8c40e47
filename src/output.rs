//! Result writer: drains encoded result lines onto the output sink.

use std::io::{self, Write};

use crossbeam_channel::Receiver;

/// Write newline-delimited result lines from the channel until every
/// sender hangs up. With `flush_each`, the buffer is flushed after every
/// line so downstream consumers see results immediately.
pub fn write_results(
    sink: impl Write,
    results: Receiver<Vec<u8>>,
    flush_each: bool,
) -> io::Result<()> {
    let mut out = io::BufWriter::new(sink);
    for line in results {
        out.write_all(&line)?;
        out.write_all(b"\n")?;
        if flush_each {
            out.flush()?;
        }
    }
    out.flush()
}
