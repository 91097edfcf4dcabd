//! Byte and line sources consumed by the stream differs.
//!
//! A source is read sequentially and released explicitly. The differs
//! release both of their sources on every exit path; see [`settle`] for how
//! a read failure and a release failure are prioritized.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::Path;

use tracing::warn;

/// A sequential source of bytes.
pub trait ByteSource {
    /// A human-readable name for diagnostics, such as a file path.
    fn description(&self) -> String;

    /// Read the next byte, or `None` at end of stream.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Read up to `buf.len()` bytes, returning how many were read. Zero
    /// means end of stream.
    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut n = 0;
        while n < buf.len() {
            match self.read_byte()? {
                Some(b) => {
                    buf[n] = b;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    /// Release the underlying resource. Reads after release fail.
    fn release(&mut self) -> io::Result<()>;
}

/// A sequential source of text lines.
pub trait LineSource {
    /// A human-readable name for diagnostics, such as a file path.
    fn description(&self) -> String;

    /// Read the next line without its terminator, or `None` at end of
    /// stream. Both `\n` and `\r\n` terminate a line.
    fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Release the underlying resource. Reads after release fail.
    fn release(&mut self) -> io::Result<()>;
}

/// A byte and line source over any [`Read`] implementation.
///
/// Invalid UTF-8 read as a line fails with [`io::ErrorKind::InvalidData`].
pub struct ReaderSource<R> {
    description: String,
    reader: Option<BufReader<R>>,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(description: impl Into<String>, reader: R) -> Self {
        Self {
            description: description.into(),
            reader: Some(BufReader::new(reader)),
        }
    }

    fn reader(&mut self) -> io::Result<&mut BufReader<R>> {
        self.reader
            .as_mut()
            .ok_or_else(|| io::Error::other(format!("{} already released", self.description)))
    }
}

impl ReaderSource<File> {
    /// Open a file; the path is the description.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        Ok(Self::new(path.display().to_string(), File::open(path)?))
    }
}

impl ReaderSource<Cursor<Vec<u8>>> {
    pub fn from_bytes(description: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(description, Cursor::new(bytes.into()))
    }

    pub fn from_text(description: impl Into<String>, text: &str) -> Self {
        Self::from_bytes(description, text.as_bytes())
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let reader = self.reader()?;
        let byte = reader.fill_buf()?.first().copied();
        if byte.is_some() {
            reader.consume(1);
        }
        Ok(byte)
    }

    fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader()?.read(buf)
    }

    fn release(&mut self) -> io::Result<()> {
        self.reader.take();
        Ok(())
    }
}

impl<R: Read> LineSource for ReaderSource<R> {
    fn description(&self) -> String {
        self.description.clone()
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader()?.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    fn release(&mut self) -> io::Result<()> {
        self.reader.take();
        Ok(())
    }
}

/// Combine the outcome of reading two sources with the outcome of
/// releasing them.
///
/// A read failure is returned in preference to any release failure; a
/// release failure is returned only if the read succeeded. Both releases
/// must already have been attempted.
pub fn settle<T>(outcome: io::Result<T>, released: [io::Result<()>; 2]) -> io::Result<T> {
    match outcome {
        Ok(value) => {
            for release in released {
                release?;
            }
            Ok(value)
        }
        Err(e) => {
            for release in released.into_iter().filter_map(Result::err) {
                warn!(error = %release, "release failed after read error");
            }
            Err(e)
        }
    }
}
