//! Buffered, offset-tracking byte source

use std::io::{self, BufRead, BufReader, ErrorKind, Read};

/// Exclusively owned input stream of a reader.
///
/// Dropping the inner reader is what closes it; a closed source behaves like an
/// empty one.
pub(crate) struct ByteSource<R> {
    inner: Option<BufReader<R>>,
    offset: u64,
}

impl<R: Read> ByteSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: Some(BufReader::new(inner)),
            offset: 0,
        }
    }

    /// Bytes consumed since the start of the stream
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    pub fn close(&mut self) {
        self.inner = None;
    }

    /// Peeks for one more byte without consuming it
    pub fn at_eof(&mut self) -> io::Result<bool> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(true);
        };

        loop {
            match inner.fill_buf() {
                Ok(buf) => return Ok(buf.is_empty()),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Fills `buf` as far as the stream allows and returns the number of bytes read.
    /// A short count means end of input.
    pub fn read_into(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(inner) = self.inner.as_mut() else {
            return Ok(0);
        };

        let mut filled = 0;
        while filled < buf.len() {
            match inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.offset += filled as u64;
                    return Err(e);
                }
            }
        }

        self.offset += filled as u64;
        Ok(filled)
    }
}
