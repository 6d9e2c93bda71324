//! Sequential byte source abstraction.
//!
//! [`ByteSource`] wraps any [`Read`] with the two capabilities the decoding
//! process needs beyond plain reading: detecting the end of the stream
//! without consuming content (via a single byte of lookahead) and keeping
//! count of the number of bytes consumed, which error messages report as the
//! failure position.

use std::io::{self, Read};

/// The maximum number of bytes requested from the underlying reader in one
/// call. Value fields larger than this are read in chunks of this size plus
/// a final chunk with the remainder.
pub(crate) const MAX_READ_CHUNK: usize = 1 << 22;

/// A sequential byte reader over an arbitrary source,
/// with position bookkeeping and one byte of lookahead.
#[derive(Debug)]
pub struct ByteSource<R> {
    inner: R,
    position: u64,
    peeked: Option<u8>,
}

impl<R> ByteSource<R>
where
    R: Read,
{
    /// Create a new byte source starting at position 0.
    pub fn new(inner: R) -> Self {
        ByteSource {
            inner,
            position: 0,
            peeked: None,
        }
    }

    /// Retrieve the number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Check whether the source is exhausted.
    ///
    /// This may read (and retain) one byte of lookahead from the underlying
    /// reader; a subsequent read yields that byte first.
    pub fn at_end(&mut self) -> io::Result<bool> {
        if self.peeked.is_some() {
            return Ok(false);
        }
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(true),
                Ok(_) => {
                    self.peeked = Some(byte[0]);
                    return Ok(false);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Read exactly `buf.len()` bytes, honouring any byte of lookahead taken
    /// by [`at_end`](Self::at_end).
    pub fn read_exact(&mut self, buf: &mut [u8]) -> io::Result<()> {
        let mut rest = buf;
        if let Some(byte) = self.peeked.take() {
            if rest.is_empty() {
                self.peeked = Some(byte);
                return Ok(());
            }
            rest[0] = byte;
            self.position += 1;
            rest = &mut rest[1..];
        }
        self.inner.read_exact(rest)?;
        self.position += rest.len() as u64;
        Ok(())
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> io::Result<u8> {
        let mut byte = [0u8; 1];
        self.read_exact(&mut byte)?;
        Ok(byte[0])
    }

    /// Read exactly `len` bytes to the end of the given vector,
    /// requesting at most `MAX_READ_CHUNK` bytes per read.
    pub fn read_to_vec(&mut self, len: u32, buf: &mut Vec<u8>) -> io::Result<()> {
        self.read_to_vec_chunked(len, buf, MAX_READ_CHUNK)
    }

    fn read_to_vec_chunked(&mut self, len: u32, buf: &mut Vec<u8>, chunk: usize) -> io::Result<()> {
        let len = len as usize;
        // cap the reservation: the length field is untrusted input
        buf.reserve(len.min(chunk));
        let mut remaining = len;
        while remaining > 0 {
            let take = remaining.min(chunk);
            let base = buf.len();
            buf.resize(base + take, 0);
            self.read_exact(&mut buf[base..])?;
            remaining -= take;
        }
        Ok(())
    }
}
