use crate::error::Result;
use nix::sys::termios::{self, LocalFlags, SetArg, SpecialCharacterIndices, Termios};
use std::io::{self, ErrorKind, IsTerminal, Read};
use tracing::debug;

/// Blocking byte reader over any input stream.
pub struct ByteSource<R> {
    inner: R,
}

impl<R: Read> ByteSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Next byte, or `None` at end of input.
    ///
    /// Reads interrupted by a signal are retried, so an interrupt while the
    /// shell waits for a keystroke is simply absorbed.
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Keeps stdin in per-keystroke, no-echo mode until dropped.
pub struct RawMode {
    original: Termios,
}

impl RawMode {
    /// Switch stdin to raw mode. Returns `None` when stdin is not a terminal.
    pub fn enable() -> Result<Option<Self>> {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return Ok(None);
        }
        let original = termios::tcgetattr(&stdin)?;
        let mut raw = original.clone();
        raw.local_flags.remove(LocalFlags::ICANON | LocalFlags::ECHO);
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        termios::tcsetattr(&stdin, SetArg::TCSANOW, &raw)?;
        debug!("terminal switched to raw mode");
        Ok(Some(Self { original }))
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = termios::tcsetattr(io::stdin(), SetArg::TCSANOW, &self.original);
        debug!("terminal mode restored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct Flaky {
        interrupted: bool,
        data: Cursor<Vec<u8>>,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn test_reads_bytes_until_eof() {
        let mut source = ByteSource::new(Cursor::new(b"ab".to_vec()));
        assert_eq!(source.next_byte().unwrap(), Some(b'a'));
        assert_eq!(source.next_byte().unwrap(), Some(b'b'));
        assert_eq!(source.next_byte().unwrap(), None);
    }

    #[test]
    fn test_interrupted_read_is_retried() {
        let mut source = ByteSource::new(Flaky {
            interrupted: false,
            data: Cursor::new(b"x".to_vec()),
        });
        assert_eq!(source.next_byte().unwrap(), Some(b'x'));
    }
}
