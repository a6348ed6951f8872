use crate::command::{Stdin, Stdout};
use std::io::{self, Cursor, Read, Result as IoResult, Write};
use std::process::Stdio;

/// Captured output of a previous stage, replayed as the next stage's input.
#[derive(Debug, Default)]
pub struct MemReader {
    cursor: Cursor<Vec<u8>>,
}

impl MemReader {
    /// Create a MemReader that will read from the provided buffer.
    pub fn new(buf: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(buf),
        }
    }
}

impl Read for MemReader {
    fn read(&mut self, out: &mut [u8]) -> IoResult<usize> {
        self.cursor.read(out)
    }
}

impl Stdin for MemReader {
    /// External programs read the remaining bytes through a pipe.
    fn into_stdio(self: Box<Self>) -> (Stdio, Option<Vec<u8>>) {
        let pos = self.cursor.position() as usize;
        let mut buf = self.cursor.into_inner();
        let rest = buf.split_off(pos.min(buf.len()));
        (Stdio::piped(), Some(rest))
    }
}

/// The shell's own standard input, handed to a single-stage pipeline.
pub struct InheritedStdin(pub io::Stdin);

impl Default for InheritedStdin {
    fn default() -> Self {
        Self(io::stdin())
    }
}

impl Read for InheritedStdin {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        self.0.read(buf)
    }
}

impl Stdin for InheritedStdin {
    fn into_stdio(self: Box<Self>) -> (Stdio, Option<Vec<u8>>) {
        (Stdio::inherit(), None)
    }
}

/// In-memory sink capturing a stage's standard output.
#[derive(Debug, Default)]
pub struct MemWriter {
    buf: Vec<u8>,
}

impl MemWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Return the collected bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

impl Stdout for MemWriter {
    fn stdio(&self) -> Stdio {
        Stdio::piped()
    }

    fn is_captured(&self) -> bool {
        true
    }
}
