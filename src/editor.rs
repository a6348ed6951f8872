use crate::decoder::{Decoder, EditEvent};
use crate::history::{Direction, History};
use crate::terminal::ByteSource;
use std::io::{self, Read, Write};
use tracing::debug;

const CLEAR_LINE: &[u8] = b"\x1b[2K\r";
const BELL: &[u8] = b"\x07";

/// Outcome of one input-collection cycle. Both variants carry the trimmed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Collected {
    /// The user pressed Enter.
    Line(String),
    /// Input ended while collecting; the shell should stop after this line.
    EndOfInput(String),
}

impl Collected {
    pub fn line(&self) -> &str {
        match self {
            Collected::Line(line) | Collected::EndOfInput(line) => line,
        }
    }
}

/// Single-line editor. The whole prompt line is redrawn after every event.
pub struct LineEditor {
    prompt: String,
    buffer: String,
    history_cursor: usize,
    last_rendered_len: usize,
    decoder: Decoder,
}

impl LineEditor {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            buffer: String::new(),
            history_cursor: 0,
            last_rendered_len: 0,
            decoder: Decoder::new(),
        }
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn on_printable(&mut self, c: char) {
        self.buffer.push(c);
    }

    pub fn on_backspace(&mut self) {
        self.buffer.pop();
    }

    /// Replace the buffer with an older history entry. Returns `false` and
    /// leaves everything untouched at the oldest entry.
    pub fn on_recall_previous(&mut self, history: &History) -> bool {
        self.recall(history, Direction::Older)
    }

    pub fn on_recall_next(&mut self, history: &History) -> bool {
        self.recall(history, Direction::Newer)
    }

    fn recall(&mut self, history: &History, direction: Direction) -> bool {
        match history.recall(direction, self.history_cursor) {
            Some(recall) => {
                self.history_cursor = recall.cursor;
                self.buffer = recall.entry.to_owned();
                true
            }
            None => false,
        }
    }

    /// Erase the previously drawn line and draw `"<prompt> <buffer>"`.
    pub fn render(&mut self, out: &mut dyn Write) -> io::Result<()> {
        if self.last_rendered_len > 0 {
            out.write_all(CLEAR_LINE)?;
        }
        write!(out, "{} {}", self.prompt, self.buffer)?;
        out.flush()?;
        self.last_rendered_len = self.prompt.chars().count() + 1 + self.buffer.chars().count();
        Ok(())
    }

    /// Apply one event. Returns `true` when the event submits the line.
    pub fn apply(
        &mut self,
        event: EditEvent,
        history: &History,
        out: &mut dyn Write,
    ) -> io::Result<bool> {
        match event {
            EditEvent::Insert(c) => self.on_printable(c),
            EditEvent::Backspace => self.on_backspace(),
            EditEvent::RecallPrevious => {
                if !self.on_recall_previous(history) {
                    out.write_all(BELL)?;
                }
            }
            EditEvent::RecallNext => {
                if !self.on_recall_next(history) {
                    out.write_all(BELL)?;
                }
            }
            EditEvent::Ignored => {}
            EditEvent::Submit => return Ok(true),
        }
        Ok(false)
    }

    /// Run the edit loop until Enter or end of input.
    ///
    /// Blocks only while waiting for the next byte. Read errors end the cycle
    /// the same way end of input does.
    pub fn collect_line<R: Read>(
        &mut self,
        input: &mut ByteSource<R>,
        history: &History,
        out: &mut dyn Write,
    ) -> io::Result<Collected> {
        self.buffer.clear();
        self.history_cursor = 0;
        self.last_rendered_len = 0;
        self.decoder.reset();
        self.render(out)?;

        let submitted = loop {
            let byte = match input.next_byte() {
                Ok(Some(byte)) => byte,
                Ok(None) => break false,
                Err(e) => {
                    debug!(error = %e, "input read failed");
                    break false;
                }
            };
            let Some(event) = self.decoder.feed(byte) else {
                continue;
            };
            if !matches!(event, EditEvent::Insert(_)) {
                debug!(?event, "edit event");
            }
            if self.apply(event, history, out)? {
                break true;
            }
            self.render(out)?;
        };

        self.render(out)?;
        out.write_all(b"\r\n")?;
        out.flush()?;

        let line = self.buffer.trim().to_owned();
        Ok(if submitted {
            Collected::Line(line)
        } else {
            Collected::EndOfInput(line)
        })
    }
}
