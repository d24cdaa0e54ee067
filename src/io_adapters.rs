//! Line input sources for the prompt loop and an in-memory output sink.

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::cell::RefCell;
use std::io::{self, BufRead, ErrorKind, Result as IoResult, Write};
use std::rc::Rc;

/// What the prompt loop got when it asked for the next line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// One line without its trailing newline.
    Line(String),
    /// Reading was disturbed by a signal; ask again.
    Interrupted,
    /// No more input will arrive.
    EndOfInput,
}

/// Supplier of raw input lines.
pub trait LineSource {
    /// Show `prompt` and read the next line.
    fn next_line(&mut self, prompt: &str) -> Result<Input>;
}

/// Interactive line editor backed by [`rustyline`].
///
/// History is kept in memory for the session only.
pub struct EditorSource {
    editor: DefaultEditor,
}

impl EditorSource {
    pub fn new() -> Result<Self> {
        let editor = DefaultEditor::new().context("cannot initialize line editor")?;
        Ok(Self { editor })
    }
}

impl LineSource for EditorSource {
    fn next_line(&mut self, prompt: &str) -> Result<Input> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Input::Line(line))
            }
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::EndOfInput),
            Err(ReadlineError::Io(e)) if e.kind() == ErrorKind::Interrupted => {
                Ok(Input::Interrupted)
            }
            Err(err) => Err(err).context("cannot read input line"),
        }
    }
}

/// Reads lines from any buffered reader, writing the prompt to standard output.
///
/// Used for non-interactive input and in tests with a scripted buffer.
pub struct PlainSource<R> {
    reader: R,
    prompt_out: Box<dyn Write>,
}

impl<R: BufRead> PlainSource<R> {
    pub fn new(reader: R) -> Self {
        Self::with_prompt_output(reader, Box::new(io::stdout()))
    }

    /// Same as [`PlainSource::new`], but the prompt goes to `prompt_out`.
    pub fn with_prompt_output(reader: R, prompt_out: Box<dyn Write>) -> Self {
        Self { reader, prompt_out }
    }
}

impl<R: BufRead> LineSource for PlainSource<R> {
    fn next_line(&mut self, prompt: &str) -> Result<Input> {
        self.prompt_out.write_all(prompt.as_bytes())?;
        self.prompt_out.flush()?;

        // Bytes that are not UTF-8 are replaced rather than failing the session.
        let mut raw = Vec::new();
        match self.reader.read_until(b'\n', &mut raw) {
            Ok(0) => Ok(Input::EndOfInput),
            Ok(_) => {
                if raw.ends_with(b"\n") {
                    raw.pop();
                    if raw.ends_with(b"\r") {
                        raw.pop();
                    }
                }
                Ok(Input::Line(String::from_utf8_lossy(&raw).into_owned()))
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => Ok(Input::Interrupted),
            Err(e) => Err(e).context("cannot read input line"),
        }
    }
}

/// Memory-backed writer for capturing shell output.
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    /// Public constructor.
    pub fn new() -> Self {
        Self {
            buf: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Return inner Rc so caller can read collected bytes after command execution.
    pub fn into_inner(self) -> Rc<RefCell<Vec<u8>>> {
        self.buf
    }

    /// Convenience: create writer and return (writer, rc_handle).
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<u8>>>) {
        let mw = MemWriter::new();
        let rc = mw.buf.clone();
        (mw, rc)
    }

    /// Another writer appending to the same buffer.
    pub fn share(&self) -> Self {
        Self {
            buf: self.buf.clone(),
        }
    }
}

impl Default for MemWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn plain_source_strips_newlines_and_prompts() {
        let out = MemWriter::new();
        let buf = out.share().into_inner();
        let mut source =
            PlainSource::with_prompt_output(Cursor::new("ls -l\r\nexit\nlast"), Box::new(out));

        assert_eq!(source.next_line(": ").unwrap(), Input::Line("ls -l".into()));
        assert_eq!(source.next_line(": ").unwrap(), Input::Line("exit".into()));
        assert_eq!(source.next_line(": ").unwrap(), Input::Line("last".into()));
        assert_eq!(source.next_line(": ").unwrap(), Input::EndOfInput);
        assert_eq!(buf.borrow().as_slice(), b": : : : ");
    }

    #[test]
    fn plain_source_replaces_invalid_utf8() {
        let mut source = PlainSource::with_prompt_output(
            Cursor::new(b"echo \xff\nstatus\n".to_vec()),
            Box::new(MemWriter::new()),
        );

        assert_eq!(
            source.next_line("").unwrap(),
            Input::Line("echo \u{FFFD}".into())
        );
        assert_eq!(source.next_line("").unwrap(), Input::Line("status".into()));
    }

    #[test]
    fn mem_writer_shares_its_buffer() {
        let (mut first, buf) = MemWriter::with_handle();
        let mut second = first.share();
        first.write_all(b"a").unwrap();
        second.write_all(b"b").unwrap();
        assert_eq!(buf.borrow().as_slice(), b"ab");
    }
}
