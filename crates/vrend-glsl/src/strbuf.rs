//! Growable GLSL text buffer with statement indentation.

use core::fmt;

use thiserror::Error;

/// Minimum growth step of the backing storage.
const MIN_GROWTH: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("outdent without matching indent")]
    OutdentUnderflow,
    #[error("text buffer marked invalid by the translator")]
    Poisoned,
}

/// Append-only text buffer.
///
/// Every call to [`StrBuf::append`] is prefixed with one tab per indent
/// level; newlines inside the appended text are not re-indented. The first
/// error is sticky: once set, further appends are dropped and
/// [`StrBuf::error`] keeps reporting it.
#[derive(Debug, Clone, Default)]
pub struct StrBuf {
    text: String,
    indent: usize,
    error: Option<BufferError>,
}

impl StrBuf {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            text: String::with_capacity(capacity),
            indent: 0,
            error: None,
        }
    }

    pub fn append(&mut self, s: &str) {
        if self.error.is_some() {
            return;
        }
        let needed = self.text.len() + self.indent + s.len();
        if needed > self.text.capacity() {
            let target = needed.max(self.text.capacity() + MIN_GROWTH);
            self.text.reserve_exact(target - self.text.len());
        }
        for _ in 0..self.indent {
            self.text.push('\t');
        }
        self.text.push_str(s);
    }

    /// Formats `args` and appends the result as a single segment.
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) {
        match args.as_str() {
            Some(s) => self.append(s),
            None => self.append(&args.to_string()),
        }
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn outdent(&mut self) {
        if self.indent == 0 {
            self.set_error(BufferError::OutdentUnderflow);
            return;
        }
        self.indent -= 1;
    }

    pub fn indent_level(&self) -> usize {
        self.indent
    }

    pub fn set_error(&mut self, error: BufferError) {
        self.error.get_or_insert(error);
    }

    pub fn error(&self) -> Option<BufferError> {
        self.error
    }

    /// Fails with the sticky error, if any.
    pub fn check(&self) -> Result<(), BufferError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

/// `emit!(buf, "fmt", args...)` appends one formatted segment.
macro_rules! emit {
    ($buf:expr, $($arg:tt)*) => {
        $buf.append_fmt(format_args!($($arg)*))
    };
}

pub(crate) use emit;
