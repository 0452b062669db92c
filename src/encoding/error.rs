/// A bound buffer could not be decoded at the position a read required.
///
/// Raised lazily: binding bytes to a record never validates them, so a corrupt
/// region surfaces only when a field stored there is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    Truncated {
        offset: usize,
        needed: usize,
        len: usize,
    },
    InvalidOffset {
        at: usize,
        target: i64,
    },
    InvalidUtf8 {
        offset: usize,
    },
}

impl std::fmt::Display for BufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BufferError::Truncated {
                offset,
                needed,
                len,
            } => write!(
                f,
                "corrupt buffer: read of {} bytes at offset {} exceeds buffer length {}",
                needed, offset, len
            ),
            BufferError::InvalidOffset { at, target } => write!(
                f,
                "corrupt buffer: offset stored at {} points outside the buffer ({})",
                at, target
            ),
            BufferError::InvalidUtf8 { offset } => {
                write!(f, "corrupt buffer: string at offset {} is not valid UTF-8", offset)
            }
        }
    }
}

impl std::error::Error for BufferError {}
