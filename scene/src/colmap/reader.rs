use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use crate::error::{ParseError, ParseErrorKind, Table};

/// Little-endian reader that keeps track of where it is, so failures can name the table,
/// record and byte offset.
pub(crate) struct BinReader<R> {
    inner: R,
    table: Table,
    record: Option<u64>,
    offset: u64,
}

pub(crate) type ReadResult<T> = std::result::Result<T, ParseError>;

macro_rules! read_le {
    ($name:ident, $ty:ty, $read:ident) => {
        pub async fn $name(&mut self) -> ReadResult<$ty> {
            let value = self.inner.$read().await.map_err(|e| self.io_error(e))?;
            self.offset += size_of::<$ty>() as u64;
            Ok(value)
        }
    };
}

impl<R: AsyncBufRead + Unpin> BinReader<R> {
    pub fn new(inner: R, table: Table) -> Self {
        Self {
            inner,
            table,
            record: None,
            offset: 0,
        }
    }

    /// Attribute subsequent failures to record `index`.
    pub fn begin_record(&mut self, index: u64) {
        self.record = Some(index);
    }

    read_le!(u8, u8, read_u8);
    read_le!(u32, u32, read_u32_le);
    read_le!(i32, i32, read_i32_le);
    read_le!(u64, u64, read_u64_le);
    read_le!(f64, f64, read_f64_le);

    /// Skips `len` bytes, failing if the input ends first.
    pub async fn skip(&mut self, len: u64) -> ReadResult<()> {
        let mut limited = (&mut self.inner).take(len);
        let skipped = io::copy(&mut limited, &mut io::sink())
            .await
            .map_err(|e| self.io_error(e))?;
        self.offset += skipped;
        if skipped < len {
            return Err(self.error(ParseErrorKind::Truncated));
        }
        Ok(())
    }

    /// Reads a NUL terminated UTF-8 string, consuming the terminator.
    pub async fn c_string(&mut self) -> ReadResult<String> {
        let start = self.offset;
        let mut bytes = Vec::new();
        let read = self
            .inner
            .read_until(b'\0', &mut bytes)
            .await
            .map_err(|e| self.io_error(e))?;
        self.offset += read as u64;

        if bytes.pop() != Some(b'\0') {
            return Err(self.error(ParseErrorKind::Truncated));
        }
        match std::str::from_utf8(&bytes) {
            Ok(name) => Ok(name.to_owned()),
            Err(e) => {
                self.offset = start;
                Err(self.error(ParseErrorKind::InvalidName(e)))
            }
        }
    }

    fn io_error(&self, e: io::Error) -> ParseError {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => self.error(ParseErrorKind::Truncated),
            _ => self.error(ParseErrorKind::Io(e)),
        }
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError {
            table: self.table,
            record: self.record,
            offset: self.offset,
            kind,
        }
    }
}
