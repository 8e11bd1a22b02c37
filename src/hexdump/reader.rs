use crate::error::ImportError;
use circular::Buffer;
use std::io::Read;

/// Default capacity of the line buffer
pub const DEFAULT_CAPACITY: usize = 65536;

/// Streaming reader of text lines
///
/// Lines are returned without their end-of-line byte. A line longer than the buffer makes it
/// grow. The final line does not need to be terminated.
///
/// ```rust
/// use text2pcap::hexdump::LineReader;
///
/// let mut reader = LineReader::new(16, &b"first\nsecond"[..]);
/// let mut lines = Vec::new();
/// while let Some((offset, line)) = reader.next().expect("read") {
///     lines.push(line.to_vec());
///     reader.consume(offset);
/// }
/// assert_eq!(lines, vec![b"first".to_vec(), b"second".to_vec()]);
/// ```
pub struct LineReader<R>
where
    R: Read,
{
    reader: R,
    buffer: Buffer,
    reader_exhausted: bool,
}

impl<R> LineReader<R>
where
    R: Read,
{
    /// Creates a new `LineReader<R>` with the provided buffer capacity.
    pub fn new(capacity: usize, reader: R) -> LineReader<R> {
        Self::from_buffer(Buffer::with_capacity(capacity.max(1)), reader)
    }

    /// Creates a new `LineReader<R>` using the provided `Buffer`.
    pub fn from_buffer(buffer: Buffer, reader: R) -> LineReader<R> {
        LineReader {
            reader,
            buffer,
            reader_exhausted: false,
        }
    }

    /// Get the next line, and the number of bytes to consume after using it
    ///
    /// Returns `None` at the end of input.
    pub fn next(&mut self) -> Result<Option<(usize, &[u8])>, ImportError> {
        let (offset, end) = loop {
            let data = self.buffer.data();
            if let Some(pos) = data.iter().position(|&b| b == b'\n') {
                break (pos + 1, pos);
            }
            if self.reader_exhausted {
                if data.is_empty() {
                    return Ok(None);
                }
                break (data.len(), data.len());
            }
            if self.buffer.available_space() == 0 && self.buffer.position() == 0 {
                let capacity = self.buffer.capacity();
                self.grow(capacity * 2);
            }
            self.refill()?;
        };
        Ok(Some((offset, &self.buffer.data()[..end])))
    }

    /// Consume `offset` bytes of the buffer
    pub fn consume(&mut self, offset: usize) {
        self.buffer.consume(offset);
    }

    fn refill(&mut self) -> Result<(), ImportError> {
        self.buffer.shift();
        let space = self.buffer.space();
        // check if available space is empty, so we can distinguish
        // a read() returning 0 because of EOF or because we requested 0
        if space.is_empty() {
            return Ok(());
        }
        let sz = self.reader.read(space)?;
        self.reader_exhausted = sz == 0;
        self.buffer.fill(sz);
        Ok(())
    }

    fn grow(&mut self, new_size: usize) -> bool {
        self.buffer.grow(new_size)
    }
}
