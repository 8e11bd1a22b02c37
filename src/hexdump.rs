//! Hex dump front end
//!
//! Reads the output of `od -Ax -tx1 -v` (and similar dumps): each line starts with the offset
//! of its first byte in the packet, followed by the bytes as pairs of hex digits. An offset of
//! zero starts a new packet. Text between packets (the *preamble*) may hold the direction and
//! the timestamp of the next packet.
//!
//! ```text
//! I 10:10:24.123
//! 000000 00 0e b6 00 00 02 00 0e b6 00 00 01 08 00 45 00
//! 000010 00 28 00 00 00 00 ff 01 37 d1 c0 00 02 01 c0 00
//! ```

mod lexer;
mod parser;
mod reader;

pub use lexer::{lex_line, Line, Token, TokenKind, DIRECTIVE};
pub use parser::{HexdumpParser, ParseState, PREAMBLE_CAPACITY};
pub use reader::{LineReader, DEFAULT_CAPACITY};

use crate::assembler::Assembler;
use crate::config::ImportOptions;
use crate::error::ImportError;
use crate::import::PacketSource;
use crate::packet::FrameSink;
use std::io::Read;

/// Packets read from a hex dump
pub struct HexdumpSource<R>
where
    R: Read,
{
    reader: LineReader<R>,
    parser: HexdumpParser,
}

impl<R> HexdumpSource<R>
where
    R: Read,
{
    pub fn new(input: R, options: &ImportOptions) -> HexdumpSource<R> {
        HexdumpSource {
            reader: LineReader::new(DEFAULT_CAPACITY, input),
            parser: HexdumpParser::new(options.hexdump.clone(), options.direction.clone()),
        }
    }
}

impl<R> PacketSource for HexdumpSource<R>
where
    R: Read,
{
    fn run<S: FrameSink + ?Sized>(
        &mut self,
        asm: &mut Assembler,
        sink: &mut S,
    ) -> Result<(), ImportError> {
        while let Some((offset, line)) = self.reader.next()? {
            {
                let text = String::from_utf8_lossy(line);
                self.parser.parse_line(&text, asm, sink)?;
            }
            self.reader.consume(offset);
        }
        self.parser.finish(asm, sink)
    }
}
