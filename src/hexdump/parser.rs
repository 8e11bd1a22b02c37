use super::lexer::{lex_line, Line, Token, TokenKind};
use crate::assembler::Assembler;
use crate::config::{DirectionIndicators, HexdumpOptions};
use crate::error::ImportError;
use crate::packet::{Direction, FrameSink};
use log::{debug, trace, warn};
use std::num::IntErrorKind;

/// Maximum length of the text kept between packets
pub const PREAMBLE_CAPACITY: usize = 2048;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseState {
    Init,
    StartOfLine,
    ReadOffset,
    ReadByte,
    ReadText,
}

/// Free text seen since the last packet start
#[derive(Debug, Default)]
struct Preamble {
    text: String,
}

impl Preamble {
    // Tokens not fitting are dropped
    fn push(&mut self, token: &str) {
        let sep = if self.text.is_empty() { 0 } else { 1 };
        if self.text.len() + sep + token.len() > PREAMBLE_CAPACITY {
            return;
        }
        if sep != 0 {
            self.text.push(' ');
        }
        self.text.push_str(token);
    }

    // Split into direction and timestamp text
    fn split(&self, indicators: Option<&DirectionIndicators>) -> (Direction, Option<&str>) {
        let mut text = self.text.trim_start();
        let mut direction = Direction::Unknown;
        if let Some(indicators) = indicators {
            if let Some(c) = text.chars().next() {
                direction = indicators.direction_of(c);
                if direction != Direction::Unknown {
                    text = text[c.len_utf8()..].trim_start();
                }
            }
        }
        let time = if text.is_empty() { None } else { Some(text) };
        (direction, time)
    }
}

/// State machine turning hex dump lines into packets
pub struct HexdumpParser {
    options: HexdumpOptions,
    indicators: Option<DirectionIndicators>,
    state: ParseState,
    preamble: Preamble,
    line_number: usize,
    /// Position in the line and value of the bytes written from the current line
    line_bytes: Vec<(usize, u8)>,
}

impl HexdumpParser {
    pub fn new(options: HexdumpOptions, indicators: Option<DirectionIndicators>) -> Self {
        HexdumpParser {
            options,
            indicators,
            state: ParseState::Init,
            preamble: Preamble::default(),
            line_number: 0,
            line_bytes: Vec::new(),
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Process one line of input, without its end-of-line
    pub fn parse_line<S: FrameSink + ?Sized>(
        &mut self,
        line: &str,
        asm: &mut Assembler,
        sink: &mut S,
    ) -> Result<(), ImportError> {
        self.line_number += 1;
        let tokens = match lex_line(line) {
            Line::Comment => return Ok(()),
            Line::Directive(text) => {
                debug!("line {}: ignoring directive '{}'", self.line_number, text);
                return Ok(());
            }
            Line::Tokens(tokens) => tokens,
        };
        for token in &tokens {
            match token.kind {
                TokenKind::Offset => self.on_offset(line, token, asm, sink)?,
                TokenKind::Byte(b) => self.on_byte(line, token, b, asm, sink)?,
                TokenKind::Text => self.on_text(line, token, asm),
            }
        }
        self.on_eol(line, asm);
        Ok(())
    }

    /// Flush the last packet
    pub fn finish<S: FrameSink + ?Sized>(
        &mut self,
        asm: &mut Assembler,
        sink: &mut S,
    ) -> Result<(), ImportError> {
        asm.flush(false, sink)?;
        self.state = ParseState::Init;
        Ok(())
    }

    fn start_packet<S: FrameSink + ?Sized>(
        &mut self,
        asm: &mut Assembler,
        sink: &mut S,
    ) -> Result<(), ImportError> {
        asm.flush(false, sink)?;
        let (direction, time) = self.preamble.split(self.indicators.as_ref());
        trace!("line {}: new packet, preamble {:?}", self.line_number, time);
        asm.start_packet(time, direction, None);
        self.preamble.text.clear();
        Ok(())
    }

    fn on_offset<S: FrameSink + ?Sized>(
        &mut self,
        line: &str,
        token: &Token,
        asm: &mut Assembler,
        sink: &mut S,
    ) -> Result<(), ImportError> {
        let radix = match self.options.offset_type.radix() {
            Some(radix) => radix,
            None => {
                self.on_text(line, token, asm);
                return Ok(());
            }
        };
        match self.state {
            ParseState::Init | ParseState::StartOfLine => (),
            ParseState::ReadByte => {
                self.identify_ascii(line, asm);
                self.state = ParseState::ReadText;
                return Ok(());
            }
            ParseState::ReadOffset => {
                self.state = ParseState::ReadText;
                return Ok(());
            }
            ParseState::ReadText => return Ok(()),
        }
        let offset = match usize::from_str_radix(token.text, radix) {
            Ok(offset) => offset,
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => usize::MAX,
            Err(_) => {
                return Err(ImportError::InvalidNumericLiteral {
                    token: token.text.to_string(),
                    line: self.line_number,
                })
            }
        };
        if offset == 0 {
            self.start_packet(asm, sink)?;
            self.state = ParseState::ReadOffset;
            return Ok(());
        }
        // an abandoned packet waits for the next zero offset
        if self.state == ParseState::Init || !asm.in_packet() {
            self.preamble.push(token.text);
            return Ok(());
        }
        let expected = asm.packet_offset();
        if offset < expected {
            let removed = asm.unwrite(expected - offset);
            debug!(
                "line {}: offset {:#x} rewinds {} bytes",
                self.line_number, offset, removed
            );
            asm.stats_mut().offset_rewinds += 1;
        } else if offset > expected {
            warn!(
                "line {}: inconsistent offset {:#x}, expected {:#x}: packet abandoned",
                self.line_number, offset, expected
            );
            asm.stats_mut().inconsistent_offsets += 1;
            asm.flush(false, sink)?;
            self.state = ParseState::Init;
            return Ok(());
        }
        self.state = ParseState::ReadOffset;
        Ok(())
    }

    fn on_byte<S: FrameSink + ?Sized>(
        &mut self,
        line: &str,
        token: &Token,
        byte: u8,
        asm: &mut Assembler,
        sink: &mut S,
    ) -> Result<(), ImportError> {
        match self.state {
            ParseState::Init | ParseState::StartOfLine => {
                if self.options.offset_type.radix().is_some() {
                    self.on_text(line, token, asm);
                    return Ok(());
                }
                // without offsets, the whole input is one packet
                if !asm.in_packet() {
                    self.start_packet(asm, sink)?;
                }
            }
            ParseState::ReadOffset | ParseState::ReadByte => (),
            ParseState::ReadText => return Ok(()),
        }
        asm.write_byte(byte, sink)?;
        self.line_bytes.push((token.start, byte));
        self.state = ParseState::ReadByte;
        Ok(())
    }

    fn on_text(&mut self, line: &str, token: &Token, asm: &mut Assembler) {
        match self.state {
            ParseState::Init | ParseState::StartOfLine => self.preamble.push(token.text),
            ParseState::ReadOffset => self.state = ParseState::ReadText,
            ParseState::ReadByte => {
                self.identify_ascii(line, asm);
                self.state = ParseState::ReadText;
            }
            ParseState::ReadText => (),
        }
    }

    fn on_eol(&mut self, line: &str, asm: &mut Assembler) {
        if self.state == ParseState::ReadByte {
            self.identify_ascii(line, asm);
        }
        self.line_bytes.clear();
        self.state = ParseState::StartOfLine;
    }

    // Bytes at the end of the run are the ASCII dump of the previous bytes of the line, if
    // the rendering of the previous bytes starts with the text of the last bytes.
    // Tails are tried from the longest down, so that when several tails match, the whole dump
    // is removed and not only its last characters.
    fn identify_ascii(&mut self, line: &str, asm: &mut Assembler) {
        if !self.options.identify_ascii || self.line_bytes.is_empty() {
            return;
        }
        let n = self.line_bytes.len();
        for k in (1..n).rev() {
            let tail = line[self.line_bytes[n - k].0..].trim_end();
            let rendered: String = self.line_bytes[..n - k]
                .iter()
                .map(|&(_, b)| printable(b))
                .collect();
            if rendered.starts_with(tail) {
                let removed = asm.unwrite(k);
                debug!(
                    "line {}: {} bytes are an ASCII dump",
                    self.line_number, removed
                );
                asm.stats_mut().ascii_rollbacks += 1;
                self.line_bytes.truncate(n - k);
                return;
            }
        }
    }
}

fn printable(b: u8) -> char {
    if (0x20..0x7f).contains(&b) {
        b as char
    } else {
        '.'
    }
}
