//! Regular expression front end
//!
//! Each match of the import pattern is a packet. The pattern must have a named group `data`
//! holding the packet bytes, in the configured [`PlainEncoding`]. The optional groups `time`,
//! `dir` and `seqno` hold the timestamp, the direction and the sequence number of the packet.
//!
//! ```rust
//! use text2pcap::regex_import::RegexSource;
//! use text2pcap::{DirectionIndicators, PlainEncoding};
//!
//! let text = "> 0102\n< 0a0b0c\n";
//! let source = RegexSource::new(
//!     r"^(?P<dir>[<>]) (?P<data>[0-9a-f]+)$",
//!     text,
//!     PlainEncoding::Hex,
//!     DirectionIndicators { inbound: "<".to_string(), outbound: ">".to_string() },
//! )
//! .expect("valid pattern");
//! assert_eq!(source.matches().count(), 2);
//! ```

use crate::assembler::Assembler;
use crate::config::DirectionIndicators;
use crate::error::ImportError;
use crate::import::PacketSource;
use crate::packet::{Direction, FrameSink};
use crate::plain::{decode, DecodeStatus, PlainEncoding};
use log::{trace, warn};
use regex::{Regex, RegexBuilder};
use std::ops::Range;

/// Byte ranges of a match, and of its named groups
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchRecord {
    pub span: Range<usize>,
    pub data: Option<Range<usize>>,
    pub time: Option<Range<usize>>,
    pub dir: Option<Range<usize>>,
    pub seqno: Option<Range<usize>>,
}

/// Iterator over the matches of a pattern
///
/// Matches are searched lazily, and the iteration can be restarted.
#[derive(Clone, Debug)]
pub struct PatternMatches<'r, 't> {
    regex: &'r Regex,
    text: &'t str,
    pos: usize,
}

impl<'r, 't> PatternMatches<'r, 't> {
    pub fn new(regex: &'r Regex, text: &'t str) -> Self {
        PatternMatches {
            regex,
            text,
            pos: 0,
        }
    }

    /// Start again from the beginning of the text
    pub fn restart(&mut self) {
        self.pos = 0;
    }
}

impl<'r, 't> Iterator for PatternMatches<'r, 't> {
    type Item = MatchRecord;

    fn next(&mut self) -> Option<MatchRecord> {
        if self.pos > self.text.len() {
            return None;
        }
        let caps = self.regex.captures_at(self.text, self.pos)?;
        let span = caps.get(0)?.range();
        self.pos = if span.is_empty() {
            // step over the next character, so that empty matches do not repeat
            self.text[span.end..]
                .chars()
                .next()
                .map_or(self.text.len() + 1, |c| span.end + c.len_utf8())
        } else {
            span.end
        };
        let range = |name: &str| caps.name(name).map(|m| m.range());
        Some(MatchRecord {
            data: range("data"),
            time: range("time"),
            dir: range("dir"),
            seqno: range("seqno"),
            span,
        })
    }
}

/// Packets read from the matches of a pattern
pub struct RegexSource<'t> {
    regex: Regex,
    text: &'t str,
    encoding: PlainEncoding,
    indicators: DirectionIndicators,
}

impl<'t> RegexSource<'t> {
    /// Compile `pattern` in multi-line mode
    pub fn new(
        pattern: &str,
        text: &'t str,
        encoding: PlainEncoding,
        indicators: DirectionIndicators,
    ) -> Result<Self, ImportError> {
        let regex = RegexBuilder::new(pattern).multi_line(true).build()?;
        if !regex.capture_names().any(|name| name == Some("data")) {
            return Err(ImportError::MissingDataGroup);
        }
        Ok(RegexSource {
            regex,
            text,
            encoding,
            indicators,
        })
    }

    pub fn matches(&self) -> PatternMatches<'_, 't> {
        PatternMatches::new(&self.regex, self.text)
    }

    fn sequence_number(&self, range: Option<Range<usize>>) -> Option<u64> {
        let text = self.text[range?].trim();
        match text.parse::<u64>() {
            Ok(n) => Some(n),
            Err(e) => {
                warn!("invalid sequence number '{}': {}", text, e);
                None
            }
        }
    }

    // Decode the data of a packet, splitting it when the frame is full
    fn write_data<S: FrameSink + ?Sized>(
        &self,
        range: Range<usize>,
        asm: &mut Assembler,
        sink: &mut S,
    ) -> Result<(), ImportError> {
        let mut src = self.text[range.clone()].as_bytes();
        let mut position = range.start;
        let mut chunk = Vec::new();
        loop {
            if asm.remaining() == 0 {
                asm.flush(true, sink)?;
            }
            chunk.resize(asm.remaining(), 0);
            let outcome = decode(self.encoding, src, &mut chunk);
            asm.write_bytes(&chunk[..outcome.written], sink)?;
            match outcome.status {
                DecodeStatus::Complete => return Ok(()),
                DecodeStatus::DestinationFull => {
                    src = &src[outcome.consumed..];
                    position += outcome.consumed;
                    asm.flush(true, sink)?;
                }
                DecodeStatus::InvalidChar {
                    position: pos,
                    byte,
                } => {
                    asm.stats_mut().invalid_data_chars += 1;
                    warn!(
                        "invalid character {:?} at offset {}, rest of data ignored",
                        char::from(byte),
                        position + pos
                    );
                    return Ok(());
                }
            }
        }
    }
}

impl<'t> PacketSource for RegexSource<'t> {
    fn run<S: FrameSink + ?Sized>(
        &mut self,
        asm: &mut Assembler,
        sink: &mut S,
    ) -> Result<(), ImportError> {
        for record in self.matches() {
            trace!("match {:?}", record);
            let data = match record.data {
                Some(data) => data,
                None => {
                    asm.stats_mut().skipped_matches += 1;
                    warn!(
                        "match at {}..{} has no data, skipped",
                        record.span.start, record.span.end
                    );
                    continue;
                }
            };
            let time = record.time.map(|r| &self.text[r]);
            let direction = record
                .dir
                .map_or(Direction::Unknown, |r| self.indicators.parse(&self.text[r]));
            let seqno = self.sequence_number(record.seqno);
            asm.start_packet(time, direction, seqno);
            self.write_data(data, asm, sink)?;
            asm.flush(false, sink)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportOptions;
    use crate::packet::{FrameRecord, Timestamp};
    use crate::timestamp::TimestampZone;

    fn assembler(format: Option<&str>, max_frame_length: usize) -> Assembler {
        let mut options = ImportOptions::default();
        options.max_frame_length = max_frame_length;
        options.timestamp.start = Some(Timestamp::new(1000, 0));
        options.timestamp.format = format.map(str::to_string);
        options.timestamp.zone = TimestampZone::Utc;
        Assembler::new(&options).expect("assembler")
    }

    fn indicators() -> DirectionIndicators {
        DirectionIndicators {
            inbound: "<".to_string(),
            outbound: ">".to_string(),
        }
    }

    #[test]
    fn missing_data_group() {
        let r = RegexSource::new("(?P<time>.*)", "", PlainEncoding::Hex, indicators());
        assert!(matches!(r, Err(ImportError::MissingDataGroup)));
        let r = RegexSource::new("(?P<data>", "", PlainEncoding::Hex, indicators());
        assert!(matches!(r, Err(ImportError::InvalidPattern(_))));
    }

    #[test]
    fn match_records() {
        let text = "1 aa\nxx\n2 bb\n";
        let source =
            RegexSource::new(r"^(?P<seqno>\d) (?P<data>\w+)$", text, PlainEncoding::Hex, indicators())
                .expect("pattern");
        let mut matches = source.matches();
        let first = matches.next().expect("first match");
        assert_eq!(first.span, 0..4);
        assert_eq!(first.data, Some(2..4));
        assert_eq!(first.seqno, Some(0..1));
        assert_eq!(first.time, None);
        assert_eq!(matches.next().map(|m| m.data), Some(Some(10..12)));
        assert!(matches.next().is_none());
        matches.restart();
        assert_eq!(matches.count(), 2);
    }

    #[test]
    fn empty_matches_terminate() {
        let source =
            RegexSource::new(r"(?P<data>x*)", "ab", PlainEncoding::Hex, indicators()).expect("pattern");
        assert_eq!(source.matches().count(), 3);
    }

    #[test]
    fn import_matches() {
        let text = "> 2024-01-02 03:04:05 #7 0102\n\
                    < 2024-01-02 03:04:06 #x 0a0b0c\n\
                    ? 2024-01-02 03:04:07 #9 ffzz\n";
        let pattern =
            r"^(?P<dir>.) (?P<time>[0-9: -]+) #(?P<seqno>\w+) (?P<data>\w+)$";
        let mut source =
            RegexSource::new(pattern, text, PlainEncoding::Hex, indicators()).expect("pattern");
        let mut asm = assembler(Some("%Y-%m-%d %H:%M:%S"), 1000);
        let mut frames: Vec<FrameRecord> = Vec::new();
        source.run(&mut asm, &mut frames).expect("run");
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].data, vec![1, 2]);
        assert_eq!(frames[0].direction, Direction::Outbound);
        assert_eq!(frames[0].sequence_number, Some(7));
        assert_eq!(frames[0].timestamp, Timestamp::new(1_704_164_645, 0));
        assert_eq!(frames[1].data, vec![10, 11, 12]);
        assert_eq!(frames[1].direction, Direction::Inbound);
        assert_eq!(frames[1].sequence_number, None);
        assert_eq!(frames[2].data, vec![0xff]);
        assert_eq!(frames[2].direction, Direction::Unknown);
        let stats = asm.stats();
        assert_eq!(stats.invalid_data_chars, 1);
        assert_eq!(stats.timestamp_failures, 0);
        assert_eq!(stats.packets_read, 3);
    }

    #[test]
    fn long_data_is_split() {
        let text = "data: 000102030405060708090a0b0c0d0e0f1011\n";
        let mut source =
            RegexSource::new(r"data: (?P<data>\w+)", text, PlainEncoding::Hex, indicators())
                .expect("pattern");
        let mut asm = assembler(None, 8);
        let mut frames: Vec<FrameRecord> = Vec::new();
        source.run(&mut asm, &mut frames).expect("run");
        let lens: Vec<usize> = frames.iter().map(|f| f.data.len()).collect();
        assert_eq!(lens, vec![8, 8, 2]);
        assert_eq!(frames[2].data, vec![0x10, 0x11]);
        assert_eq!(asm.stats().packets_read, 1);
        assert_eq!(asm.stats().packets_written, 3);
    }

    #[test]
    fn base64_data() {
        let text = "AQIDBA==\n";
        let mut source =
            RegexSource::new(r"^(?P<data>[\w+/=]+)$", text, PlainEncoding::Base64, indicators())
                .expect("pattern");
        let mut asm = assembler(None, 1000);
        let mut frames: Vec<FrameRecord> = Vec::new();
        source.run(&mut asm, &mut frames).expect("run");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, vec![1, 2, 3, 4]);
    }
}
