//! Import runs
//!
//! A [`PacketSource`] drives an [`Assembler`], which pushes frames to a [`FrameSink`].
//! [`import`] connects a source to a [`CaptureWriter`] for a whole run.

use crate::assembler::Assembler;
use crate::config::ImportOptions;
use crate::error::ImportError;
use crate::hexdump::HexdumpSource;
use crate::packet::FrameSink;
use crate::regex_import::RegexSource;
use crate::writer::CaptureWriter;
use log::info;
use std::io::{Read, Write};

/// Counters of an import run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImportStats {
    /// Packets found in the input
    pub packets_read: u64,
    /// Frames written, including continuation frames
    pub packets_written: u64,
    /// Bytes of the written frames, with headers
    pub bytes_written: u64,
    /// Offsets larger than expected, abandoning a packet
    pub inconsistent_offsets: u64,
    /// Offsets smaller than expected, removing bytes
    pub offset_rewinds: u64,
    /// Byte runs identified as ASCII dumps, and removed
    pub ascii_rollbacks: u64,
    pub timestamp_failures: u64,
    pub invalid_data_chars: u64,
    /// Pattern matches without data
    pub skipped_matches: u64,
}

/// Front end producing packets
pub trait PacketSource {
    /// Read the whole input, and push the frames to `sink`
    ///
    /// The last packet is flushed before returning.
    fn run<S: FrameSink + ?Sized>(
        &mut self,
        asm: &mut Assembler,
        sink: &mut S,
    ) -> Result<(), ImportError>;
}

/// Import all packets of `source` into a capture file written to `output`
pub fn import<P, W>(
    source: &mut P,
    output: W,
    options: &ImportOptions,
) -> Result<ImportStats, ImportError>
where
    P: PacketSource,
    W: Write,
{
    let mut asm = Assembler::new(options)?;
    let mut writer = CaptureWriter::open(
        output,
        options.format,
        options.byte_order,
        asm.linktype(),
        asm.snaplen(),
        &options.section,
    )?;
    source.run(&mut asm, &mut writer)?;
    let bytes = writer.bytes_written();
    writer.close()?;
    let stats = asm.stats();
    info!(
        "{} packets read, {} frames ({} bytes) written, file size {} bytes",
        stats.packets_read, stats.packets_written, stats.bytes_written, bytes
    );
    if stats.inconsistent_offsets + stats.invalid_data_chars + stats.skipped_matches > 0 {
        info!(
            "{} inconsistent offsets, {} invalid data characters, {} skipped matches",
            stats.inconsistent_offsets, stats.invalid_data_chars, stats.skipped_matches
        );
    }
    Ok(stats)
}

/// Import a hex dump
///
/// ```rust
/// use text2pcap::{import_hexdump, FileFormat, ImportOptions};
///
/// let input = "0000 01 02 03\n0003 04\n";
/// let options = ImportOptions {
///     format: FileFormat::Pcap,
///     ..Default::default()
/// };
/// let mut output = Vec::new();
/// let stats = import_hexdump(input.as_bytes(), &mut output, &options).expect("import");
/// assert_eq!(stats.packets_written, 1);
/// assert_eq!(output.len(), 24 + 16 + 4);
/// ```
pub fn import_hexdump<R, W>(
    input: R,
    output: W,
    options: &ImportOptions,
) -> Result<ImportStats, ImportError>
where
    R: Read,
    W: Write,
{
    let mut source = HexdumpSource::new(input, options);
    import(&mut source, output, options)
}

/// Import the matches of `pattern` in `text`
///
/// Without direction indicators in `options`, the default ones are used for the `dir` group.
pub fn import_regex<W>(
    text: &str,
    pattern: &str,
    output: W,
    options: &ImportOptions,
) -> Result<ImportStats, ImportError>
where
    W: Write,
{
    let mut source = RegexSource::new(
        pattern,
        text,
        options.encoding,
        options.direction.clone().unwrap_or_default(),
    )?;
    import(&mut source, output, options)
}
