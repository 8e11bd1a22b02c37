use crate::endianness::ByteOrder;
use crate::error::ImportError;
use crate::linktype::Linktype;
use crate::packet::{FrameRecord, FrameSink, Timestamp};
use crate::pcap::{LegacyPcapBlock, PcapHeader};
use crate::pcapng::*;
use crate::serialize::ToVec;
use log::debug;
use std::convert::TryFrom;
use std::io::Write;

/// Capture file format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FileFormat {
    /// Classic (legacy) pcap, microsecond resolution
    Pcap,
    /// pcapng, nanosecond resolution
    PcapNg,
}

impl Default for FileFormat {
    fn default() -> Self {
        FileFormat::PcapNg
    }
}

/// Metadata of a pcapng section, and name of its first interface
///
/// Ignored for classic pcap files, which have no place to store it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SectionInfo {
    pub comment: Option<String>,
    pub hardware: Option<String>,
    pub os: Option<String>,
    pub application: Option<String>,
    pub interface_name: Option<String>,
}

/// State kept for each interface of the capture
#[derive(Clone, Debug)]
pub struct InterfaceState {
    pub linktype: Linktype,
    pub snaplen: u32,
    pub packets_received: u64,
    pub first_timestamp: Option<Timestamp>,
    pub last_timestamp: Option<Timestamp>,
}

impl InterfaceState {
    fn new(linktype: Linktype, snaplen: u32) -> Self {
        InterfaceState {
            linktype,
            snaplen,
            packets_received: 0,
            first_timestamp: None,
            last_timestamp: None,
        }
    }
}

/// Streaming writer for pcap and pcapng files
///
/// The file header (pcap) or the section header and first interface (pcapng) are written by
/// [`CaptureWriter::open`]. Frames are then written as they come, and [`CaptureWriter::close`]
/// completes the file (pcapng interface statistics) and flushes the underlying writer.
///
/// All multi-byte fields are written in the configured [`ByteOrder`].
///
/// ## Example
///
/// ```rust
/// use text2pcap::*;
///
/// let mut writer = CaptureWriter::open(
///     Vec::new(),
///     FileFormat::Pcap,
///     ByteOrder::Little,
///     Linktype::RAW,
///     65535,
///     &SectionInfo::default(),
/// )
/// .expect("open");
/// let frame = FrameRecord {
///     data: vec![0x45, 0, 0, 20],
///     ..Default::default()
/// };
/// writer.write_frame(&frame).expect("write frame");
/// let bytes = writer.close().expect("close");
/// assert_eq!(bytes.len(), 24 + 16 + 4);
/// ```
pub struct CaptureWriter<W: Write> {
    writer: W,
    format: FileFormat,
    byte_order: ByteOrder,
    interfaces: Vec<InterfaceState>,
    bytes_written: u64,
    frames_written: u64,
}

impl<W: Write> CaptureWriter<W> {
    /// Create a writer, and write the headers of the file
    ///
    /// For pcapng, a section header is written with the options from `section`, followed by a
    /// first interface (id 0) with the given link type and snapshot length.
    pub fn open(
        writer: W,
        format: FileFormat,
        byte_order: ByteOrder,
        linktype: Linktype,
        snaplen: u32,
        section: &SectionInfo,
    ) -> Result<Self, ImportError> {
        let mut w = CaptureWriter {
            writer,
            format,
            byte_order,
            interfaces: Vec::new(),
            bytes_written: 0,
            frames_written: 0,
        };
        match format {
            FileFormat::Pcap => {
                let header = PcapHeader::new(linktype, snaplen);
                let v = header.to_vec_raw(byte_order)?;
                w.write_raw(&v)?;
                w.interfaces.push(InterfaceState::new(linktype, snaplen));
            }
            FileFormat::PcapNg => {
                w.write_section_header(section)?;
                w.write_interface(linktype, snaplen, section.interface_name.as_deref())?;
            }
        }
        Ok(w)
    }

    /// Write a pcapng Section Header Block
    pub fn write_section_header(&mut self, section: &SectionInfo) -> Result<(), ImportError> {
        if self.format != FileFormat::PcapNg {
            return Err(ImportError::InvalidConfig(
                "pcap files have no section header".to_string(),
            ));
        }
        let mut options = Vec::new();
        let fields = [
            (OptionCode::Comment, &section.comment),
            (OptionCode::ShbHardware, &section.hardware),
            (OptionCode::ShbOs, &section.os),
            (OptionCode::ShbUserAppl, &section.application),
        ];
        for (code, value) in fields.iter() {
            if let Some(s) = value {
                options.push(PcapNGOption::from_text(*code, s));
            }
        }
        let v = SectionHeaderBlock::new(options).to_vec(self.byte_order)?;
        self.write_raw(&v)
    }

    /// Add an interface and return its id
    ///
    /// Classic pcap files have exactly one interface, described by the file header.
    pub fn write_interface(
        &mut self,
        linktype: Linktype,
        snaplen: u32,
        name: Option<&str>,
    ) -> Result<u32, ImportError> {
        if self.format != FileFormat::PcapNg {
            return Err(ImportError::InvalidConfig(
                "pcap files have a single interface".to_string(),
            ));
        }
        let if_id = u32::try_from(self.interfaces.len())
            .map_err(|_| ImportError::InvalidConfig("too many interfaces".to_string()))?;
        let mut options = Vec::new();
        if let Some(name) = name {
            options.push(PcapNGOption::from_text(OptionCode::IfName, name));
        }
        let v = InterfaceDescriptionBlock::new(linktype, snaplen, options).to_vec(self.byte_order)?;
        self.write_raw(&v)?;
        self.interfaces.push(InterfaceState::new(linktype, snaplen));
        Ok(if_id)
    }

    /// Write one frame, truncated to the snapshot length of its interface
    pub fn write_frame(&mut self, frame: &FrameRecord) -> Result<(), ImportError> {
        let order = self.byte_order;
        let interface = self
            .interfaces
            .get(frame.interface_id as usize)
            .ok_or_else(|| {
                ImportError::InvalidConfig(format!("unknown interface id {}", frame.interface_id))
            })?;
        let snaplen = interface.snaplen;
        let v = match self.format {
            FileFormat::Pcap => {
                // pcap timestamps are unsigned 32-bit seconds
                let ts_sec = u32::try_from(frame.timestamp.secs.max(0)).unwrap_or(u32::MAX);
                let ts_usec = frame.timestamp.nsecs / 1000;
                LegacyPcapBlock::new(ts_sec, ts_usec, &frame.data, snaplen).to_vec(order)?
            }
            FileFormat::PcapNg => {
                let mut options = Vec::new();
                if let Some(flags) = frame.direction.epb_flags() {
                    options.push(PcapNGOption::from_u32(OptionCode::EpbFlags, flags, order));
                }
                if let Some(seqno) = frame.sequence_number {
                    options.push(PcapNGOption::from_u64(OptionCode::EpbPacketId, seqno, order));
                }
                let ts = frame.timestamp.as_nanos();
                EnhancedPacketBlock::new(frame.interface_id, ts, &frame.data, snaplen, options)
                    .to_vec(order)?
            }
        };
        self.write_raw(&v)?;
        debug!(
            "wrote frame: {} bytes, interface {}, ts {}.{:09}",
            frame.data.len(),
            frame.interface_id,
            frame.timestamp.secs,
            frame.timestamp.nsecs
        );
        self.frames_written += 1;
        if let Some(interface) = self.interfaces.get_mut(frame.interface_id as usize) {
            interface.packets_received += 1;
            if interface.first_timestamp.is_none() {
                interface.first_timestamp = Some(frame.timestamp);
            }
            interface.last_timestamp = Some(frame.timestamp);
        }
        Ok(())
    }

    /// Write a pcapng Interface Statistics Block for interface `if_id`, timestamped `ts`
    pub fn write_interface_statistics(
        &mut self,
        if_id: u32,
        ts: Timestamp,
    ) -> Result<(), ImportError> {
        if self.format != FileFormat::PcapNg {
            return Err(ImportError::InvalidConfig(
                "pcap files have no interface statistics".to_string(),
            ));
        }
        let order = self.byte_order;
        let interface = self
            .interfaces
            .get(if_id as usize)
            .ok_or_else(|| ImportError::InvalidConfig(format!("unknown interface id {}", if_id)))?;
        let mut options = Vec::new();
        if let Some(first) = interface.first_timestamp {
            options.push(PcapNGOption::from_timestamp(
                OptionCode::IsbStartTime,
                first.as_nanos(),
                order,
            ));
        }
        if let Some(last) = interface.last_timestamp {
            options.push(PcapNGOption::from_timestamp(
                OptionCode::IsbEndTime,
                last.as_nanos(),
                order,
            ));
        }
        options.push(PcapNGOption::from_u64(
            OptionCode::IsbIfRecv,
            interface.packets_received,
            order,
        ));
        let v = InterfaceStatisticsBlock::new(if_id, ts.as_nanos(), options).to_vec(order)?;
        self.write_raw(&v)
    }

    /// Complete the file, flush and return the underlying writer
    ///
    /// For pcapng, one Interface Statistics Block is written per interface.
    pub fn close(mut self) -> Result<W, ImportError> {
        if self.format == FileFormat::PcapNg {
            for if_id in 0..self.interfaces.len() {
                let ts = self.interfaces[if_id].last_timestamp.unwrap_or_default();
                self.write_interface_statistics(if_id as u32, ts)?;
            }
        }
        self.writer.flush().map_err(ImportError::Write)?;
        Ok(self.writer)
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn interfaces(&self) -> &[InterfaceState] {
        &self.interfaces
    }

    /// Total number of bytes written to the underlying writer
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), ImportError> {
        self.writer.write_all(data).map_err(ImportError::Write)?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }
}

impl<W: Write> FrameSink for CaptureWriter<W> {
    fn push_frame(&mut self, frame: FrameRecord) -> Result<(), ImportError> {
        self.write_frame(&frame)
    }
}
