use crate::endianness::ByteOrder;
use crate::error::ImportError;
use crate::linktype::Linktype;
use crate::packet::{Direction, Timestamp};
use crate::plain::PlainEncoding;
use crate::timestamp::{TimestampZone, DEFAULT_TICK_NSEC};
use crate::writer::{FileFormat, SectionInfo};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Default maximum length of a frame payload
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 262_144;

/// Smallest accepted maximum frame length
pub const MIN_FRAME_LENGTH: usize = 8;

/// Characters of the preamble (or of the `dir` group) marking packet direction
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectionIndicators {
    pub inbound: String,
    pub outbound: String,
}

impl Default for DirectionIndicators {
    fn default() -> Self {
        DirectionIndicators {
            inbound: "iI".to_string(),
            outbound: "oO".to_string(),
        }
    }
}

impl DirectionIndicators {
    pub fn direction_of(&self, c: char) -> Direction {
        if self.inbound.contains(c) {
            Direction::Inbound
        } else if self.outbound.contains(c) {
            Direction::Outbound
        } else {
            Direction::Unknown
        }
    }

    /// Direction from the first character of `text`
    pub fn parse(&self, text: &str) -> Direction {
        text.chars()
            .next()
            .map_or(Direction::Unknown, |c| self.direction_of(c))
    }
}

/// Radix of hex dump offsets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OffsetType {
    /// No offsets: the whole input is a single packet
    None,
    Hex,
    Octal,
    Decimal,
}

impl Default for OffsetType {
    fn default() -> Self {
        OffsetType::Hex
    }
}

impl OffsetType {
    pub fn radix(self) -> Option<u32> {
        match self {
            OffsetType::None => None,
            OffsetType::Hex => Some(16),
            OffsetType::Octal => Some(8),
            OffsetType::Decimal => Some(10),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HexdumpOptions {
    pub offset_type: OffsetType,
    /// Detect and discard bytes that are part of an ASCII dump at the end of lines
    pub identify_ascii: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimestampOptions {
    /// `strftime`-like format, or `"ISO"`. Without format, timestamps are not parsed.
    pub format: Option<String>,
    /// Interval added to the previous timestamp when none can be parsed
    pub tick_nsec: u64,
    pub zone: TimestampZone,
    /// Start time of the run. Defaults to the current time.
    pub start: Option<Timestamp>,
}

impl Default for TimestampOptions {
    fn default() -> Self {
        TimestampOptions {
            format: None,
            tick_nsec: DEFAULT_TICK_NSEC,
            zone: TimestampZone::default(),
            start: None,
        }
    }
}

/// Outermost synthesized protocol layer. Each layer implies the layers beneath it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DummyHeader {
    None,
    Ethernet,
    Ip,
    Udp,
    Tcp,
    Sctp,
    SctpData,
    ExportPdu,
}

impl Default for DummyHeader {
    fn default() -> Self {
        DummyHeader::None
    }
}

/// Dummy headers, and values of their fields
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DummyHeaderConfig {
    pub header: DummyHeader,
    /// Ethernet type of a bare Ethernet header. Set from the IP version when IP is added.
    pub ethertype: u16,
    pub src_mac: [u8; 6],
    pub dst_mac: [u8; 6],
    /// Protocol number of a bare IP header
    pub ip_protocol: u8,
    /// Source and destination address, both of the same version
    pub src_ip: IpAddr,
    pub dst_ip: IpAddr,
    pub src_port: u16,
    pub dst_port: u16,
    pub sctp_tag: u32,
    pub sctp_ppid: u32,
    pub sctp_stream: u16,
    /// Protocol name of the Export PDU tag
    pub export_pdu_protocol: String,
}

impl Default for DummyHeaderConfig {
    fn default() -> Self {
        DummyHeaderConfig {
            header: DummyHeader::None,
            ethertype: 0x0800,
            src_mac: [0x0a, 0x01, 0x01, 0x01, 0x01, 0x01],
            dst_mac: [0x0a, 0x02, 0x02, 0x02, 0x02, 0x02],
            ip_protocol: 253,
            src_ip: IpAddr::V4(Ipv4Addr::new(10, 1, 1, 1)),
            dst_ip: IpAddr::V4(Ipv4Addr::new(10, 2, 2, 2)),
            src_port: 1234,
            dst_port: 4321,
            sctp_tag: 0,
            sctp_ppid: 0,
            sctp_stream: 0,
            export_pdu_protocol: "data".to_string(),
        }
    }
}

impl DummyHeaderConfig {
    /// Default addresses, for IPv6
    pub fn default_ipv6() -> Self {
        DummyHeaderConfig {
            src_ip: IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1)),
            dst_ip: IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 2)),
            ..Default::default()
        }
    }
}

/// Options of an import run
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ImportOptions {
    pub format: FileFormat,
    pub byte_order: ByteOrder,
    /// Link type of the output. Dummy headers must be consistent with it.
    pub linktype: Linktype,
    /// Maximum payload length of a frame. Longer packets are split.
    pub max_frame_length: usize,
    pub timestamp: TimestampOptions,
    /// Parse direction indicators. Hex dumps only use them when set; import patterns use the
    /// defaults when unset.
    pub direction: Option<DirectionIndicators>,
    pub hexdump: HexdumpOptions,
    pub headers: DummyHeaderConfig,
    /// Encoding of the `data` group of import patterns
    pub encoding: PlainEncoding,
    pub section: SectionInfo,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions {
            format: FileFormat::default(),
            byte_order: ByteOrder::native(),
            linktype: Linktype::ETHERNET,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            timestamp: TimestampOptions::default(),
            direction: None,
            hexdump: HexdumpOptions::default(),
            headers: DummyHeaderConfig::default(),
            encoding: PlainEncoding::default(),
            section: SectionInfo::default(),
        }
    }
}

impl ImportOptions {
    /// Check the consistency of options
    pub fn validate(&self) -> Result<(), ImportError> {
        if self.max_frame_length < MIN_FRAME_LENGTH
            || self.max_frame_length > DEFAULT_MAX_FRAME_LENGTH
        {
            return Err(ImportError::InvalidConfig(format!(
                "maximum frame length must be between {} and {}",
                MIN_FRAME_LENGTH, DEFAULT_MAX_FRAME_LENGTH
            )));
        }
        if self.headers.src_ip.is_ipv4() != self.headers.dst_ip.is_ipv4() {
            return Err(ImportError::InvalidConfig(
                "source and destination addresses must have the same IP version".to_string(),
            ));
        }
        if let Some(indicators) = &self.direction {
            if indicators.inbound.chars().any(|c| indicators.outbound.contains(c)) {
                return Err(ImportError::InvalidConfig(
                    "inbound and outbound indicators overlap".to_string(),
                ));
            }
        }
        crate::assembler::HeaderStack::resolve(&self.headers, self.linktype).map(|_| ())
    }
}
