//! PCAP file format
//!
//! See <https://wiki.wireshark.org/Development/LibpcapFileFormat> for details.
//!
//! A classic pcap file is a 24-byte global header followed by records, each made of a 16-byte
//! record header and the raw packet bytes. There are no options and no padding.

use crate::linktype::Linktype;

/// Magic number of microsecond-resolution pcap files
pub const PCAP_MAGIC: u32 = 0xa1b2_c3d4;

/// Size of the global header
pub const PCAP_HEADER_LEN: usize = 24;

/// Size of a record header
pub const PCAP_RECORD_HEADER_LEN: usize = 16;

/// PCAP global header
#[derive(Clone, Debug)]
pub struct PcapHeader {
    /// File format and byte ordering. Written in the byte order of the file, so that readers
    /// finding `0xd4c3b2a1` know all following fields have to be swapped.
    pub magic_number: u32,
    /// Version major number (currently 2)
    pub version_major: u16,
    /// Version minor number (currently 4)
    pub version_minor: u16,
    /// The correction time in seconds between GMT (UTC) and the local timezone of the following packet header timestamps
    pub thiszone: i32,
    /// In theory, the accuracy of time stamps in the capture; in practice, all tools set it to 0
    pub sigfigs: u32,
    /// max len of captured packets, in octets
    pub snaplen: u32,
    /// Data link type
    pub network: Linktype,
}

impl PcapHeader {
    pub fn new(network: Linktype, snaplen: u32) -> PcapHeader {
        PcapHeader {
            magic_number: PCAP_MAGIC,
            version_major: 2,
            version_minor: 4,
            thiszone: 0,
            sigfigs: 0,
            snaplen,
            network,
        }
    }

    pub const fn size(&self) -> usize {
        PCAP_HEADER_LEN
    }
}

impl Default for PcapHeader {
    fn default() -> Self {
        PcapHeader::new(Linktype::ETHERNET, 0)
    }
}

/// A record of a legacy Pcap file: record header and packet data
#[derive(Debug)]
pub struct LegacyPcapBlock<'a> {
    pub ts_sec: u32,
    pub ts_usec: u32,
    pub caplen: u32,
    pub origlen: u32,
    pub data: &'a [u8],
}

impl<'a> LegacyPcapBlock<'a> {
    /// Build a record, truncating data to `snaplen`
    pub fn new(ts_sec: u32, ts_usec: u32, data: &'a [u8], snaplen: u32) -> LegacyPcapBlock<'a> {
        let origlen = data.len() as u32;
        let caplen = origlen.min(snaplen);
        LegacyPcapBlock {
            ts_sec,
            ts_usec,
            caplen,
            origlen,
            data: &data[..caplen as usize],
        }
    }

    /// Size of the serialized record
    pub fn size(&self) -> usize {
        PCAP_RECORD_HEADER_LEN + self.data.len()
    }
}
