use crate::config::{DummyHeader, DummyHeaderConfig};
use crate::error::ImportError;
use crate::linktype::Linktype;
use cookie_factory::bytes::{be_u16, be_u32, be_u8};
use cookie_factory::combinator::slice;
use cookie_factory::sequence::tuple;
use cookie_factory::SerializeFn;
use std::io::Write;
use std::net::IpAddr;

pub const ETHERNET_HEADER_LEN: usize = 14;
pub const ETHERNET_MIN_FRAME_LEN: usize = 60;
pub const IPV4_HEADER_LEN: usize = 20;
pub const IPV6_HEADER_LEN: usize = 40;
pub const UDP_HEADER_LEN: usize = 8;
pub const TCP_HEADER_LEN: usize = 20;
pub const SCTP_HEADER_LEN: usize = 12;
pub const SCTP_DATA_HEADER_LEN: usize = 16;

pub const ETHERTYPE_IPV4: u16 = 0x0800;
pub const ETHERTYPE_IPV6: u16 = 0x86DD;

pub const IPPROTO_TCP: u8 = 6;
pub const IPPROTO_UDP: u8 = 17;
pub const IPPROTO_SCTP: u8 = 132;

pub const TCP_FLAG_PSH: u8 = 0x08;
pub const TCP_FLAG_ACK: u8 = 0x10;
pub const TCP_WINDOW: u16 = 0x2000;

pub const SCTP_DATA_FLAG_END: u8 = 0x01;
pub const SCTP_DATA_FLAG_BEGIN: u8 = 0x02;

/// Export PDU tag carrying the protocol name
pub const EXP_PDU_TAG_PROTO_NAME: u16 = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transport {
    None,
    Udp,
    Tcp,
    Sctp,
}

/// Layers synthesized in front of each payload, outermost first
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderStack {
    pub ethernet: bool,
    pub ip: Option<IpVersion>,
    pub transport: Transport,
    pub data_chunk: bool,
    /// Length of the Export PDU tags, if enabled
    pub export_pdu: Option<usize>,
}

impl HeaderStack {
    /// Compute the layers implied by the configured header, and the link type of the output
    ///
    /// Ethernet is only added for the Ethernet link type. Raw IP link types take IP stacks
    /// directly. Export PDU tags force the upper PDU link type.
    pub fn resolve(
        config: &DummyHeaderConfig,
        linktype: Linktype,
    ) -> Result<(HeaderStack, Linktype), ImportError> {
        let version = match config.src_ip {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        };
        let mut stack = HeaderStack {
            ethernet: false,
            ip: None,
            transport: Transport::None,
            data_chunk: false,
            export_pdu: None,
        };
        let transport = match config.header {
            DummyHeader::None => return Ok((stack, linktype)),
            DummyHeader::Ethernet => {
                if linktype != Linktype::ETHERNET {
                    return Err(ImportError::InvalidConfig(format!(
                        "Ethernet header requires the Ethernet link type, not {}",
                        linktype
                    )));
                }
                stack.ethernet = true;
                return Ok((stack, linktype));
            }
            DummyHeader::ExportPdu => {
                if linktype != Linktype::ETHERNET && linktype != Linktype::WIRESHARK_UPPER_PDU {
                    return Err(ImportError::InvalidConfig(format!(
                        "Export PDU tags require the upper PDU link type, not {}",
                        linktype
                    )));
                }
                let name_len = config.export_pdu_protocol.len();
                if name_len == 0 || name_len > 0xfff0 {
                    return Err(ImportError::InvalidConfig(
                        "invalid Export PDU protocol name".to_string(),
                    ));
                }
                stack.export_pdu = Some(export_pdu_len(&config.export_pdu_protocol));
                return Ok((stack, Linktype::WIRESHARK_UPPER_PDU));
            }
            DummyHeader::Ip => Transport::None,
            DummyHeader::Udp => Transport::Udp,
            DummyHeader::Tcp => Transport::Tcp,
            DummyHeader::Sctp | DummyHeader::SctpData => Transport::Sctp,
        };
        let consistent = match (linktype, version) {
            (Linktype::ETHERNET, _) => {
                stack.ethernet = true;
                true
            }
            (Linktype::IPV4, IpVersion::V6) | (Linktype::IPV6, IpVersion::V4) => false,
            _ => linktype.is_raw_ip(),
        };
        if !consistent {
            return Err(ImportError::InvalidConfig(format!(
                "{:?} header is inconsistent with link type {}",
                config.header, linktype
            )));
        }
        stack.ip = Some(version);
        stack.transport = transport;
        stack.data_chunk = config.header == DummyHeader::SctpData;
        Ok((stack, linktype))
    }

    /// Length of the headers of the IP payload (transport and above)
    pub fn upper_len(&self) -> usize {
        let transport = match self.transport {
            Transport::None => 0,
            Transport::Udp => UDP_HEADER_LEN,
            Transport::Tcp => TCP_HEADER_LEN,
            Transport::Sctp => SCTP_HEADER_LEN,
        };
        let chunk = if self.data_chunk {
            // header and worst-case padding
            SCTP_DATA_HEADER_LEN + 3
        } else {
            0
        };
        transport + chunk + self.export_pdu.unwrap_or(0)
    }

    /// Worst-case length of all headers and padding added to a payload
    pub fn overhead(&self) -> usize {
        let ethernet = if self.ethernet { ETHERNET_HEADER_LEN } else { 0 };
        let ip = match self.ip {
            None => 0,
            Some(IpVersion::V4) => IPV4_HEADER_LEN,
            Some(IpVersion::V6) => IPV6_HEADER_LEN,
        };
        ethernet + ip + self.upper_len()
    }

    /// Largest payload that fits in a frame, given the IP length fields
    pub fn max_payload(&self, max_frame_length: usize) -> usize {
        let ip_limit = match self.ip {
            None => usize::MAX,
            Some(IpVersion::V4) => 0xFFFF - IPV4_HEADER_LEN - self.upper_len(),
            Some(IpVersion::V6) => 0xFFFF - self.upper_len(),
        };
        max_frame_length.min(ip_limit)
    }

    /// Snapshot length of the output interface
    pub fn snaplen(&self, max_frame_length: usize) -> u32 {
        let mut len = self.max_payload(max_frame_length) + self.overhead();
        if self.ethernet {
            len = len.max(ETHERNET_MIN_FRAME_LEN);
        }
        len as u32
    }
}

fn padded_name_len(name: &str) -> usize {
    (name.len() + 3) & !3
}

/// Length of the Export PDU tags for protocol `name`
pub fn export_pdu_len(name: &str) -> usize {
    4 + padded_name_len(name) + 4
}

pub fn ethernet_header<'a, W: Write + 'a>(
    dst: &'a [u8; 6],
    src: &'a [u8; 6],
    ethertype: u16,
) -> impl SerializeFn<W> + 'a {
    tuple((slice(dst), slice(src), be_u16(ethertype)))
}

/// IPv4 header, with a zero checksum
pub fn ipv4_header<'a, W: Write + 'a>(
    total_len: u16,
    id: u16,
    protocol: u8,
    src: &'a [u8; 4],
    dst: &'a [u8; 4],
) -> impl SerializeFn<W> + 'a {
    tuple((
        be_u8(0x45),
        be_u8(0),
        be_u16(total_len),
        be_u16(id),
        be_u16(0),
        be_u8(255),
        be_u8(protocol),
        be_u16(0),
        slice(src),
        slice(dst),
    ))
}

pub fn ipv6_header<'a, W: Write + 'a>(
    payload_len: u16,
    next_header: u8,
    src: &'a [u8; 16],
    dst: &'a [u8; 16],
) -> impl SerializeFn<W> + 'a {
    tuple((
        be_u32(0x6000_0000),
        be_u16(payload_len),
        be_u8(next_header),
        be_u8(255),
        slice(src),
        slice(dst),
    ))
}

/// UDP header, with a zero checksum
pub fn udp_header<W: Write>(src_port: u16, dst_port: u16, len: u16) -> impl SerializeFn<W> {
    tuple((be_u16(src_port), be_u16(dst_port), be_u16(len), be_u16(0)))
}

/// TCP header without options, with a zero checksum
pub fn tcp_header<W: Write>(
    src_port: u16,
    dst_port: u16,
    seq: u32,
    ack: u32,
    flags: u8,
) -> impl SerializeFn<W> {
    tuple((
        be_u16(src_port),
        be_u16(dst_port),
        be_u32(seq),
        be_u32(ack),
        be_u8(0x50),
        be_u8(flags),
        be_u16(TCP_WINDOW),
        be_u16(0),
        be_u16(0),
    ))
}

/// SCTP common header, with a zero checksum
pub fn sctp_header<W: Write>(src_port: u16, dst_port: u16, tag: u32) -> impl SerializeFn<W> {
    tuple((be_u16(src_port), be_u16(dst_port), be_u32(tag), be_u32(0)))
}

pub fn sctp_data_header<W: Write>(
    flags: u8,
    len: u16,
    tsn: u32,
    stream: u16,
    ssn: u16,
    ppid: u32,
) -> impl SerializeFn<W> {
    tuple((
        be_u8(0),
        be_u8(flags),
        be_u16(len),
        be_u32(tsn),
        be_u16(stream),
        be_u16(ssn),
        be_u32(ppid),
    ))
}

/// Export PDU tags: protocol name, then end of options
pub fn export_pdu_tags<'a, W: Write + 'a>(name: &'a str) -> impl SerializeFn<W> + 'a {
    let padded_len = padded_name_len(name);
    let padding = &[0u8, 0, 0][..padded_len - name.len()];
    tuple((
        be_u16(EXP_PDU_TAG_PROTO_NAME),
        be_u16(padded_len as u16),
        slice(name),
        slice(padding),
        be_u32(0),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cookie_factory::gen;
    use hex_literal::hex;

    fn config(header: DummyHeader) -> DummyHeaderConfig {
        DummyHeaderConfig {
            header,
            ..Default::default()
        }
    }

    #[test]
    fn resolve_stacks() {
        let (stack, linktype) =
            HeaderStack::resolve(&config(DummyHeader::SctpData), Linktype::ETHERNET)
                .expect("resolve");
        assert_eq!(linktype, Linktype::ETHERNET);
        assert!(stack.ethernet);
        assert_eq!(stack.ip, Some(IpVersion::V4));
        assert_eq!(stack.transport, Transport::Sctp);
        assert!(stack.data_chunk);
        assert_eq!(stack.overhead(), 14 + 20 + 12 + 16 + 3);

        let (stack, _) =
            HeaderStack::resolve(&config(DummyHeader::Tcp), Linktype::RAW).expect("resolve");
        assert!(!stack.ethernet);
        assert_eq!(stack.overhead(), 40);

        let (stack, linktype) =
            HeaderStack::resolve(&config(DummyHeader::ExportPdu), Linktype::ETHERNET)
                .expect("resolve");
        assert_eq!(linktype, Linktype::WIRESHARK_UPPER_PDU);
        assert_eq!(stack.export_pdu, Some(12));
        assert!(HeaderStack::resolve(&config(DummyHeader::ExportPdu), Linktype::RAW).is_err());
        assert!(HeaderStack::resolve(&config(DummyHeader::Ip), Linktype::NULL).is_err());
        assert!(HeaderStack::resolve(&config(DummyHeader::Udp), Linktype::IPV4).is_ok());
        assert!(HeaderStack::resolve(&config(DummyHeader::Udp), Linktype::IPV6).is_err());
    }

    #[test]
    fn payload_limits() {
        let (stack, _) =
            HeaderStack::resolve(&config(DummyHeader::Udp), Linktype::ETHERNET).expect("resolve");
        assert_eq!(stack.max_payload(1000), 1000);
        assert_eq!(stack.max_payload(262_144), 65535 - 20 - 8);
        assert_eq!(stack.snaplen(8), 60);
        assert_eq!(stack.snaplen(1000), 1000 + 42);
        let (stack, _) =
            HeaderStack::resolve(&config(DummyHeader::None), Linktype::ETHERNET).expect("resolve");
        assert_eq!(stack.max_payload(262_144), 262_144);
    }

    #[test]
    fn serialize_headers() {
        let mut v = Vec::new();
        gen(export_pdu_tags("sip"), &mut v).expect("gen");
        assert_eq!(v, hex!("00 0c 00 04 73 69 70 00 00 00 00 00"));

        let mut v = Vec::new();
        gen(tcp_header(1, 2, 3, 4, TCP_FLAG_PSH), &mut v).expect("gen");
        assert_eq!(
            v,
            hex!("00 01 00 02 00 00 00 03 00 00 00 04 50 08 20 00 00 00 00 00")
        );

        let mut v = Vec::new();
        gen(
            ipv4_header(20, 1, IPPROTO_UDP, &[10, 1, 1, 1], &[10, 2, 2, 2]),
            &mut v,
        )
        .expect("gen");
        assert_eq!(
            v,
            hex!("45 00 00 14 00 01 00 00 ff 11 00 00 0a 01 01 01 0a 02 02 02")
        );
    }
}
