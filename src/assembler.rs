//! Packet assembly
//!
//! The [`Assembler`] accumulates the payload of the current packet, and builds frames by
//! prepending the configured dummy headers, with their lengths and checksums.
//!
//! Packets longer than the maximum frame length are split: the first frames are
//! *continuations*, and the last one ends the packet. With SCTP DATA chunks, the beginning and
//! ending flags of the chunks follow this split.

mod checksum;
mod headers;

pub use checksum::{crc32c, internet_checksum, transport_checksum, transport_sum};
pub use headers::{HeaderStack, IpVersion, Transport};

use crate::config::{DummyHeaderConfig, ImportOptions};
use crate::error::ImportError;
use crate::import::ImportStats;
use crate::linktype::Linktype;
use crate::packet::{Direction, FrameRecord, FrameSink, Timestamp};
use crate::timestamp::{self, TimestampClock, TimestampParser};
use cookie_factory::gen;
use headers::*;
use log::debug;
use std::convert::TryFrom;
use std::net::IpAddr;

/// Counters persisting across packets
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssemblerState {
    /// Next TCP sequence number of inbound packets
    pub seq_in: u32,
    /// Next TCP sequence number of outbound (and unknown direction) packets
    pub seq_out: u32,
    /// Next SCTP DATA chunk TSN
    pub tsn: u32,
    /// Next SCTP DATA chunk stream sequence number
    pub ssn: u16,
    /// Next IPv4 identification
    pub ip_id: u16,
    /// The last frame was a continuation
    pub continuing: bool,
}

/// Builds frames from payload bytes
pub struct Assembler {
    config: DummyHeaderConfig,
    stack: HeaderStack,
    linktype: Linktype,
    max_payload: usize,
    snaplen: u32,
    state: AssemblerState,
    clock: TimestampClock,
    stats: ImportStats,
    payload: Vec<u8>,

    in_packet: bool,
    timestamp: Timestamp,
    needs_tick: bool,
    direction: Direction,
    sequence_number: Option<u64>,
    /// Bytes of the current packet already flushed
    flushed: usize,
}

impl Assembler {
    pub fn new(options: &ImportOptions) -> Result<Self, ImportError> {
        options.validate()?;
        let (stack, linktype) = HeaderStack::resolve(&options.headers, options.linktype)?;
        let start = options.timestamp.start.unwrap_or_else(timestamp::now);
        let parser = match &options.timestamp.format {
            Some(format) => Some(TimestampParser::new(format, options.timestamp.zone, start)?),
            None => None,
        };
        let clock = TimestampClock::new(parser, start, options.timestamp.tick_nsec);
        let max_payload = stack.max_payload(options.max_frame_length);
        let snaplen = stack.snaplen(options.max_frame_length);
        debug!(
            "header stack {:?}, linktype {}, max payload {}",
            stack, linktype, max_payload
        );
        Ok(Assembler {
            config: options.headers.clone(),
            stack,
            linktype,
            max_payload,
            snaplen,
            state: AssemblerState::default(),
            clock,
            stats: ImportStats::default(),
            payload: Vec::with_capacity(max_payload),
            in_packet: false,
            timestamp: start,
            needs_tick: false,
            direction: Direction::Unknown,
            sequence_number: None,
            flushed: 0,
        })
    }

    /// Link type of the frames
    pub fn linktype(&self) -> Linktype {
        self.linktype
    }

    /// Largest frame built
    pub fn snaplen(&self) -> u32 {
        self.snaplen
    }

    pub fn state(&self) -> &AssemblerState {
        &self.state
    }

    /// Run counters
    pub fn stats(&self) -> ImportStats {
        ImportStats {
            timestamp_failures: self.clock.failures(),
            ..self.stats
        }
    }

    pub(crate) fn stats_mut(&mut self) -> &mut ImportStats {
        &mut self.stats
    }

    /// True between the start of a packet and its last frame
    pub fn in_packet(&self) -> bool {
        self.in_packet
    }

    /// Start a new packet. Pending bytes must have been flushed.
    ///
    /// `time` is the text holding the packet timestamp, if any.
    pub fn start_packet(
        &mut self,
        time: Option<&str>,
        direction: Direction,
        sequence_number: Option<u64>,
    ) {
        self.timestamp = self.clock.next(time);
        self.needs_tick = false;
        self.direction = direction;
        self.sequence_number = sequence_number;
        self.flushed = 0;
        self.in_packet = true;
        self.state.continuing = false;
        self.stats.packets_read += 1;
    }

    /// Offset of the next byte in the current packet
    pub fn packet_offset(&self) -> usize {
        self.flushed + self.payload.len()
    }

    /// Room left in the current frame
    pub fn remaining(&self) -> usize {
        self.max_payload.saturating_sub(self.payload.len())
    }

    /// Bytes waiting to be flushed
    pub fn pending(&self) -> &[u8] {
        &self.payload
    }

    pub fn write_byte<S: FrameSink + ?Sized>(
        &mut self,
        byte: u8,
        sink: &mut S,
    ) -> Result<(), ImportError> {
        if !self.in_packet {
            self.start_packet(None, Direction::Unknown, None);
        }
        if self.payload.len() >= self.max_payload {
            self.flush(true, sink)?;
        }
        self.payload.push(byte);
        Ok(())
    }

    pub fn write_bytes<S: FrameSink + ?Sized>(
        &mut self,
        mut bytes: &[u8],
        sink: &mut S,
    ) -> Result<(), ImportError> {
        if !self.in_packet {
            self.start_packet(None, Direction::Unknown, None);
        }
        while !bytes.is_empty() {
            if self.remaining() == 0 {
                self.flush(true, sink)?;
            }
            let n = self.remaining().min(bytes.len());
            self.payload.extend_from_slice(&bytes[..n]);
            bytes = &bytes[n..];
        }
        Ok(())
    }

    /// Remove up to `count` pending bytes, and return the number of bytes removed
    pub fn unwrite(&mut self, count: usize) -> usize {
        let count = count.min(self.payload.len());
        self.payload.truncate(self.payload.len() - count);
        count
    }

    /// Build a frame from the pending bytes, and push it to `sink`
    ///
    /// A continuation frame leaves the packet open: following bytes belong to the same packet.
    /// Nothing is emitted if there are no pending bytes.
    pub fn flush<S: FrameSink + ?Sized>(
        &mut self,
        continuation: bool,
        sink: &mut S,
    ) -> Result<(), ImportError> {
        if self.payload.is_empty() {
            if !continuation {
                self.in_packet = false;
            }
            return Ok(());
        }
        let timestamp = if self.needs_tick {
            self.clock.tick()
        } else {
            self.timestamp
        };
        let data = self.build_frame(continuation)?;
        debug!(
            "frame: {} bytes ({} payload){}",
            data.len(),
            self.payload.len(),
            if continuation { ", continued" } else { "" }
        );
        self.stats.packets_written += 1;
        self.stats.bytes_written += data.len() as u64;
        sink.push_frame(FrameRecord {
            timestamp,
            data,
            interface_id: 0,
            direction: self.direction,
            sequence_number: self.sequence_number,
        })?;
        self.flushed += self.payload.len();
        self.payload.clear();
        self.state.continuing = continuation;
        if continuation {
            self.needs_tick = true;
        } else {
            self.in_packet = false;
        }
        Ok(())
    }

    fn build_frame(&mut self, continuation: bool) -> Result<Vec<u8>, ImportError> {
        let payload_len = self.payload.len();
        let cfg = &self.config;
        let stack = &self.stack;

        let (src_mac, dst_mac, src_ip, dst_ip, src_port, dst_port) =
            if self.direction == Direction::Inbound {
                (
                    cfg.dst_mac,
                    cfg.src_mac,
                    cfg.dst_ip,
                    cfg.src_ip,
                    cfg.dst_port,
                    cfg.src_port,
                )
            } else {
                (
                    cfg.src_mac,
                    cfg.dst_mac,
                    cfg.src_ip,
                    cfg.dst_ip,
                    cfg.src_port,
                    cfg.dst_port,
                )
            };

        // lengths, inner to outer
        let body_len = stack.export_pdu.unwrap_or(0) + payload_len;
        let chunk_pad = if stack.data_chunk {
            (4 - body_len % 4) % 4
        } else {
            0
        };
        let chunk_len = if stack.data_chunk {
            SCTP_DATA_HEADER_LEN + body_len
        } else {
            0
        };
        let segment_len = match stack.transport {
            Transport::None => body_len,
            Transport::Udp => UDP_HEADER_LEN + body_len,
            Transport::Tcp => TCP_HEADER_LEN + body_len,
            Transport::Sctp if stack.data_chunk => SCTP_HEADER_LEN + chunk_len + chunk_pad,
            Transport::Sctp => SCTP_HEADER_LEN + body_len,
        };
        let protocol = match stack.transport {
            Transport::None => cfg.ip_protocol,
            Transport::Udp => IPPROTO_UDP,
            Transport::Tcp => IPPROTO_TCP,
            Transport::Sctp => IPPROTO_SCTP,
        };

        let mut frame = Vec::with_capacity(payload_len + stack.overhead() + ETHERNET_MIN_FRAME_LEN);

        if stack.ethernet {
            let ethertype = match stack.ip {
                Some(IpVersion::V4) => ETHERTYPE_IPV4,
                Some(IpVersion::V6) => ETHERTYPE_IPV6,
                None => cfg.ethertype,
            };
            gen(ethernet_header(&dst_mac, &src_mac, ethertype), &mut frame)?;
        }

        match stack.ip {
            Some(IpVersion::V4) => {
                let ip_start = frame.len();
                let total_len = len16(IPV4_HEADER_LEN + segment_len)?;
                gen(
                    ipv4_header(
                        total_len,
                        self.state.ip_id,
                        protocol,
                        &ipv4_octets(&src_ip),
                        &ipv4_octets(&dst_ip),
                    ),
                    &mut frame,
                )?;
                self.state.ip_id = self.state.ip_id.wrapping_add(1);
                let c = internet_checksum(&frame[ip_start..]);
                frame[ip_start + 10..ip_start + 12].copy_from_slice(&c.to_be_bytes());
            }
            Some(IpVersion::V6) => {
                gen(
                    ipv6_header(
                        len16(segment_len)?,
                        protocol,
                        &checksum::ipv6_octets(&src_ip),
                        &checksum::ipv6_octets(&dst_ip),
                    ),
                    &mut frame,
                )?;
            }
            None => (),
        }

        let l4_start = frame.len();
        match stack.transport {
            Transport::None => (),
            Transport::Udp => {
                gen(udp_header(src_port, dst_port, len16(segment_len)?), &mut frame)?;
            }
            Transport::Tcp => {
                let (seq, ack, flags) = match self.direction {
                    Direction::Inbound => (
                        self.state.seq_in,
                        self.state.seq_out,
                        TCP_FLAG_PSH | TCP_FLAG_ACK,
                    ),
                    Direction::Outbound => (
                        self.state.seq_out,
                        self.state.seq_in,
                        TCP_FLAG_PSH | TCP_FLAG_ACK,
                    ),
                    Direction::Unknown => (self.state.seq_out, 0, TCP_FLAG_PSH),
                };
                gen(tcp_header(src_port, dst_port, seq, ack, flags), &mut frame)?;
                let counter = if self.direction == Direction::Inbound {
                    &mut self.state.seq_in
                } else {
                    &mut self.state.seq_out
                };
                *counter = counter.wrapping_add(body_len as u32);
            }
            Transport::Sctp => {
                gen(sctp_header(src_port, dst_port, cfg.sctp_tag), &mut frame)?;
                if stack.data_chunk {
                    let mut flags = 0;
                    if !self.state.continuing {
                        flags |= SCTP_DATA_FLAG_BEGIN;
                    }
                    if !continuation {
                        flags |= SCTP_DATA_FLAG_END;
                    }
                    gen(
                        sctp_data_header(
                            flags,
                            len16(chunk_len)?,
                            self.state.tsn,
                            cfg.sctp_stream,
                            self.state.ssn,
                            cfg.sctp_ppid,
                        ),
                        &mut frame,
                    )?;
                    self.state.tsn = self.state.tsn.wrapping_add(1);
                    if !continuation {
                        self.state.ssn = self.state.ssn.wrapping_add(1);
                    }
                }
            }
        }

        if stack.export_pdu.is_some() {
            gen(export_pdu_tags(&cfg.export_pdu_protocol), &mut frame)?;
        }
        frame.extend_from_slice(&self.payload);
        frame.resize(frame.len() + chunk_pad, 0);

        match stack.transport {
            Transport::Udp | Transport::Tcp => {
                let offset = if stack.transport == Transport::Udp {
                    6
                } else {
                    16
                };
                let c = transport_checksum(&src_ip, &dst_ip, protocol, &frame[l4_start..]);
                frame[l4_start + offset..l4_start + offset + 2].copy_from_slice(&c.to_be_bytes());
            }
            Transport::Sctp => {
                // the CRC is stored in network order of its reflected bits
                let c = crc32c(&frame[l4_start..]);
                frame[l4_start + 8..l4_start + 12].copy_from_slice(&c.to_le_bytes());
            }
            Transport::None => (),
        }

        if stack.ethernet && frame.len() < ETHERNET_MIN_FRAME_LEN {
            frame.resize(ETHERNET_MIN_FRAME_LEN, 0);
        }
        Ok(frame)
    }
}

fn len16(len: usize) -> Result<u16, ImportError> {
    u16::try_from(len)
        .map_err(|_| ImportError::Serialize(format!("length {} overflows a 16-bit field", len)))
}

fn ipv4_octets(addr: &IpAddr) -> [u8; 4] {
    match addr {
        IpAddr::V4(a) => a.octets(),
        IpAddr::V6(a) => a.to_ipv4().map(|a| a.octets()).unwrap_or_default(),
    }
}
