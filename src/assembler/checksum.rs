//! Checksums of synthesized headers
//!
//! The Internet checksum (RFC 1071) covers IPv4 headers and, with a pseudo-header, UDP and TCP
//! segments. SCTP uses CRC32C (RFC 9260, appendix A).

use crc::{Crc, CRC_32_ISCSI};
use std::net::IpAddr;

// Add `data` as big-endian 16-bit words. An odd trailing byte is padded with zero.
fn sum_words(data: &[u8], mut sum: u64) -> u64 {
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u64::from(u16::from_be_bytes([chunk[0], chunk[1]]));
    }
    if let Some(&byte) = chunks.remainder().first() {
        sum += u64::from(byte) << 8;
    }
    sum
}

// Fold a sum to 16 bits, with end-around carry
fn fold(mut sum: u64) -> u16 {
    while (sum >> 16) != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    sum as u16
}

/// Internet checksum of `data`
pub fn internet_checksum(data: &[u8]) -> u16 {
    !fold(sum_words(data, 0))
}

/// One's complement sum of the pseudo-header and `segment`
///
/// The pseudo-header has the IPv4 form (RFC 768) or the IPv6 form (RFC 8200), depending on the
/// addresses. For a segment with a valid checksum, the result is `0xFFFF`.
pub fn transport_sum(src: &IpAddr, dst: &IpAddr, protocol: u8, segment: &[u8]) -> u16 {
    let mut sum = match (src, dst) {
        (IpAddr::V4(src), IpAddr::V4(dst)) => {
            let sum = sum_words(&src.octets(), 0);
            sum_words(&dst.octets(), sum)
        }
        (src, dst) => {
            let sum = sum_words(&ipv6_octets(src), 0);
            sum_words(&ipv6_octets(dst), sum)
        }
    };
    let len = segment.len() as u64;
    sum += (len >> 16) + (len & 0xFFFF);
    sum += u64::from(protocol);
    fold(sum_words(segment, sum))
}

pub(crate) fn ipv6_octets(addr: &IpAddr) -> [u8; 16] {
    match addr {
        IpAddr::V4(a) => a.to_ipv6_mapped().octets(),
        IpAddr::V6(a) => a.octets(),
    }
}

/// UDP or TCP checksum of `segment` (with a zero checksum field)
///
/// A computed value of 0 is transmitted as `0xFFFF`, since 0 means "no checksum" for UDP.
pub fn transport_checksum(src: &IpAddr, dst: &IpAddr, protocol: u8, segment: &[u8]) -> u16 {
    match !transport_sum(src, dst, protocol, segment) {
        // RFC 768: all ones, the one's complement form of zero
        0 => 0xFFFF,
        c => c,
    }
}

const CASTAGNOLI: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

/// CRC32C (Castagnoli) of `data`
pub fn crc32c(data: &[u8]) -> u32 {
    CASTAGNOLI.checksum(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn internet_checksum_empty() {
        assert_eq!(internet_checksum(&[]), 0xFFFF);
    }

    #[test]
    fn internet_checksum_ipv4_header() {
        // header with checksum field zeroed
        let mut hdr = [
            0x45, 0x00, 0x00, 0x73, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0x00, 0x00, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ];
        let c = internet_checksum(&hdr);
        assert_eq!(c, 0xb861);
        hdr[10..12].copy_from_slice(&c.to_be_bytes());
        assert_eq!(internet_checksum(&hdr), 0);
    }

    #[test]
    fn transport_checksum_verifies() {
        let src = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1));
        let dst = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 2));
        let mut segment = vec![0x00, 0x35, 0x00, 0x35, 0x00, 0x0b, 0x00, 0x00, 1, 2, 3];
        let c = transport_checksum(&src, &dst, 17, &segment);
        segment[6..8].copy_from_slice(&c.to_be_bytes());
        assert_eq!(transport_sum(&src, &dst, 17, &segment), 0xFFFF);

        let src = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1));
        let dst = IpAddr::V6(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 2));
        let mut segment = vec![0u8; 29];
        segment[20..].copy_from_slice(b"123456789");
        let c = transport_checksum(&src, &dst, 6, &segment);
        segment[16..18].copy_from_slice(&c.to_be_bytes());
        assert_eq!(transport_sum(&src, &dst, 6, &segment), 0xFFFF);
    }

    #[test]
    fn transport_checksum_zero() {
        let src = IpAddr::V4(Ipv4Addr::new(10, 1, 1, 1));
        let dst = IpAddr::V4(Ipv4Addr::new(10, 2, 2, 2));
        // the last word makes the sum all ones, so the computed checksum is 0
        let mut segment = vec![0x04, 0xd2, 0x10, 0xe1, 0x00, 0x0a, 0x00, 0x00, 0x00, 0x00];
        let sum = transport_sum(&src, &dst, 17, &segment);
        segment[8..10].copy_from_slice(&(!sum).to_be_bytes());
        assert_eq!(transport_sum(&src, &dst, 17, &segment), 0xFFFF);
        assert_eq!(transport_checksum(&src, &dst, 17, &segment), 0xFFFF);
    }

    #[test]
    fn crc32c_check_value() {
        assert_eq!(crc32c(b"123456789"), 0xE306_9283);
        assert_eq!(crc32c(&[0u8; 32]), 0x8A91_36AA);
    }
}
