use hex_literal::hex;
use std::io::{self, Read};
use std::net::IpAddr;
use text2pcap::assembler::transport_sum;
use text2pcap::*;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// 2023-11-14T22:13:20Z
const START: Timestamp = Timestamp::new(1_700_000_000, 0);

fn options(format: FileFormat) -> ImportOptions {
    let mut options = ImportOptions {
        format,
        byte_order: ByteOrder::Little,
        ..Default::default()
    };
    options.timestamp.start = Some(START);
    options.timestamp.zone = TimestampZone::Utc;
    options
}

fn le32(v: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([v[offset], v[offset + 1], v[offset + 2], v[offset + 3]])
}

/// Walk pcapng blocks, returning (block type, block bytes)
fn blocks(v: &[u8]) -> Vec<(u32, &[u8])> {
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < v.len() {
        let len = le32(v, i + 4) as usize;
        assert_eq!(le32(v, i + len - 4) as usize, len, "trailing block length");
        blocks.push((le32(v, i), &v[i..i + len]));
        i += len;
    }
    blocks
}

const HEXDUMP: &str = "\
# packet 1
000000 00 0e b6 00 00 02 00 0e b6 00 00 01 08 00 45 00
000010 00 28 00 00 00 00 ff 01 37 d1 c0 00 02 01 c0 00
000020 02 02 08 00 a6 2f 00 01 00 01 48 65 6c 6c 6f 20
000030 57 6f 72 6c 64 21

000000 01 02 03 04 05 06 07 08 09 0a
000000 ff
";

#[test]
fn hexdump_to_pcap() {
    init_logger();
    let mut output = Vec::new();
    let stats =
        import_hexdump(HEXDUMP.as_bytes(), &mut output, &options(FileFormat::Pcap)).expect("import");
    assert_eq!(stats.packets_read, 3);
    assert_eq!(stats.packets_written, 3);
    assert_eq!(stats.bytes_written, 54 + 10 + 1);
    assert_eq!(output.len(), 24 + (16 + 54) + (16 + 10) + (16 + 1));
    // header: magic, version 2.4, linktype Ethernet
    assert_eq!(&output[..8], &hex!("d4 c3 b2 a1 02 00 04 00"));
    assert_eq!(le32(&output, 20), 1);
    // first record: caplen and origlen, then data
    assert_eq!(le32(&output, 24 + 8), 54);
    assert_eq!(le32(&output, 24 + 12), 54);
    assert_eq!(&output[40..46], &hex!("00 0e b6 00 00 02"));
    // packets without timestamps are spaced by one tick
    assert_eq!(le32(&output, 24), START.secs as u32);
    assert_eq!(le32(&output, 24 + 16 + 54 + 4), 1);
}

#[test]
fn hexdump_to_pcapng_with_ethernet_header() {
    init_logger();
    let mut opts = options(FileFormat::PcapNg);
    opts.headers.header = DummyHeader::Ethernet;
    let mut output = Vec::new();
    let stats = import_hexdump(&b"0000 de ad be ef\n"[..], &mut output, &opts).expect("import");
    assert_eq!(stats.packets_written, 1);
    // SHB, IDB (tsresol), EPB with a 60 byte frame, ISB (starttime, endtime, ifrecv)
    assert_eq!(output.len(), 28 + 32 + (32 + 60) + 64);
    let blocks = blocks(&output);
    let types: Vec<u32> = blocks.iter().map(|(t, _)| *t).collect();
    assert_eq!(types, vec![0x0a0d_0d0a, 1, 6, 5]);

    let shb = blocks[0].1;
    assert_eq!(&shb[8..16], &hex!("4d 3c 2b 1a 01 00 00 00"));
    let idb = blocks[1].1;
    assert_eq!(&idb[8..10], &[1, 0]);
    assert_eq!(&idb[16..24], &hex!("09 00 01 00 09 00 00 00"));

    let epb = blocks[2].1;
    assert_eq!(le32(epb, 20), 60);
    assert_eq!(le32(epb, 24), 60);
    let ts = (u64::from(le32(epb, 12)) << 32) | u64::from(le32(epb, 16));
    assert_eq!(ts, 1_700_000_000_000_000_000);
    let data = &epb[28..88];
    assert_eq!(
        &data[..18],
        &hex!("0a 02 02 02 02 02 0a 01 01 01 01 01 08 00 de ad be ef")
    );
    assert!(data[18..].iter().all(|&b| b == 0));

    let isb = blocks[3].1;
    // isb_ifrecv
    assert_eq!(&isb[44..56], &hex!("04 00 08 00 01 00 00 00 00 00 00 00"));
}

#[test]
fn hexdump_timestamps_and_directions() {
    init_logger();
    let mut opts = options(FileFormat::PcapNg);
    opts.timestamp.format = Some("%H:%M:%S.%f".to_string());
    opts.direction = Some(DirectionIndicators::default());
    let input = "\
I 10:00:00.5
0000 01 02
O 10:00:01.25
0000 03 04
no time here
0000 05
";
    let mut output = Vec::new();
    let stats = import_hexdump(input.as_bytes(), &mut output, &opts).expect("import");
    assert_eq!(stats.packets_written, 3);
    assert_eq!(stats.timestamp_failures, 1);

    let epbs: Vec<&[u8]> = blocks(&output)
        .into_iter()
        .filter(|(t, _)| *t == 6)
        .map(|(_, b)| b)
        .collect();
    assert_eq!(epbs.len(), 3);
    let ts = |epb: &[u8]| (u64::from(le32(epb, 12)) << 32) | u64::from(le32(epb, 16));
    // 2023-11-14T10:00:00.5Z
    assert_eq!(ts(epbs[0]), 1_699_956_000_500_000_000);
    assert_eq!(ts(epbs[1]), 1_699_956_001_250_000_000);
    assert_eq!(ts(epbs[2]), 1_699_956_001_250_001_000);
    // epb_flags: inbound, outbound, then none
    assert_eq!(&epbs[0][32..40], &hex!("02 00 04 00 01 00 00 00"));
    assert_eq!(&epbs[1][32..40], &hex!("02 00 04 00 02 00 00 00"));
    assert_eq!(epbs[2].len(), 32 + 4);
}

#[test]
fn hexdump_time_without_direction() {
    init_logger();
    let mut opts = options(FileFormat::PcapNg);
    opts.timestamp.format = Some("%H:%M:%S".to_string());
    opts.direction = Some(DirectionIndicators::default());
    let input = "10:00:00\n0000 01\nI 10:00:02\n0000 02\n";
    let mut output = Vec::new();
    let stats = import_hexdump(input.as_bytes(), &mut output, &opts).expect("import");
    assert_eq!(stats.packets_written, 2);
    assert_eq!(stats.timestamp_failures, 0);

    let epbs: Vec<&[u8]> = blocks(&output)
        .into_iter()
        .filter(|(t, _)| *t == 6)
        .map(|(_, b)| b)
        .collect();
    let ts = |epb: &[u8]| (u64::from(le32(epb, 12)) << 32) | u64::from(le32(epb, 16));
    // 2023-11-14T10:00:00Z
    assert_eq!(ts(epbs[0]), 1_699_956_000_000_000_000);
    assert_eq!(epbs[0].len(), 32 + 4);
    assert_eq!(ts(epbs[1]), 1_699_956_002_000_000_000);
    assert_eq!(&epbs[1][32..40], &hex!("02 00 04 00 01 00 00 00"));
}

#[test]
fn hexdump_frames_are_split() {
    init_logger();
    let mut opts = options(FileFormat::Pcap);
    opts.max_frame_length = 8;
    let input = "0000 00 01 02 03 04 05 06 07 08 09\n000a 0a 0b 0c 0d 0e 0f 10 11 12 13\n";
    let mut output = Vec::new();
    let stats = import_hexdump(input.as_bytes(), &mut output, &opts).expect("import");
    assert_eq!(stats.packets_read, 1);
    assert_eq!(stats.packets_written, 3);
    assert_eq!(output.len(), 24 + (16 + 8) * 2 + 16 + 4);
}

#[test]
fn hexdump_inconsistent_offsets() {
    init_logger();
    let mut output = Vec::new();
    let input = "00000000 AA BB\n00000005 CC\n00000000 DD\n";
    let stats =
        import_hexdump(input.as_bytes(), &mut output, &options(FileFormat::Pcap)).expect("import");
    assert_eq!(stats.inconsistent_offsets, 1);
    assert_eq!(stats.packets_written, 2);
    assert_eq!(output.len(), 24 + (16 + 2) + (16 + 1));
}

#[test]
fn hexdump_invalid_offset_is_fatal() {
    let mut opts = options(FileFormat::Pcap);
    opts.hexdump.offset_type = OffsetType::Decimal;
    let mut output = Vec::new();
    let r = import_hexdump(&b"0000 01\n\n00ff 02\n"[..], &mut output, &opts);
    match r {
        Err(ImportError::InvalidNumericLiteral { token, line }) => {
            assert_eq!(token, "00ff");
            assert_eq!(line, 3);
        }
        r => panic!("unexpected result {:?}", r),
    }
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "broken input"))
    }
}

#[test]
fn read_errors_are_reported() {
    let mut output = Vec::new();
    let r = import_hexdump(FailingReader, &mut output, &options(FileFormat::Pcap));
    assert!(matches!(r, Err(ImportError::Read(_))));
}

#[test]
fn regex_to_pcapng() {
    init_logger();
    let mut opts = options(FileFormat::PcapNg);
    opts.timestamp.format = Some("ISO".to_string());
    opts.direction = Some(DirectionIndicators {
        inbound: "<".to_string(),
        outbound: ">".to_string(),
    });
    let text = "\
2023-11-14T10:00:00Z > [12] 0102030405
garbage line
2023-11-14T10:00:01.5Z < [13] 0a0b
";
    let pattern = r"^(?P<time>\S+) (?P<dir>[<>]) \[(?P<seqno>\d+)\] (?P<data>[0-9a-f]+)$";
    let mut output = Vec::new();
    let stats = import_regex(text, pattern, &mut output, &opts).expect("import");
    assert_eq!(stats.packets_read, 2);
    assert_eq!(stats.packets_written, 2);

    let epbs: Vec<&[u8]> = blocks(&output)
        .into_iter()
        .filter(|(t, _)| *t == 6)
        .map(|(_, b)| b)
        .collect();
    assert_eq!(epbs.len(), 2);
    assert_eq!(le32(epbs[0], 20), 5);
    assert_eq!(&epbs[0][28..33], &hex!("01 02 03 04 05"));
    // data padded to 8, then epb_flags (outbound) and epb_packetid 12
    assert_eq!(&epbs[0][36..44], &hex!("02 00 04 00 02 00 00 00"));
    assert_eq!(&epbs[0][44..56], &hex!("05 00 08 00 0c 00 00 00 00 00 00 00"));
    assert_eq!(&epbs[1][32..40], &hex!("02 00 04 00 01 00 00 00"));
    assert_eq!(&epbs[1][40..52], &hex!("05 00 08 00 0d 00 00 00 00 00 00 00"));
}

#[test]
fn regex_with_udp_headers() {
    init_logger();
    let mut opts = options(FileFormat::Pcap);
    opts.linktype = Linktype::RAW;
    opts.headers.header = DummyHeader::Udp;
    let text = "payload: 48656c6c6f\n";
    let mut output = Vec::new();
    let stats = import_regex(text, r"payload: (?P<data>\w+)", &mut output, &opts).expect("import");
    assert_eq!(stats.packets_written, 1);
    // raw IPv4: 20 + 8 + 5
    assert_eq!(le32(&output, 20), 101);
    assert_eq!(le32(&output, 24 + 8), 33);
    let packet = &output[40..];
    assert_eq!(packet[0], 0x45);
    assert_eq!(&packet[2..4], &[0, 33]);
    assert_eq!(packet[9], 17);
    let src = IpAddr::from([10, 1, 1, 1]);
    let dst = IpAddr::from([10, 2, 2, 2]);
    assert_eq!(transport_sum(&src, &dst, 17, &packet[20..]), 0xFFFF);
    assert_eq!(&packet[28..], b"Hello");
}

#[test]
fn regex_base64_fills_frame() {
    init_logger();
    let mut opts = options(FileFormat::Pcap);
    opts.max_frame_length = 8;
    opts.encoding = PlainEncoding::Base64;
    let text = "AAECAwQFBgc=\nAAECAwQFBgcI\n";
    let mut output = Vec::new();
    let stats = import_regex(text, r"(?P<data>\S+)", &mut output, &opts).expect("import");
    assert_eq!(stats.packets_read, 2);
    // 8 bytes fit, 9 bytes are split on a 3-byte unit boundary
    assert_eq!(stats.packets_written, 3);
    assert_eq!(output.len(), 24 + (16 + 8) + (16 + 6) + (16 + 3));
    assert_eq!(le32(&output, 24 + 8), 8);
    assert_eq!(&output[40..48], &hex!("00 01 02 03 04 05 06 07"));
    assert_eq!(le32(&output, 48 + 8), 6);
    assert_eq!(le32(&output, 70 + 8), 3);
    assert_eq!(&output[86..], &hex!("06 07 08"));
}

#[test]
fn regex_skips_matches_without_data() {
    init_logger();
    let text = "a: 01\nb: \nc: 02\n";
    let pattern = r"(?m)^\w: (?:(?P<data>[0-9a-f]+))?$";
    let mut output = Vec::new();
    let stats =
        import_regex(text, pattern, &mut output, &options(FileFormat::Pcap)).expect("import");
    assert_eq!(stats.skipped_matches, 1);
    assert_eq!(stats.packets_written, 2);
}
