//! # Text to PCAP and PCAPNG converter
//!
//! This crate converts textual descriptions of packets into capture files, in the classic
//! pcap or in the pcapng format.
//!
//! Two front ends read the input:
//!
//! - [hex dumps](hexdump), as printed by `od -Ax -tx1 -v` and many other tools: each line holds
//!   an offset followed by bytes in hex, and an offset of zero starts a new packet;
//! - [import patterns](regex_import): any text matched by a regular expression with a named
//!   group `data` (and optionally `time`, `dir` and `seqno`).
//!
//! Packets can be wrapped into dummy Ethernet, IPv4/IPv6, UDP, TCP, SCTP (with or without
//! DATA chunk) or Export PDU headers, with correct lengths and checksums. See
//! [`DummyHeaderConfig`].
//!
//! # Example: hex dump to pcapng
//!
//! ```rust
//! use text2pcap::*;
//!
//! let input = "\
//! 000000 00 0e b6 00 00 02 00 0e b6 00 00 01 08 00 45 00
//! 000010 00 28 00 00 00 00 ff 01 37 d1 c0 00 02 01 c0 00
//! 000020 02 02 08 00 a6 2f 00 01 00 01 48 65 6c 6c 6f 20
//! 000030 57 6f 72 6c 64 21
//! ";
//! let options = ImportOptions {
//!     byte_order: ByteOrder::Little,
//!     ..Default::default()
//! };
//! let mut output = Vec::new();
//! let stats = import_hexdump(input.as_bytes(), &mut output, &options).expect("import");
//! assert_eq!(stats.packets_written, 1);
//! assert_eq!(&output[..4], &[0x0a, 0x0d, 0x0d, 0x0a]);
//! ```
//!
//! # Example: custom sink
//!
//! Frames can be collected by any [`FrameSink`], instead of a [`CaptureWriter`]:
//!
//! ```rust
//! use text2pcap::*;
//! use text2pcap::hexdump::HexdumpSource;
//!
//! let options = ImportOptions {
//!     headers: DummyHeaderConfig {
//!         header: DummyHeader::Udp,
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! let mut asm = Assembler::new(&options).expect("valid options");
//! let mut source = HexdumpSource::new(&b"0000 01 02 03 04\n"[..], &options);
//! let mut frames: Vec<FrameRecord> = Vec::new();
//! source.run(&mut asm, &mut frames).expect("import");
//! // Ethernet + IPv4 + UDP + payload, padded to the minimum Ethernet frame length
//! assert_eq!(frames[0].data.len(), 60);
//! assert_eq!(&frames[0].data[42..46], &[1, 2, 3, 4]);
//! ```

mod config;
mod endianness;
mod error;
mod import;
mod linktype;
mod packet;
mod serialize;
mod writer;

pub use config::*;
pub use endianness::ByteOrder;
pub use error::*;
pub use import::*;
pub use linktype::*;
pub use packet::*;
pub use serialize::ToVec;
pub use writer::*;

pub mod assembler;
pub use assembler::{Assembler, AssemblerState};

pub mod hexdump;
pub mod plain;
pub mod regex_import;
pub mod timestamp;
pub use plain::PlainEncoding;
pub use timestamp::TimestampZone;

pub mod pcap;
pub mod pcapng;
