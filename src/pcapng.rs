//! PCAPNG file format
//!
//! See <https://github.com/pcapng/pcapng> for details.
//!
//! A capture file is organized in blocks. Each block is shaped as
//! `{ block type: u32, total length: u32, body, total length: u32 }`; the trailing length
//! duplicates the leading one so that the file can be walked backwards.
//!
//! Blocks written here:
//!
//! - a Section Header Block (SHB), starting the section and fixing its byte order
//! - one Interface Description Block (IDB) per link type / snapshot length pair
//! - Enhanced Packet Blocks (EPB), one per frame
//! - Interface Statistics Blocks (ISB)
//!
//! ## Endianness
//!
//! The byte-order magic of the SHB is written in the byte order of the section, and all
//! following integers (including option values) use that same byte order.

mod enhanced_packet;
mod interface_description;
mod interface_statistics;
mod option;
mod section_header;
mod time;

pub use enhanced_packet::*;
pub use interface_description::*;
pub use interface_statistics::*;
pub use option::*;
pub use section_header::*;
pub use time::*;

/// Section Header Block magic
pub const SHB_MAGIC: u32 = 0x0A0D_0D0A;
/// Interface Description Block magic
pub const IDB_MAGIC: u32 = 0x0000_0001;
/// Interface Statistic Block magic
pub const ISB_MAGIC: u32 = 0x0000_0005;
/// Enhanced Packet Block magic
pub const EPB_MAGIC: u32 = 0x0000_0006;

/// Byte Order magic
pub const BOM_MAGIC: u32 = 0x1A2B_3C4D;
