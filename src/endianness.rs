use cookie_factory::bytes::{be_i64, be_u16, be_u32, le_i64, le_u16, le_u32};
use cookie_factory::{GenResult, SerializeFn, WriteContext};
use std::io::Write;

/// Byte order used to serialize multi-byte fields
///
/// Classic pcap files are written in the byte order implied by their magic number, and pcapng
/// sections in the byte order of their byte-order magic: readers detect it and swap if needed.
/// The writer is deterministic for a given `ByteOrder`, whatever the build target.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    /// Byte order of the host
    pub const fn native() -> ByteOrder {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    #[inline]
    pub fn u32_bytes(self, v: u32) -> [u8; 4] {
        match self {
            ByteOrder::Little => v.to_le_bytes(),
            ByteOrder::Big => v.to_be_bytes(),
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        ByteOrder::native()
    }
}

pub(crate) fn gen_u16<W: Write>(v: u16, order: ByteOrder) -> impl SerializeFn<W> {
    move |out: WriteContext<W>| -> GenResult<W> {
        match order {
            ByteOrder::Little => le_u16(v)(out),
            ByteOrder::Big => be_u16(v)(out),
        }
    }
}

pub(crate) fn gen_u32<W: Write>(v: u32, order: ByteOrder) -> impl SerializeFn<W> {
    move |out: WriteContext<W>| -> GenResult<W> {
        match order {
            ByteOrder::Little => le_u32(v)(out),
            ByteOrder::Big => be_u32(v)(out),
        }
    }
}

pub(crate) fn gen_i64<W: Write>(v: i64, order: ByteOrder) -> impl SerializeFn<W> {
    move |out: WriteContext<W>| -> GenResult<W> {
        match order {
            ByteOrder::Little => le_i64(v)(out),
            ByteOrder::Big => be_i64(v)(out),
        }
    }
}
