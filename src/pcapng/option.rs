use std::borrow::Cow;

use rusticata_macros::{align32, newtype_enum};

use crate::endianness::ByteOrder;

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct OptionCode(pub u16);

newtype_enum! {
impl debug OptionCode {
    EndOfOpt = 0,
    Comment = 1,
}
}

// Block-specific option codes. Values overlap between block types.
#[allow(non_upper_case_globals)]
impl OptionCode {
    pub const ShbHardware: OptionCode = OptionCode(2);
    pub const ShbOs: OptionCode = OptionCode(3);
    pub const ShbUserAppl: OptionCode = OptionCode(4);

    pub const IfName: OptionCode = OptionCode(2);
    pub const IfTsresol: OptionCode = OptionCode(9);

    pub const EpbFlags: OptionCode = OptionCode(2);
    pub const EpbPacketId: OptionCode = OptionCode(5);

    pub const IsbStartTime: OptionCode = OptionCode(2);
    pub const IsbEndTime: OptionCode = OptionCode(3);
    pub const IsbIfRecv: OptionCode = OptionCode(4);
}

/// A pcapng option: `{ code: u16, len: u16, value padded to 4 bytes }`
///
/// `len` is the unpadded length of `value`. Integer values are stored in the byte order of the
/// section.
#[derive(Debug)]
pub struct PcapNGOption<'a> {
    pub code: OptionCode,
    pub len: u16,
    pub value: Cow<'a, [u8]>,
}

impl<'a> PcapNGOption<'a> {
    /// Build a string option. Strings are stored as UTF-8, without terminating null.
    pub fn from_text(code: OptionCode, s: &'a str) -> PcapNGOption<'a> {
        // option length is 16 bits
        let bytes = &s.as_bytes()[..s.len().min(0xfff0)];
        PcapNGOption {
            code,
            len: bytes.len() as u16,
            value: Cow::Borrowed(bytes),
        }
    }

    pub fn from_u8(code: OptionCode, v: u8) -> PcapNGOption<'static> {
        PcapNGOption {
            code,
            len: 1,
            value: Cow::Owned(vec![v]),
        }
    }

    pub fn from_u32(code: OptionCode, v: u32, order: ByteOrder) -> PcapNGOption<'static> {
        PcapNGOption {
            code,
            len: 4,
            value: Cow::Owned(order.u32_bytes(v).to_vec()),
        }
    }

    pub fn from_u64(code: OptionCode, v: u64, order: ByteOrder) -> PcapNGOption<'static> {
        let value = match order {
            ByteOrder::Little => v.to_le_bytes(),
            ByteOrder::Big => v.to_be_bytes(),
        };
        PcapNGOption {
            code,
            len: 8,
            value: Cow::Owned(value.to_vec()),
        }
    }

    /// Build a timestamp option (high 32 bits first, then low 32 bits)
    pub fn from_timestamp(code: OptionCode, ts: u64, order: ByteOrder) -> PcapNGOption<'static> {
        let mut value = Vec::with_capacity(8);
        value.extend_from_slice(&order.u32_bytes((ts >> 32) as u32));
        value.extend_from_slice(&order.u32_bytes(ts as u32));
        PcapNGOption {
            code,
            len: 8,
            value: Cow::Owned(value),
        }
    }

    /// Return a reference to the option value, as raw bytes (not related to the `len` field)
    #[inline]
    pub fn value(&self) -> &[u8] {
        self.value.as_ref()
    }

    /// Size of the serialized option, including padding
    #[inline]
    pub fn size(&self) -> usize {
        align32!(4 + self.value.len())
    }
}

/// Total serialized size of a list of options
pub fn options_length(options: &[PcapNGOption]) -> usize {
    options.iter().map(|o| o.size()).sum()
}

/// Remove any end-of-options marker, and append one if the list is not empty
pub fn fix_options(options: &mut Vec<PcapNGOption>) {
    options.retain(|e| e.code != OptionCode::EndOfOpt);
    if options.is_empty() {
        // No EndOfOpt is required if there are no options.
    } else {
        options.push(PcapNGOption {
            code: OptionCode::EndOfOpt,
            len: 0,
            value: Cow::Borrowed(&[]),
        })
    }
}
