use super::{PcapNGOption, IDB_MAGIC};
use crate::Linktype;

/// Time resolution of the interfaces created by this crate: `10^-9` (nanoseconds)
pub const TSRESOL_NANOSECONDS: u8 = 9;

/// An Interface Description Block (IDB) is the container for information
/// describing an interface on which packet data is captured.
#[derive(Debug)]
pub struct InterfaceDescriptionBlock<'a> {
    pub block_type: u32,
    pub block_len1: u32,
    pub linktype: Linktype,
    pub reserved: u16,
    pub snaplen: u32,
    pub options: Vec<PcapNGOption<'a>>,
    pub block_len2: u32,
    pub if_tsresol: u8,
}

impl<'a> InterfaceDescriptionBlock<'a> {
    pub fn new(
        linktype: Linktype,
        snaplen: u32,
        options: Vec<PcapNGOption<'a>>,
    ) -> InterfaceDescriptionBlock<'a> {
        InterfaceDescriptionBlock {
            block_type: IDB_MAGIC,
            block_len1: 0,
            linktype,
            reserved: 0,
            snaplen,
            options,
            block_len2: 0,
            if_tsresol: TSRESOL_NANOSECONDS,
        }
    }
}
