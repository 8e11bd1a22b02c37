use super::{split_ts, PcapNGOption, EPB_MAGIC};

/// An Enhanced Packet Block (EPB) is the standard container for storing
/// the packets coming from the network.
///
/// `data` is stored without padding, padding is added when serializing.
#[derive(Debug)]
pub struct EnhancedPacketBlock<'a> {
    pub block_type: u32,
    pub block_len1: u32,
    pub if_id: u32,
    pub ts_high: u32,
    pub ts_low: u32,
    /// Captured packet length
    pub caplen: u32,
    /// Original packet length
    pub origlen: u32,
    /// Raw data from packet (without padding)
    pub data: &'a [u8],
    pub options: Vec<PcapNGOption<'a>>,
    pub block_len2: u32,
}

impl<'a> EnhancedPacketBlock<'a> {
    /// Build a block for `data`, truncated to `snaplen`
    ///
    /// `ts` is the timestamp in interface time units.
    pub fn new(
        if_id: u32,
        ts: u64,
        data: &'a [u8],
        snaplen: u32,
        options: Vec<PcapNGOption<'a>>,
    ) -> EnhancedPacketBlock<'a> {
        let (ts_high, ts_low) = split_ts(ts);
        let origlen = data.len() as u32;
        let caplen = origlen.min(snaplen);
        EnhancedPacketBlock {
            block_type: EPB_MAGIC,
            block_len1: 0,
            if_id,
            ts_high,
            ts_low,
            caplen,
            origlen,
            data: &data[..caplen as usize],
            options,
            block_len2: 0,
        }
    }
}
