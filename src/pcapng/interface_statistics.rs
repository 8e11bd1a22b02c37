use super::{split_ts, PcapNGOption, ISB_MAGIC};

#[derive(Debug)]
pub struct InterfaceStatisticsBlock<'a> {
    pub block_type: u32,
    pub block_len1: u32,
    pub if_id: u32,
    pub ts_high: u32,
    pub ts_low: u32,
    pub options: Vec<PcapNGOption<'a>>,
    pub block_len2: u32,
}

impl<'a> InterfaceStatisticsBlock<'a> {
    pub fn new(
        if_id: u32,
        ts: u64,
        options: Vec<PcapNGOption<'a>>,
    ) -> InterfaceStatisticsBlock<'a> {
        let (ts_high, ts_low) = split_ts(ts);
        InterfaceStatisticsBlock {
            block_type: ISB_MAGIC,
            block_len1: 0,
            if_id,
            ts_high,
            ts_low,
            options,
            block_len2: 0,
        }
    }
}
