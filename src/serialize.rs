use crate::endianness::{gen_i64, gen_u16, gen_u32, ByteOrder};
use crate::pcap::*;
use crate::pcapng::*;
use cookie_factory::combinator::slice;
use cookie_factory::sequence::tuple;
use cookie_factory::{gen, GenError, SerializeFn};
use rusticata_macros::align32;
use std::borrow::Cow;
use std::io::Write;

/// Common trait for all serialization functions
pub trait ToVec {
    /// Serialize to bytes representation, in the given byte order.
    /// Check values and fix all fields before serializing.
    fn to_vec(&mut self, order: ByteOrder) -> Result<Vec<u8>, GenError> {
        self.fix();
        self.to_vec_raw(order)
    }

    /// Check and correct all fields: use magic, fix lengths fields and other values if possible.
    fn fix(&mut self) {}

    /// Serialize to bytes representation. Do not check values
    fn to_vec_raw(&self, order: ByteOrder) -> Result<Vec<u8>, GenError>;
}

impl ToVec for PcapHeader {
    fn to_vec_raw(&self, order: ByteOrder) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(PCAP_HEADER_LEN);

        gen(
            tuple((
                gen_u32(self.magic_number, order),
                gen_u16(self.version_major, order),
                gen_u16(self.version_minor, order),
                gen_u32(self.thiszone as u32, order),
                gen_u32(self.sigfigs, order),
                gen_u32(self.snaplen, order),
                gen_u32(self.network.0 as u32, order),
            )),
            &mut v,
        )?;
        Ok(v)
    }
}

impl<'a> ToVec for LegacyPcapBlock<'a> {
    fn fix(&mut self) {
        self.caplen = self.data.len() as u32;
    }

    fn to_vec_raw(&self, order: ByteOrder) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(self.data.len() + PCAP_RECORD_HEADER_LEN);

        gen(
            tuple((
                gen_u32(self.ts_sec, order),
                gen_u32(self.ts_usec, order),
                gen_u32(self.caplen, order),
                gen_u32(self.origlen, order),
                slice(self.data),
            )),
            &mut v,
        )?;
        // pcap records have no alignment constraints
        Ok(v)
    }
}

fn padding_for<'a, W: Write + 'a>(unaligned_length: u32) -> impl SerializeFn<W> + 'a {
    let length = align32!(unaligned_length) - unaligned_length;
    slice(if length > 0 {
        &[0, 0, 0, 0][..length as usize]
    } else {
        b""
    })
}

fn pcapngoption<'a, 'b: 'a, W: Write + 'a>(
    i: &'b PcapNGOption,
    order: ByteOrder,
) -> impl SerializeFn<W> + 'a {
    tuple((
        gen_u16(i.code.0, order),
        gen_u16(i.len, order),
        slice(i.value()),
        padding_for(i.value.len() as u32),
    ))
}

impl<'a> ToVec for PcapNGOption<'a> {
    fn to_vec_raw(&self, order: ByteOrder) -> Result<Vec<u8>, GenError> {
        let mut v = Vec::with_capacity(self.size());
        gen(pcapngoption(self, order), &mut v)?;
        Ok(v)
    }
}

fn options_to_vec(options: &[PcapNGOption], order: ByteOrder) -> Result<Vec<u8>, GenError> {
    let mut v = Vec::with_capacity(options_length(options));
    for option in options {
        gen(pcapngoption(option, order), &mut v)?;
    }
    Ok(v)
}

impl<'a> ToVec for SectionHeaderBlock<'a> {
    /// Check and correct all fields: use magic, version and fix lengths fields
    fn fix(&mut self) {
        self.block_type = SHB_MAGIC;
        self.bom = BOM_MAGIC;
        self.major_version = 1;
        self.minor_version = 0;
        fix_options(&mut self.options);
        // fix length
        let length = (28 + options_length(&self.options)) as u32;
        self.block_len1 = length;
        self.block_len2 = length;
    }

    fn to_vec_raw(&self, order: ByteOrder) -> Result<Vec<u8>, GenError> {
        let options = options_to_vec(&self.options, order)?;
        let mut v = Vec::with_capacity(28 + options.len());
        gen(
            tuple((
                gen_u32(self.block_type, order),
                gen_u32(self.block_len1, order),
                gen_u32(self.bom, order),
                gen_u16(self.major_version, order),
                gen_u16(self.minor_version, order),
                gen_i64(self.section_len, order),
                slice(&options),
                gen_u32(self.block_len2, order),
            )),
            &mut v,
        )?;
        Ok(v)
    }
}

impl<'a> ToVec for InterfaceDescriptionBlock<'a> {
    /// Check and correct all fields: use magic, set time resolution and fix lengths fields
    fn fix(&mut self) {
        self.block_type = IDB_MAGIC;
        self.reserved = 0;
        // check time resolution
        if !self.options.iter().any(|o| o.code == OptionCode::IfTsresol) {
            self.options.push(PcapNGOption {
                code: OptionCode::IfTsresol,
                len: 1,
                value: Cow::Owned(vec![self.if_tsresol]),
            });
        }
        fix_options(&mut self.options);
        // fix length
        let length = (20 + options_length(&self.options)) as u32;
        self.block_len1 = length;
        self.block_len2 = length;
    }

    /// Serialize to bytes representation. Do not check values
    fn to_vec_raw(&self, order: ByteOrder) -> Result<Vec<u8>, GenError> {
        let options = options_to_vec(&self.options, order)?;
        let mut v = Vec::with_capacity(20 + options.len());
        gen(
            tuple((
                gen_u32(self.block_type, order),
                gen_u32(self.block_len1, order),
                gen_u16(self.linktype.0 as u16, order),
                gen_u16(self.reserved, order),
                gen_u32(self.snaplen, order),
                slice(&options),
                gen_u32(self.block_len2, order),
            )),
            &mut v,
        )?;
        Ok(v)
    }
}

impl<'a> ToVec for EnhancedPacketBlock<'a> {
    /// Check and correct all fields: use magic, captured length and fix lengths fields
    fn fix(&mut self) {
        self.block_type = EPB_MAGIC;
        self.caplen = self.data.len() as u32;
        fix_options(&mut self.options);
        // fix length
        let length = (32 + align32!(self.data.len()) + options_length(&self.options)) as u32;
        self.block_len1 = length;
        self.block_len2 = length;
    }

    fn to_vec_raw(&self, order: ByteOrder) -> Result<Vec<u8>, GenError> {
        let options = options_to_vec(&self.options, order)?;
        let mut v = Vec::with_capacity(32 + align32!(self.data.len()) + options.len());
        gen(
            tuple((
                gen_u32(self.block_type, order),
                gen_u32(self.block_len1, order),
                gen_u32(self.if_id, order),
                gen_u32(self.ts_high, order),
                gen_u32(self.ts_low, order),
                gen_u32(self.caplen, order),
                gen_u32(self.origlen, order),
                slice(self.data),
                padding_for(self.data.len() as u32),
                slice(&options),
                gen_u32(self.block_len2, order),
            )),
            &mut v,
        )?;
        Ok(v)
    }
}

impl<'a> ToVec for InterfaceStatisticsBlock<'a> {
    fn fix(&mut self) {
        self.block_type = ISB_MAGIC;
        fix_options(&mut self.options);
        // fix length
        self.block_len1 = (24 + options_length(&self.options)) as u32;
        self.block_len2 = self.block_len1;
    }

    fn to_vec_raw(&self, order: ByteOrder) -> Result<Vec<u8>, GenError> {
        let options = options_to_vec(&self.options, order)?;
        let mut v = Vec::with_capacity(24 + options.len());
        gen(
            tuple((
                gen_u32(self.block_type, order),
                gen_u32(self.block_len1, order),
                gen_u32(self.if_id, order),
                gen_u32(self.ts_high, order),
                gen_u32(self.ts_low, order),
                slice(&options),
                gen_u32(self.block_len2, order),
            )),
            &mut v,
        )?;
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use hex_literal::hex;

    use crate::endianness::ByteOrder;
    use crate::pcap::*;
    use crate::pcapng::*;
    use crate::serialize::ToVec;
    use crate::Linktype;

    pub const PCAP_HDR_LE: &[u8] = &hex!(
        "
D4 C3 B2 A1 02 00 04 00 00 00 00 00 00 00 00 00
00 00 04 00 01 00 00 00"
    );

    #[test]
    fn test_serialize_pcap_header() {
        let hdr = PcapHeader::new(Linktype::ETHERNET, 262_144);
        let v = hdr.to_vec_raw(ByteOrder::Little).expect("serialize");
        assert_eq!(v.len(), hdr.size());
        assert_eq!(v, PCAP_HDR_LE);
        let v = hdr.to_vec_raw(ByteOrder::Big).expect("serialize");
        assert_eq!(&v[..4], &hex!("A1 B2 C3 D4"));
        assert_eq!(&v[20..], &hex!("00 00 00 01"));
    }

    #[test]
    fn test_serialize_pcap_frame() {
        let data = [0xaa; 10];
        let mut pkt = LegacyPcapBlock::new(1_515_933_236, 562_913, &data, 65535);
        let v = pkt.to_vec(ByteOrder::Little).expect("serialize");
        assert_eq!(v.len(), 16 + 10);
        assert_eq!(&v[..4], &1_515_933_236u32.to_le_bytes());
        assert_eq!(&v[8..12], &10u32.to_le_bytes());
        assert_eq!(&v[12..16], &10u32.to_le_bytes());
    }

    #[test]
    fn test_serialize_pcap_frame_truncated() {
        let data = [0xaa; 10];
        let mut pkt = LegacyPcapBlock::new(0, 0, &data, 4);
        let v = pkt.to_vec(ByteOrder::Big).expect("serialize");
        assert_eq!(v.len(), 16 + 4);
        assert_eq!(&v[8..12], &hex!("00 00 00 04"));
        assert_eq!(&v[12..16], &hex!("00 00 00 0a"));
    }

    #[test]
    fn test_serialize_shb() {
        let mut shb = SectionHeaderBlock::new(Vec::new());
        let v = shb.to_vec(ByteOrder::Little).expect("serialize");
        assert_eq!(
            v,
            &hex!(
                "
0A 0D 0D 0A 1C 00 00 00 4D 3C 2B 1A 01 00 00 00
FF FF FF FF FF FF FF FF 1C 00 00 00"
            )[..]
        );
    }

    #[test]
    fn test_serialize_shb_be_options() {
        let mut shb = SectionHeaderBlock::new(vec![PcapNGOption::from_text(
            OptionCode::ShbUserAppl,
            "meows",
        )]);
        let v = shb.to_vec(ByteOrder::Big).expect("serialize");
        // 24 + option (4 + 8) + endofopt (4) + trailing length (4)
        assert_eq!(v.len(), 44);
        assert_eq!(&v[4..8], &hex!("00 00 00 2c"));
        assert_eq!(&v[8..12], &hex!("1A 2B 3C 4D"));
        assert_eq!(&v[24..36], &hex!("00 04 00 05 6d 65 6f 77 73 00 00 00"));
        assert_eq!(&v[36..40], &hex!("00 00 00 00"));
        assert_eq!(&v[40..], &hex!("00 00 00 2c"));
    }

    #[test]
    fn test_serialize_idb() {
        let mut idb = InterfaceDescriptionBlock::new(Linktype::RAW, 65535, vec![]);
        let v = idb.to_vec(ByteOrder::Little).expect("serialize");
        assert_eq!(
            v,
            &hex!(
                "
01 00 00 00 20 00 00 00 65 00 00 00 FF FF 00 00
09 00 01 00 09 00 00 00 00 00 00 00 20 00 00 00"
            )[..]
        );
    }

    #[test]
    fn test_serialize_epb_padding() {
        let data = [1, 2, 3, 4, 5];
        let mut epb = EnhancedPacketBlock::new(0, 0x0000_0001_0000_0002, &data, 65535, vec![]);
        let v = epb.to_vec(ByteOrder::Little).expect("serialize");
        assert_eq!(v.len(), 32 + 8);
        assert_eq!(&v[4..8], &40u32.to_le_bytes());
        assert_eq!(&v[12..16], &1u32.to_le_bytes());
        assert_eq!(&v[16..20], &2u32.to_le_bytes());
        assert_eq!(&v[28..37], &[1, 2, 3, 4, 5, 0, 0, 0, 40]);
    }

    #[test]
    fn test_serialize_epb_with_options() {
        let data = [0u8; 4];
        let mut epb = EnhancedPacketBlock::new(
            1,
            0,
            &data,
            65535,
            vec![PcapNGOption::from_u32(OptionCode::EpbFlags, 1, ByteOrder::Big)],
        );
        let v = epb.to_vec(ByteOrder::Big).expect("serialize");
        // 32 + 4 (data) + 8 (flags) + 4 (endofopt)
        assert_eq!(v.len(), 48);
        assert_eq!(&v[32..40], &hex!("00 02 00 04 00 00 00 01"));
        assert_eq!(&v[40..44], &hex!("00 00 00 00"));
    }

    #[test]
    fn test_serialize_isb() {
        let mut isb = InterfaceStatisticsBlock::new(
            0,
            5,
            vec![PcapNGOption::from_u64(OptionCode::IsbIfRecv, 3, ByteOrder::Little)],
        );
        let v = isb.to_vec(ByteOrder::Little).expect("serialize");
        assert_eq!(v.len(), 24 + 12 + 4);
        assert_eq!(&v[..4], &5u32.to_le_bytes());
        assert_eq!(&v[v.len() - 4..], &40u32.to_le_bytes());
    }
}
