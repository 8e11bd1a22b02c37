use rusticata_macros::newtype_enum;

/// Data link type
///
/// The link-layer header type specifies the type of headers at the beginning
/// of the packet.
///
/// See <http://www.tcpdump.org/linktypes.html>
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Linktype(pub i32);

newtype_enum! {
impl display Linktype {
    NULL = 0,
    ETHERNET = 1,

    RAW = 101,

    // Raw IPv4; the packet begins with an IPv4 header.
    IPV4 = 228,
    // Raw IPv6; the packet begins with an IPv6 header.
    IPV6 = 229,

    //  Upper-layer protocol saves from Wireshark
    WIRESHARK_UPPER_PDU = 252,
}
}

impl Default for Linktype {
    fn default() -> Self {
        Linktype::ETHERNET
    }
}

impl Linktype {
    /// True if packets of this link type start directly with an IP header
    pub fn is_raw_ip(self) -> bool {
        matches!(self, Linktype::RAW | Linktype::IPV4 | Linktype::IPV6)
    }
}
