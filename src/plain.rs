//! Decoder for plain text encodings of binary data
//!
//! Each encoding maps every input character through a 256-entry table. Whitespace is skipped
//! everywhere, so data may be split on several lines or grouped in words.

/// Text encoding of the data captured by an import pattern
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlainEncoding {
    /// 2 characters per byte
    Hex,
    /// 3 characters per byte. Only the low 8 bits of each 9-bit group are kept.
    Octal,
    /// 8 characters per byte
    Binary,
    /// 4 characters per 3 bytes, standard or URL-safe alphabet. Padding is ignored.
    Base64,
}

impl Default for PlainEncoding {
    fn default() -> Self {
        PlainEncoding::Hex
    }
}

/// Class of an input character
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CharClass {
    /// Digit of the given value
    Value(u8),
    Skip,
    Invalid,
}

/// Result of a [`decode`] call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeStatus {
    /// All input was consumed
    Complete,
    /// The output has no room for the next unit. Decoding can resume at `consumed`.
    DestinationFull,
    /// An invalid character was found at `position`
    InvalidChar { position: usize, byte: u8 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Number of bytes written to the output
    pub written: usize,
    /// Number of input characters consumed
    pub consumed: usize,
    pub status: DecodeStatus,
}

const fn base_table() -> [CharClass; 256] {
    let mut t = [CharClass::Invalid; 256];
    t[b' ' as usize] = CharClass::Skip;
    t[b'\t' as usize] = CharClass::Skip;
    t[b'\n' as usize] = CharClass::Skip;
    t[b'\r' as usize] = CharClass::Skip;
    t[0x0b] = CharClass::Skip;
    t[0x0c] = CharClass::Skip;
    t
}

const fn digits_table(radix: u8) -> [CharClass; 256] {
    let mut t = base_table();
    let mut i = 0;
    while i < radix && i < 10 {
        t[(b'0' + i) as usize] = CharClass::Value(i);
        i += 1;
    }
    while i < radix {
        t[(b'a' + i - 10) as usize] = CharClass::Value(i);
        t[(b'A' + i - 10) as usize] = CharClass::Value(i);
        i += 1;
    }
    t
}

const fn base64_table() -> [CharClass; 256] {
    let mut t = base_table();
    let mut i = 0;
    while i < 26 {
        t[(b'A' + i) as usize] = CharClass::Value(i);
        t[(b'a' + i) as usize] = CharClass::Value(26 + i);
        i += 1;
    }
    i = 0;
    while i < 10 {
        t[(b'0' + i) as usize] = CharClass::Value(52 + i);
        i += 1;
    }
    t[b'+' as usize] = CharClass::Value(62);
    t[b'/' as usize] = CharClass::Value(63);
    t[b'-' as usize] = CharClass::Value(62);
    t[b'_' as usize] = CharClass::Value(63);
    t[b'=' as usize] = CharClass::Skip;
    t
}

static HEX_TABLE: [CharClass; 256] = digits_table(16);
static OCTAL_TABLE: [CharClass; 256] = digits_table(8);
static BINARY_TABLE: [CharClass; 256] = digits_table(2);
static BASE64_TABLE: [CharClass; 256] = base64_table();

impl PlainEncoding {
    pub fn table(self) -> &'static [CharClass; 256] {
        match self {
            PlainEncoding::Hex => &HEX_TABLE,
            PlainEncoding::Octal => &OCTAL_TABLE,
            PlainEncoding::Binary => &BINARY_TABLE,
            PlainEncoding::Base64 => &BASE64_TABLE,
        }
    }

    pub const fn bits_per_char(self) -> u32 {
        match self {
            PlainEncoding::Hex => 4,
            PlainEncoding::Octal => 3,
            PlainEncoding::Binary => 1,
            PlainEncoding::Base64 => 6,
        }
    }

    /// Number of characters of a complete unit
    pub const fn chars_per_unit(self) -> u32 {
        match self {
            PlainEncoding::Hex => 2,
            PlainEncoding::Octal => 3,
            PlainEncoding::Binary => 8,
            PlainEncoding::Base64 => 4,
        }
    }

    /// Number of bytes decoded from a complete unit
    pub const fn bytes_per_unit(self) -> usize {
        match self {
            PlainEncoding::Base64 => 3,
            _ => 1,
        }
    }
}

/// Decode `src` into `dst`
///
/// Decoding stops at the end of input, at the first invalid character, or when `dst` has no
/// room for the bytes of the next unit. In the last case, `consumed` is the position of the first
/// character of the pending unit, so that the caller can empty `dst` and call `decode` again
/// on `&src[consumed..]`.
///
/// A partial unit (at end of input, or before an invalid character) is rounded down to whole
/// bytes.
pub fn decode(encoding: PlainEncoding, src: &[u8], dst: &mut [u8]) -> DecodeOutcome {
    let table = encoding.table();
    let bits = encoding.bits_per_char();
    let unit_chars = encoding.chars_per_unit();
    let unit_bytes = encoding.bytes_per_unit();

    let mut acc: u32 = 0;
    let mut nchars: u32 = 0;
    let mut written = 0;

    for (i, &c) in src.iter().enumerate() {
        match table[c as usize] {
            CharClass::Skip => (),
            CharClass::Invalid => {
                written += emit_partial(acc, nchars * bits, &mut dst[written..]);
                return DecodeOutcome {
                    written,
                    consumed: i,
                    status: DecodeStatus::InvalidChar {
                        position: i,
                        byte: c,
                    },
                };
            }
            CharClass::Value(v) => {
                if nchars == 0
                    && written + pending_unit_bytes(encoding, &src[i..]) > dst.len()
                {
                    return DecodeOutcome {
                        written,
                        consumed: i,
                        status: DecodeStatus::DestinationFull,
                    };
                }
                acc = (acc << bits) | u32::from(v);
                nchars += 1;
                if nchars == unit_chars {
                    for k in (0..unit_bytes).rev() {
                        dst[written] = (acc >> (8 * k)) as u8;
                        written += 1;
                    }
                    acc = 0;
                    nchars = 0;
                }
            }
        }
    }
    written += emit_partial(acc, nchars * bits, &mut dst[written..]);
    DecodeOutcome {
        written,
        consumed: src.len(),
        status: DecodeStatus::Complete,
    }
}

// Bytes produced by the unit starting at `src`, which may be cut short by the end of input or
// an invalid character
fn pending_unit_bytes(encoding: PlainEncoding, src: &[u8]) -> usize {
    let table = encoding.table();
    let mut nchars = 0;
    for &c in src {
        match table[c as usize] {
            CharClass::Value(_) => {
                nchars += 1;
                if nchars == encoding.chars_per_unit() {
                    return encoding.bytes_per_unit();
                }
            }
            CharClass::Skip => (),
            CharClass::Invalid => break,
        }
    }
    (nchars * encoding.bits_per_char() / 8) as usize
}

// Emit the whole bytes of a partial unit of `nbits` bits, most significant first
fn emit_partial(acc: u32, nbits: u32, dst: &mut [u8]) -> usize {
    let nbytes = ((nbits / 8) as usize).min(dst.len());
    for (k, b) in dst.iter_mut().take(nbytes).enumerate() {
        *b = (acc >> (nbits - 8 * (k as u32 + 1))) as u8;
    }
    nbytes
}
