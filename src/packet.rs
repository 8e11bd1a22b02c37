use crate::error::ImportError;
use crate::pcapng::build_ts_nanos;

/// Absolute time of a frame: seconds since the epoch, and nanoseconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp {
    pub secs: i64,
    pub nsecs: u32,
}

impl Timestamp {
    pub const fn new(secs: i64, nsecs: u32) -> Timestamp {
        Timestamp { secs, nsecs }
    }

    /// Add `nanos` nanoseconds, carrying into seconds
    pub fn add_nanos(self, nanos: u64) -> Timestamp {
        let total = u64::from(self.nsecs) + nanos;
        let secs = self
            .secs
            .saturating_add((total / 1_000_000_000) as i64);
        Timestamp {
            secs,
            nsecs: (total % 1_000_000_000) as u32,
        }
    }

    /// Nanoseconds since the epoch (see [`build_ts_nanos`])
    pub fn as_nanos(self) -> u64 {
        build_ts_nanos(self.secs, self.nsecs)
    }
}

/// Direction of a packet, relative to the capturing host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Unknown,
    Inbound,
    Outbound,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Unknown
    }
}

impl Direction {
    /// Value of the direction bits of the pcapng `epb_flags` option
    pub fn epb_flags(self) -> Option<u32> {
        match self {
            Direction::Unknown => None,
            Direction::Inbound => Some(1),
            Direction::Outbound => Some(2),
        }
    }
}

/// A complete frame, ready to be written
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameRecord {
    pub timestamp: Timestamp,
    pub data: Vec<u8>,
    pub interface_id: u32,
    pub direction: Direction,
    pub sequence_number: Option<u64>,
}

/// Consumer of assembled frames
pub trait FrameSink {
    fn push_frame(&mut self, frame: FrameRecord) -> Result<(), ImportError>;
}

impl FrameSink for Vec<FrameRecord> {
    fn push_frame(&mut self, frame: FrameRecord) -> Result<(), ImportError> {
        self.push(frame);
        Ok(())
    }
}
