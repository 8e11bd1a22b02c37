use std::convert::TryFrom;

/// Convert a timestamp to nanoseconds since epoch, in the resolution of interfaces created by
/// this crate (see [`TSRESOL_NANOSECONDS`](super::TSRESOL_NANOSECONDS))
///
/// Timestamps before the epoch are clamped to 0, timestamps after year 2554 saturate.
pub fn build_ts_nanos(secs: i64, nanos: u32) -> u64 {
    let secs = u64::try_from(secs).unwrap_or(0);
    secs.saturating_mul(1_000_000_000)
        .saturating_add(u64::from(nanos))
}

/// Split a 64-bit timestamp into high and low 32-bit halves
pub fn split_ts(ts: u64) -> (u32, u32) {
    ((ts >> 32) as u32, ts as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nanos() {
        assert_eq!(build_ts_nanos(1, 5), 1_000_000_005);
        assert_eq!(build_ts_nanos(-3, 5), 5);
        let ts = build_ts_nanos(1_515_933_236, 562_913_000);
        let (high, low) = split_ts(ts);
        assert_eq!(((high as u64) << 32) | low as u64, ts);
    }
}
