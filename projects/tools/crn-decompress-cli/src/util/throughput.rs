use bytesize::ByteSize;
use core::fmt;
use std::time::Duration;

/// A wrapper around [`ByteSize`] that represents throughput in bytes per second.
///
/// Displays with a trailing "/s".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Throughput(pub ByteSize);

impl Throughput {
    /// Creates a new [`Throughput`] from bytes per second.
    pub fn from_bytes_per_sec(bytes_per_sec: u64) -> Self {
        Self(ByteSize(bytes_per_sec))
    }

    /// Throughput of processing `bytes` in `elapsed`; zero when no time was measured.
    pub fn from_elapsed(bytes: u64, elapsed: Duration) -> Self {
        let secs = elapsed.as_secs_f64();
        if secs > 0.0 {
            Self::from_bytes_per_sec((bytes as f64 / secs) as u64)
        } else {
            Self::from_bytes_per_sec(0)
        }
    }
}

impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/s", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_elapsed_reports_zero() {
        assert_eq!(
            Throughput::from_elapsed(1024, Duration::ZERO),
            Throughput::from_bytes_per_sec(0)
        );
    }

    #[test]
    fn bytes_over_two_seconds() {
        let throughput = Throughput::from_elapsed(4096, Duration::from_secs(2));
        assert_eq!(throughput, Throughput::from_bytes_per_sec(2048));
        assert!(throughput.to_string().ends_with("/s"));
    }
}
