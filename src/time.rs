//! Time base aware timestamps.

use std::fmt::{self, Debug, Formatter};

extern "C" {
    static ffw_null_timestamp: i64;

    fn ffw_rescale_q(n: i64, aq_num: u32, aq_den: u32, bq_num: u32, bq_den: u32) -> i64;
}

/// A rational time base (e.g. 1/1000 is a millisecond time base).
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct TimeBase {
    num: u32,
    den: u32,
}

impl TimeBase {
    /// A microseconds time base.
    pub const MICROSECONDS: TimeBase = TimeBase::new(1, 1_000_000);

    /// Create a new time base as a rational number with a given numerator and
    /// denominator.
    #[inline]
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// Get the numerator.
    #[inline]
    pub const fn num(&self) -> u32 {
        self.num
    }

    /// Get the denominator.
    #[inline]
    pub const fn den(&self) -> u32 {
        self.den
    }
}

impl Debug for TimeBase {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(f, "{}/{}", self.num(), self.den())
    }
}

/// A timestamp in a given time base.
#[derive(Copy, Clone)]
pub struct Timestamp {
    timestamp: i64,
    time_base: TimeBase,
}

impl Timestamp {
    /// Create a "null" timestamp (i.e. a timestamp set to the AV_NOPTS_VALUE).
    #[inline]
    pub fn null() -> Self {
        unsafe {
            Self {
                timestamp: ffw_null_timestamp,
                time_base: TimeBase::MICROSECONDS,
            }
        }
    }

    /// Create a new timestamp with a given time base.
    #[inline]
    pub const fn new(timestamp: i64, time_base: TimeBase) -> Self {
        Self {
            timestamp,
            time_base,
        }
    }

    /// Get the time base.
    #[inline]
    pub const fn time_base(&self) -> TimeBase {
        self.time_base
    }

    /// Get the raw timestamp value.
    #[inline]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Check if this is the "null" timestamp (i.e. it is equal to the
    /// AV_NOPTS_VALUE).
    #[inline]
    pub fn is_null(&self) -> bool {
        unsafe { self.timestamp == ffw_null_timestamp }
    }

    /// Rescale the timestamp value to a given time base.
    ///
    /// The value is rounded to the nearest representable value. Null
    /// timestamps stay null.
    pub fn with_time_base(&self, time_base: TimeBase) -> Self {
        let timestamp = if self.is_null() || self.time_base == time_base {
            self.timestamp
        } else {
            unsafe {
                ffw_rescale_q(
                    self.timestamp,
                    self.time_base.num,
                    self.time_base.den,
                    time_base.num,
                    time_base.den,
                )
            }
        };

        Self {
            timestamp,
            time_base,
        }
    }
}

impl Debug for Timestamp {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        if self.is_null() {
            write!(f, "(null)")
        } else {
            write!(f, "{} ({:?})", self.timestamp, self.time_base)
        }
    }
}
