//! AVPacket interface.
//!
//! A "packet" in the FFmpeg terminology is an encoded part of an elementary
//! stream (i.e. audio, video or subtitle stream).

use std::os::raw::{c_int, c_void};

use crate::time::{TimeBase, Timestamp};

extern "C" {
    fn ffw_packet_alloc() -> *mut c_void;
    fn ffw_packet_free(packet: *mut c_void);
    fn ffw_packet_get_pts(packet: *const c_void) -> i64;
    fn ffw_packet_set_pts(packet: *mut c_void, pts: i64);
    fn ffw_packet_get_dts(packet: *const c_void) -> i64;
    fn ffw_packet_set_dts(packet: *mut c_void, dts: i64);
    fn ffw_packet_get_duration(packet: *const c_void) -> i64;
    fn ffw_packet_set_duration(packet: *mut c_void, duration: i64);
    fn ffw_packet_get_stream_index(packet: *const c_void) -> c_int;
    fn ffw_packet_set_stream_index(packet: *mut c_void, index: c_int);
}

/// Demuxed packet.
///
/// The packet timestamps are always expressed in the time base of the
/// packet. Changing the time base using `with_time_base()` rescales the
/// presentation timestamp, the decoding timestamp and the duration.
pub struct Packet {
    ptr: *mut c_void,
    time_base: TimeBase,
}

impl Packet {
    /// Create a new packet from its raw representation.
    pub(crate) unsafe fn from_raw_ptr(ptr: *mut c_void, time_base: TimeBase) -> Self {
        Packet { ptr, time_base }
    }

    /// Get stream index.
    pub fn stream_index(&self) -> usize {
        unsafe { ffw_packet_get_stream_index(self.ptr) as _ }
    }

    /// Set stream index.
    pub fn with_stream_index(self, index: usize) -> Self {
        unsafe { ffw_packet_set_stream_index(self.ptr, index as _) }

        self
    }

    /// Get packet time base.
    pub fn time_base(&self) -> TimeBase {
        self.time_base
    }

    /// Set packet time base. (This will rescale the current timestamps and
    /// the duration into a given time base.)
    pub fn with_time_base(mut self, time_base: TimeBase) -> Self {
        let new_pts = self.pts().with_time_base(time_base);
        let new_dts = self.dts().with_time_base(time_base);

        let duration = self.raw_duration();

        unsafe {
            ffw_packet_set_pts(self.ptr, new_pts.timestamp());
            ffw_packet_set_dts(self.ptr, new_dts.timestamp());

            if duration > 0 {
                let new_duration = Timestamp::new(duration, self.time_base)
                    .with_time_base(time_base)
                    .timestamp();

                ffw_packet_set_duration(self.ptr, new_duration);
            }
        }

        self.time_base = time_base;

        self
    }

    /// Get packet presentation timestamp.
    pub fn pts(&self) -> Timestamp {
        let pts = unsafe { ffw_packet_get_pts(self.ptr) };

        Timestamp::new(pts, self.time_base)
    }

    /// Get packet decoding timestamp.
    pub fn dts(&self) -> Timestamp {
        let dts = unsafe { ffw_packet_get_dts(self.ptr) };

        Timestamp::new(dts, self.time_base)
    }

    /// Get packet duration in time base units.
    pub fn raw_duration(&self) -> i64 {
        unsafe { ffw_packet_get_duration(self.ptr) }
    }

    /// Get raw pointer to the underlying AVPacket.
    pub(crate) fn as_mut_ptr(&mut self) -> *mut c_void {
        self.ptr
    }
}

#[cfg(test)]
impl Packet {
    /// Allocate an empty packet with a given time base.
    fn alloc(time_base: TimeBase) -> Self {
        let ptr = unsafe { ffw_packet_alloc() };

        assert!(!ptr.is_null());

        Self { ptr, time_base }
    }

    fn with_raw_pts(self, pts: i64) -> Self {
        unsafe { ffw_packet_set_pts(self.ptr, pts) }

        self
    }

    fn with_raw_dts(self, dts: i64) -> Self {
        unsafe { ffw_packet_set_dts(self.ptr, dts) }

        self
    }

    fn with_raw_duration(self, duration: i64) -> Self {
        unsafe { ffw_packet_set_duration(self.ptr, duration) }

        self
    }
}

impl Drop for Packet {
    fn drop(&mut self) {
        unsafe { ffw_packet_free(self.ptr) }
    }
}

unsafe impl Send for Packet {}
unsafe impl Sync for Packet {}
