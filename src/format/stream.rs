//! A/V stream information.

use std::os::raw::{c_int, c_void};

use crate::{
    codec::{CodecParameters, MediaType},
    time::TimeBase,
    Error,
};

extern "C" {
    fn ffw_stream_get_time_base(stream: *const c_void, num: *mut u32, den: *mut u32);
    fn ffw_stream_get_media_type(stream: *const c_void) -> c_int;
    fn ffw_stream_get_codec_parameters(stream: *const c_void) -> *mut c_void;
}

/// Stream of a demuxer or muxer.
///
/// The stream is only a view into the container owning it. Properties are
/// read from the container on every call because muxers are allowed to
/// change them (e.g. the time base) while writing the header.
pub struct Stream {
    ptr: *mut c_void,
}

impl Stream {
    /// Create a new stream from its raw representation.
    pub(crate) unsafe fn from_raw_ptr(ptr: *mut c_void) -> Self {
        Stream { ptr }
    }

    /// Get stream time base.
    pub fn time_base(&self) -> TimeBase {
        let mut num = 0_u32;
        let mut den = 0_u32;

        unsafe {
            ffw_stream_get_time_base(self.ptr, &mut num, &mut den);
        }

        TimeBase::new(num, den)
    }

    /// Get media type of the stream without copying its codec parameters.
    pub fn media_type(&self) -> MediaType {
        let raw = unsafe { ffw_stream_get_media_type(self.ptr) };

        MediaType::from_raw(raw)
    }

    /// Get a copy of the stream codec parameters.
    pub fn codec_parameters(&self) -> Result<CodecParameters, Error> {
        let ptr = unsafe { ffw_stream_get_codec_parameters(self.ptr) };

        if ptr.is_null() {
            Err(Error::allocation("unable to copy codec parameters"))
        } else {
            unsafe { Ok(CodecParameters::from_raw_ptr(ptr)) }
        }
    }
}

unsafe impl Send for Stream {}
unsafe impl Sync for Stream {}
