//! A/V demuxer.

use std::{
    ffi::{CStr, CString},
    io::Read,
    ops::{Deref, DerefMut},
    os::raw::{c_char, c_int, c_uint, c_void},
    ptr,
};

use crate::{
    format::{io::IO, stream::Stream},
    packet::Packet,
    time::TimeBase,
    Error,
};

extern "C" {
    fn ffw_demuxer_new() -> *mut c_void;
    fn ffw_demuxer_init(demuxer: *mut c_void, io_context: *mut c_void, url: *const c_char)
        -> c_int;
    fn ffw_demuxer_find_stream_info(demuxer: *mut c_void) -> c_int;
    fn ffw_demuxer_get_nb_streams(demuxer: *const c_void) -> c_uint;
    fn ffw_demuxer_get_stream(demuxer: *mut c_void, index: c_uint) -> *mut c_void;
    fn ffw_demuxer_get_format_name(demuxer: *const c_void) -> *const c_char;
    fn ffw_demuxer_read_frame(
        demuxer: *mut c_void,
        packet: *mut *mut c_void,
        tb_num: *mut u32,
        tb_den: *mut u32,
    ) -> c_int;
    fn ffw_demuxer_free(demuxer: *mut c_void);
}

/// Demuxer builder.
pub struct DemuxerBuilder {
    ptr: *mut c_void,
    url: Option<CString>,
}

impl DemuxerBuilder {
    /// Create a new demuxer builder.
    fn new() -> Result<DemuxerBuilder, Error> {
        let ptr = unsafe { ffw_demuxer_new() };

        if ptr.is_null() {
            return Err(Error::allocation("unable to allocate a demuxer context"));
        }

        let res = DemuxerBuilder { ptr, url: None };

        Ok(res)
    }

    /// Set the input URL. It is used only as a hint for input format probing
    /// and for logging. All data are read from the IO passed to `build()`.
    pub fn url(mut self, url: &str) -> Result<DemuxerBuilder, Error> {
        let url = CString::new(url)
            .map_err(|_| Error::invalid_arguments(format!("invalid input URL: {}", url)))?;

        self.url = Some(url);

        Ok(self)
    }

    /// Build the demuxer. The input format is probed from the input data.
    ///
    /// # Arguments
    /// * `io` - an AVIO reader
    pub fn build<T>(mut self, mut io: IO<T>) -> Result<Demuxer<T>, Error>
    where
        T: Read,
    {
        let io_context_ptr = io.io_context_mut().as_mut_ptr();

        let url_ptr = self
            .url
            .as_ref()
            .map(|url| url.as_ptr())
            .unwrap_or(ptr::null());

        let ret = unsafe { ffw_demuxer_init(self.ptr, io_context_ptr, url_ptr) };

        if ret < 0 {
            return Err(Error::from_raw_error_code(ret));
        }

        let ptr = self.ptr;

        self.ptr = ptr::null_mut();

        let res = Demuxer { ptr, io };

        Ok(res)
    }
}

impl Drop for DemuxerBuilder {
    fn drop(&mut self) {
        unsafe { ffw_demuxer_free(self.ptr) }
    }
}

unsafe impl Send for DemuxerBuilder {}
unsafe impl Sync for DemuxerBuilder {}

/// Demuxer.
pub struct Demuxer<T> {
    ptr: *mut c_void,
    // released after the demuxer context
    #[allow(dead_code)]
    io: IO<T>,
}

impl Demuxer<()> {
    /// Get a demuxer builder.
    pub fn builder() -> Result<DemuxerBuilder, Error> {
        DemuxerBuilder::new()
    }
}

impl<T> Demuxer<T> {
    /// Take the next packet from the demuxer or `None` on EOF.
    ///
    /// The packet is in the time base of the stream it belongs to.
    pub fn take(&mut self) -> Result<Option<Packet>, Error> {
        let mut pptr = ptr::null_mut();

        let mut tb_num = 0;
        let mut tb_den = 0;

        let ret = unsafe { ffw_demuxer_read_frame(self.ptr, &mut pptr, &mut tb_num, &mut tb_den) };

        if ret < 0 {
            Err(Error::from_raw_error_code(ret))
        } else if pptr.is_null() {
            Ok(None)
        } else {
            let packet = unsafe { Packet::from_raw_ptr(pptr, TimeBase::new(tb_num, tb_den)) };

            Ok(Some(packet))
        }
    }

    /// Read packets to find stream info.
    pub fn find_stream_info(self) -> Result<DemuxerWithStreamInfo<T>, (Self, Error)> {
        let ret = unsafe { ffw_demuxer_find_stream_info(self.ptr) };

        if ret < 0 {
            return Err((self, Error::from_raw_error_code(ret)));
        }

        let stream_count = unsafe { ffw_demuxer_get_nb_streams(self.ptr) };

        let mut streams = Vec::with_capacity(stream_count as usize);

        for i in 0..stream_count {
            let ptr = unsafe { ffw_demuxer_get_stream(self.ptr, i as _) };

            if ptr.is_null() {
                return Err((self, Error::new("unable to get stream info")));
            }

            streams.push(unsafe { Stream::from_raw_ptr(ptr) });
        }

        let res = DemuxerWithStreamInfo {
            inner: self,
            streams,
        };

        Ok(res)
    }

    /// Get name of the detected input format.
    pub fn format_name(&self) -> &str {
        unsafe {
            let ptr = ffw_demuxer_get_format_name(self.ptr);

            if ptr.is_null() {
                "unknown"
            } else {
                CStr::from_ptr(ptr).to_str().unwrap_or("unknown")
            }
        }
    }
}

impl<T> Drop for Demuxer<T> {
    fn drop(&mut self) {
        unsafe { ffw_demuxer_free(self.ptr) }
    }
}

unsafe impl<T> Send for Demuxer<T> where T: Send {}
unsafe impl<T> Sync for Demuxer<T> where T: Sync {}

/// Demuxer with information about individual streams.
pub struct DemuxerWithStreamInfo<T> {
    inner: Demuxer<T>,
    streams: Vec<Stream>,
}

impl<T> DemuxerWithStreamInfo<T> {
    /// Get streams.
    pub fn streams(&self) -> &[Stream] {
        &self.streams
    }
}

impl<T> Deref for DemuxerWithStreamInfo<T> {
    type Target = Demuxer<T>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> DerefMut for DemuxerWithStreamInfo<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
