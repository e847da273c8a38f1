//! A/V muxer.

use std::{
    ffi::{CStr, CString},
    io::Write,
    os::raw::{c_char, c_int, c_uint, c_void},
    ptr,
};

use crate::{
    codec::CodecParameters,
    format::{io::IO, stream::Stream},
    packet::Packet,
    time::TimeBase,
    Error,
};

extern "C" {
    fn ffw_guess_output_format(
        short_name: *const c_char,
        file_name: *const c_char,
        mime_type: *const c_char,
    ) -> *const c_void;
    fn ffw_output_format_needs_file(format: *const c_void) -> c_int;
    fn ffw_output_format_get_name(format: *const c_void) -> *const c_char;

    fn ffw_muxer_new(format: *const c_void, url: *const c_char) -> *mut c_void;
    fn ffw_muxer_new_stream(muxer: *mut c_void, params: *const c_void) -> c_int;
    fn ffw_muxer_get_nb_streams(muxer: *const c_void) -> c_uint;
    fn ffw_muxer_get_stream(muxer: *mut c_void, index: c_uint) -> *mut c_void;
    fn ffw_muxer_set_io_context(muxer: *mut c_void, io_context: *mut c_void);
    fn ffw_muxer_write_header(muxer: *mut c_void) -> c_int;
    fn ffw_muxer_write_frame(muxer: *mut c_void, packet: *mut c_void) -> c_int;
    fn ffw_muxer_write_trailer(muxer: *mut c_void) -> c_int;
    fn ffw_muxer_free(muxer: *mut c_void);
}

/// FFmpeg output format.
#[derive(Copy, Clone)]
pub struct OutputFormat {
    ptr: *const c_void,
}

impl OutputFormat {
    /// Try to guess an output format from a file name.
    pub fn guess_from_file_name(file_name: &str) -> Option<OutputFormat> {
        let file_name = CString::new(file_name).ok()?;

        let ptr = unsafe { ffw_guess_output_format(ptr::null(), file_name.as_ptr(), ptr::null()) };

        if ptr.is_null() {
            return None;
        }

        Some(OutputFormat { ptr })
    }

    /// Check if the format writes into a file (i.e. it needs an IO).
    pub fn needs_file(&self) -> bool {
        unsafe { ffw_output_format_needs_file(self.ptr) != 0 }
    }

    /// Get the short name of the format.
    pub fn name(&self) -> &'static str {
        unsafe {
            let ptr = ffw_output_format_get_name(self.ptr);

            if ptr.is_null() {
                "unknown"
            } else {
                CStr::from_ptr(ptr).to_str().unwrap_or("unknown")
            }
        }
    }
}

unsafe impl Send for OutputFormat {}
unsafe impl Sync for OutputFormat {}

/// Muxer.
///
/// Streams are added first, then the IO is attached (if the format needs
/// one) and the header is written. Packets are written as they come
/// without any interleaving.
pub struct Muxer<T> {
    ptr: *mut c_void,
    format: OutputFormat,
    // released after the muxer context
    #[allow(dead_code)]
    io: Option<IO<T>>,
}

impl<T> Muxer<T> {
    /// Allocate a new muxer context for a given output format.
    ///
    /// # Arguments
    /// * `format` - output format
    /// * `url` - output URL stored in the context (used by some formats
    ///   and for logging only)
    pub fn new(format: OutputFormat, url: &str) -> Result<Muxer<T>, Error> {
        let url = CString::new(url)
            .map_err(|_| Error::invalid_arguments(format!("invalid output URL: {}", url)))?;

        let ptr = unsafe { ffw_muxer_new(format.ptr, url.as_ptr()) };

        if ptr.is_null() {
            return Err(Error::allocation("unable to allocate a muxer context"));
        }

        let res = Muxer {
            ptr,
            format,
            io: None,
        };

        Ok(res)
    }

    /// Get the output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Add a new stream with given parameters and return its index.
    pub fn add_stream(&mut self, params: &CodecParameters) -> Result<usize, Error> {
        let ret = unsafe { ffw_muxer_new_stream(self.ptr, params.as_ptr()) };

        if ret < 0 {
            return Err(Error::from_raw_error_code(ret));
        }

        Ok(ret as usize)
    }

    /// Get the number of streams.
    pub fn stream_count(&self) -> usize {
        unsafe { ffw_muxer_get_nb_streams(self.ptr) as _ }
    }

    /// Get time base of a given stream. The time base may change when the
    /// header is written.
    pub fn stream_time_base(&self, index: usize) -> Option<TimeBase> {
        if index >= self.stream_count() {
            return None;
        }

        let ptr = unsafe { ffw_muxer_get_stream(self.ptr, index as _) };

        if ptr.is_null() {
            return None;
        }

        let stream = unsafe { Stream::from_raw_ptr(ptr) };

        Some(stream.time_base())
    }

    /// Write the container header.
    pub fn write_header(&mut self) -> Result<(), Error> {
        let ret = unsafe { ffw_muxer_write_header(self.ptr) };

        if ret < 0 {
            Err(Error::from_raw_error_code(ret))
        } else {
            Ok(())
        }
    }

    /// Write a given packet. The packet stream index and time base must
    /// match one of the muxer streams.
    pub fn push(&mut self, mut packet: Packet) -> Result<(), Error> {
        if packet.stream_index() >= self.stream_count() {
            return Err(Error::invalid_arguments(format!(
                "no such output stream: {}",
                packet.stream_index()
            )));
        }

        let ret = unsafe { ffw_muxer_write_frame(self.ptr, packet.as_mut_ptr()) };

        if ret < 0 {
            Err(Error::from_raw_error_code(ret))
        } else {
            Ok(())
        }
    }

    /// Write the container trailer and flush the IO.
    pub fn write_trailer(&mut self) -> Result<(), Error> {
        let ret = unsafe { ffw_muxer_write_trailer(self.ptr) };

        if ret < 0 {
            Err(Error::from_raw_error_code(ret))
        } else {
            Ok(())
        }
    }
}

impl<T> Muxer<T>
where
    T: Write,
{
    /// Attach a given IO to the muxer. Any previously attached IO is
    /// dropped.
    pub fn set_io(&mut self, mut io: IO<T>) {
        let io_context_ptr = io.io_context_mut().as_mut_ptr();

        unsafe { ffw_muxer_set_io_context(self.ptr, io_context_ptr) }

        self.io = Some(io);
    }
}

impl<T> Drop for Muxer<T> {
    fn drop(&mut self) {
        unsafe { ffw_muxer_free(self.ptr) }
    }
}

unsafe impl<T> Send for Muxer<T> where T: Send {}
unsafe impl<T> Sync for Muxer<T> where T: Sync {}
