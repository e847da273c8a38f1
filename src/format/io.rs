//! Elementary IO used by the muxer and demuxer.

use std::{
    io::{self, Read, Seek, SeekFrom, Write},
    os::raw::{c_int, c_void},
    slice,
};

type ReadPacketCallback =
    extern "C" fn(opaque: *mut c_void, buffer: *mut u8, buffer_size: c_int) -> c_int;
type WritePacketCallback =
    extern "C" fn(opaque: *mut c_void, buffer: *mut u8, buffer_size: c_int) -> c_int;
type SeekCallback = extern "C" fn(opaque: *mut c_void, offset: i64, whence: c_int) -> i64;

extern "C" {
    fn ffw_io_is_avseek_size(whence: c_int) -> c_int;

    fn ffw_io_context_new(
        buffer_size: c_int,
        write_flag: c_int,
        opaque: *mut c_void,
        read_packet: Option<ReadPacketCallback>,
        write_packet: Option<WritePacketCallback>,
        seek: Option<SeekCallback>,
    ) -> *mut c_void;
    fn ffw_io_context_free(context: *mut c_void);
}

/// Size of the AVIO buffer.
const IO_BUFFER_SIZE: c_int = 32_768;

/// IO context.
#[allow(clippy::upper_case_acronyms)]
pub(crate) struct IOContext {
    ptr: *mut c_void,
}

impl IOContext {
    /// Create a new IO context from its raw representation.
    unsafe fn from_raw_ptr(ptr: *mut c_void) -> Self {
        IOContext { ptr }
    }

    /// Get a mut pointer to the underlying AVIOContext.
    pub fn as_mut_ptr(&mut self) -> *mut c_void {
        self.ptr
    }
}

impl Drop for IOContext {
    fn drop(&mut self) {
        unsafe { ffw_io_context_free(self.ptr) }
    }
}

unsafe impl Send for IOContext {}
unsafe impl Sync for IOContext {}

/// Translate a given IO error into an FFmpeg error code.
fn to_ffmpeg_error(err: &io::Error) -> c_int {
    if let Some(code) = err.raw_os_error() {
        unsafe { crate::ffw_error_from_posix(code as _) }
    } else if err.kind() == io::ErrorKind::WouldBlock {
        unsafe { crate::ffw_error_would_block() }
    } else {
        unsafe { crate::ffw_error_unknown() }
    }
}

/// A SeekCallback function for the IO.
extern "C" fn io_seek<T>(opaque: *mut c_void, offset: i64, whence: c_int) -> i64
where
    T: Seek,
{
    let stream = unsafe { &mut *(opaque as *mut T) };

    let is_avseek_size = unsafe { ffw_io_is_avseek_size(whence) != 0 };

    let res = if is_avseek_size {
        stream_len(stream)
    } else {
        stream.seek(SeekFrom::Start(offset as u64))
    };

    match res {
        Ok(position) => position as i64,
        Err(err) => to_ffmpeg_error(&err) as i64,
    }
}

/// Get length of a given seekable stream without changing its position.
fn stream_len<T>(stream: &mut T) -> io::Result<u64>
where
    T: Seek,
{
    let current = stream.stream_position()?;
    let end = stream.seek(SeekFrom::End(0))?;

    if current != end {
        stream.seek(SeekFrom::Start(current))?;
    }

    Ok(end)
}

/// A ReadPacketCallback function for the IO.
extern "C" fn io_read_packet<T>(opaque: *mut c_void, buffer: *mut u8, buffer_size: c_int) -> c_int
where
    T: Read,
{
    let input = unsafe { &mut *(opaque as *mut T) };

    let buffer = unsafe { slice::from_raw_parts_mut(buffer, buffer_size as usize) };

    match input.read(buffer) {
        Ok(0) => unsafe { crate::ffw_error_eof() },
        Ok(n) => n as c_int,
        Err(err) => to_ffmpeg_error(&err),
    }
}

/// A WritePacketCallback function for the IO.
extern "C" fn io_write_packet<T>(opaque: *mut c_void, buffer: *mut u8, buffer_size: c_int) -> c_int
where
    T: Write,
{
    let output = unsafe { &mut *(opaque as *mut T) };

    // a null/empty buffer is a flush request
    if buffer.is_null() || buffer_size <= 0 {
        return match output.flush() {
            Ok(()) => 0,
            Err(err) => to_ffmpeg_error(&err),
        };
    }

    let buffer = unsafe { slice::from_raw_parts(buffer, buffer_size as usize) };

    // AVIO does not retry partial writes
    match output.write_all(buffer) {
        Ok(()) => buffer_size,
        Err(err) => to_ffmpeg_error(&err),
    }
}

/// An AVIO IO that connects FFmpeg AVIO context with Rust streams.
#[allow(clippy::upper_case_acronyms)]
pub struct IO<T> {
    io_context: IOContext,
    // accessed by the AVIO callbacks only
    #[allow(dead_code)]
    stream: Box<T>,
}

impl<T> IO<T> {
    /// Create a new IO.
    fn new(
        stream: T,
        read_packet: Option<ReadPacketCallback>,
        write_packet: Option<WritePacketCallback>,
        seek: Option<SeekCallback>,
    ) -> Self {
        let mut stream = Box::new(stream);
        let opaque_ptr = stream.as_mut() as *mut T as *mut c_void;

        let write_flag = i32::from(write_packet.is_some());

        let io_context = unsafe {
            ffw_io_context_new(
                IO_BUFFER_SIZE,
                write_flag,
                opaque_ptr,
                read_packet,
                write_packet,
                seek,
            )
        };

        if io_context.is_null() {
            panic!("unable to allocate an AVIO context");
        }

        let io_context = unsafe { IOContext::from_raw_ptr(io_context) };

        Self { io_context, stream }
    }

    /// Get mutable reference to the underlying IO context.
    pub(crate) fn io_context_mut(&mut self) -> &mut IOContext {
        &mut self.io_context
    }
}

impl<T> IO<T>
where
    T: Read + Seek,
{
    /// Create a new IO from a given seekable input stream.
    pub fn from_seekable_read_stream(stream: T) -> Self {
        Self::new(stream, Some(io_read_packet::<T>), None, Some(io_seek::<T>))
    }
}

impl<T> IO<T>
where
    T: Write + Seek,
{
    /// Create a new IO from a given seekable output stream.
    pub fn from_seekable_write_stream(stream: T) -> Self {
        Self::new(stream, None, Some(io_write_packet::<T>), Some(io_seek::<T>))
    }
}
