//! Container abstraction used by the remux pipeline.
//!
//! The traits describe exactly the operations the pipeline needs from an
//! input and an output container. `ffmpeg` contains the implementation on
//! top of the native FFmpeg wrappers.

pub mod ffmpeg;

#[cfg(test)]
pub(crate) mod fake;

use crate::{
    codec::{CodecTag, MediaType},
    time::TimeBase,
    Error,
};

pub use self::ffmpeg::FFmpegAdapter;

/// Codec parameters of a container stream.
pub trait StreamParameters {
    /// Get media type of the stream.
    fn media_type(&self) -> MediaType;

    /// Get codec name.
    fn codec_name(&self) -> &str;

    /// Set the container-specific codec tag.
    fn set_codec_tag(&mut self, codec_tag: CodecTag);
}

/// Stream of an input container.
pub trait ContainerStream {
    type Parameters: StreamParameters;

    /// Get time base of the stream timestamps.
    fn time_base(&self) -> TimeBase;

    /// Get media type of the stream. Unlike `codec_parameters()` this never
    /// copies anything.
    fn media_type(&self) -> MediaType;

    /// Get a copy of the stream codec parameters.
    fn codec_parameters(&self) -> Result<Self::Parameters, Error>;
}

/// Packet read from an input container.
pub trait ContainerPacket: Sized {
    /// Get index of the stream the packet belongs to.
    fn stream_index(&self) -> usize;

    /// Set the stream index.
    fn with_stream_index(self, index: usize) -> Self;

    /// Get time base of the packet timestamps.
    fn time_base(&self) -> TimeBase;

    /// Rescale the packet timestamps and duration into a given time base.
    fn with_time_base(self, time_base: TimeBase) -> Self;
}

/// Opened input container with probed stream information.
pub trait InputContainer {
    type Stream: ContainerStream;
    type Packet: ContainerPacket;

    /// Get name of the detected container format.
    fn format_name(&self) -> &str;

    /// Get all input streams in their original order.
    fn streams(&self) -> &[Self::Stream];

    /// Read the next packet or `None` at the end of stream.
    fn read_packet(&mut self) -> Result<Option<Self::Packet>, Error>;
}

/// Output container.
///
/// Streams must be added before the header is written. Packets must be
/// written between the header and the trailer.
pub trait OutputContainer {
    type Parameters: StreamParameters;
    type Packet: ContainerPacket;

    /// Get name of the output container format.
    fn format_name(&self) -> &str;

    /// Create a new output stream with given codec parameters and return its
    /// index.
    fn add_stream(&mut self, params: &Self::Parameters) -> Result<usize, Error>;

    /// Get time base of a given output stream.
    fn stream_time_base(&self, index: usize) -> Option<TimeBase>;

    /// Check if the output format writes into a file.
    fn needs_file(&self) -> bool;

    /// Open the output file if the format needs one.
    fn open_file(&mut self) -> Result<(), Error>;

    /// Write the container header.
    fn write_header(&mut self) -> Result<(), Error>;

    /// Write a given packet.
    fn write_packet(&mut self, packet: Self::Packet) -> Result<(), Error>;

    /// Write the container trailer.
    fn write_trailer(&mut self) -> Result<(), Error>;
}

/// Factory of input and output containers.
pub trait ContainerAdapter {
    type Parameters: StreamParameters;
    type Packet: ContainerPacket;
    type Stream: ContainerStream<Parameters = Self::Parameters>;
    type Input: InputContainer<Stream = Self::Stream, Packet = Self::Packet>;
    type Output: OutputContainer<Parameters = Self::Parameters, Packet = Self::Packet>;

    /// Open a given input file and probe its streams.
    fn open_input(&self, path: &str) -> Result<Self::Input, Error>;

    /// Allocate an output container for a given path. The format is guessed
    /// from the path. No file is created until `open_file()` is called.
    fn open_output(&self, path: &str) -> Result<Self::Output, Error>;
}
