//! FFmpeg-backed containers.

use std::fs::File;

use crate::{
    codec::{CodecParameters, CodecTag, MediaType},
    container::{
        ContainerAdapter, ContainerPacket, ContainerStream, InputContainer, OutputContainer,
        StreamParameters,
    },
    format::{
        demuxer::{Demuxer, DemuxerWithStreamInfo},
        io::IO,
        muxer::{Muxer, OutputFormat},
        stream::Stream,
    },
    packet::Packet,
    time::TimeBase,
    Error, ErrorKind,
};

impl StreamParameters for CodecParameters {
    fn media_type(&self) -> MediaType {
        CodecParameters::media_type(self)
    }

    fn codec_name(&self) -> &str {
        CodecParameters::codec_name(self)
    }

    fn set_codec_tag(&mut self, codec_tag: CodecTag) {
        CodecParameters::set_codec_tag(self, codec_tag)
    }
}

impl ContainerStream for Stream {
    type Parameters = CodecParameters;

    fn time_base(&self) -> TimeBase {
        Stream::time_base(self)
    }

    fn media_type(&self) -> MediaType {
        Stream::media_type(self)
    }

    fn codec_parameters(&self) -> Result<CodecParameters, Error> {
        Stream::codec_parameters(self)
    }
}

impl ContainerPacket for Packet {
    fn stream_index(&self) -> usize {
        Packet::stream_index(self)
    }

    fn with_stream_index(self, index: usize) -> Self {
        Packet::with_stream_index(self, index)
    }

    fn time_base(&self) -> TimeBase {
        Packet::time_base(self)
    }

    fn with_time_base(self, time_base: TimeBase) -> Self {
        Packet::with_time_base(self, time_base)
    }
}

/// Input media file.
pub struct FileInput {
    demuxer: DemuxerWithStreamInfo<File>,
}

impl InputContainer for FileInput {
    type Stream = Stream;
    type Packet = Packet;

    fn format_name(&self) -> &str {
        self.demuxer.format_name()
    }

    fn streams(&self) -> &[Stream] {
        self.demuxer.streams()
    }

    fn read_packet(&mut self) -> Result<Option<Packet>, Error> {
        self.demuxer.take()
    }
}

/// Output media file.
pub struct FileOutput {
    path: String,
    muxer: Muxer<File>,
}

impl OutputContainer for FileOutput {
    type Parameters = CodecParameters;
    type Packet = Packet;

    fn format_name(&self) -> &str {
        self.muxer.format().name()
    }

    fn add_stream(&mut self, params: &CodecParameters) -> Result<usize, Error> {
        self.muxer.add_stream(params)
    }

    fn stream_time_base(&self, index: usize) -> Option<TimeBase> {
        self.muxer.stream_time_base(index)
    }

    fn needs_file(&self) -> bool {
        self.muxer.format().needs_file()
    }

    fn open_file(&mut self) -> Result<(), Error> {
        if !self.needs_file() {
            return Ok(());
        }

        let file = File::create(&self.path)
            .map_err(|err| Error::file(format!("unable to open output {}: {}", self.path, err)))?;

        self.muxer.set_io(IO::from_seekable_write_stream(file));

        Ok(())
    }

    fn write_header(&mut self) -> Result<(), Error> {
        self.muxer.write_header().map_err(|err| {
            err.context(
                ErrorKind::FileError,
                format!("unable to write header for {}", self.path),
            )
        })
    }

    fn write_packet(&mut self, packet: Packet) -> Result<(), Error> {
        self.muxer.push(packet)
    }

    fn write_trailer(&mut self) -> Result<(), Error> {
        self.muxer.write_trailer().map_err(|err| {
            err.context(
                ErrorKind::FileError,
                format!("unable to write trailer for {}", self.path),
            )
        })
    }
}

/// Container adapter working with local media files.
#[derive(Debug, Default, Copy, Clone)]
pub struct FFmpegAdapter;

impl FFmpegAdapter {
    /// Create a new adapter.
    pub fn new() -> Self {
        Self
    }
}

impl ContainerAdapter for FFmpegAdapter {
    type Parameters = CodecParameters;
    type Packet = Packet;
    type Stream = Stream;
    type Input = FileInput;
    type Output = FileOutput;

    fn open_input(&self, path: &str) -> Result<FileInput, Error> {
        let file = File::open(path)
            .map_err(|err| Error::file(format!("unable to open {}: {}", path, err)))?;

        let io = IO::from_seekable_read_stream(file);

        let demuxer = Demuxer::builder()?
            .url(path)?
            .build(io)
            .map_err(|err| err.context(ErrorKind::FileError, format!("unable to open {}", path)))?;

        let demuxer = demuxer.find_stream_info().map_err(|(_, err)| {
            err.context(
                ErrorKind::FileError,
                format!("unable to find stream information in {}", path),
            )
        })?;

        Ok(FileInput { demuxer })
    }

    fn open_output(&self, path: &str) -> Result<FileOutput, Error> {
        let format = OutputFormat::guess_from_file_name(path).ok_or_else(|| {
            Error::allocation(format!("unable to guess output format for {}", path))
        })?;

        let muxer = Muxer::new(format, path).map_err(|_| {
            Error::allocation(format!("unable to allocate output context for {}", path))
        })?;

        let res = FileOutput {
            path: path.to_string(),
            muxer,
        };

        Ok(res)
    }
}
