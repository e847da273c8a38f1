//! In-memory containers recording every operation performed on them.

use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use crate::{
    codec::{CodecTag, MediaType},
    container::{
        ContainerAdapter, ContainerPacket, ContainerStream, InputContainer, OutputContainer,
        StreamParameters,
    },
    time::{TimeBase, Timestamp},
    Error,
};

/// Operation performed on a fake container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    OpenInput(String),
    OpenOutput(String),
    AddStream {
        media_type: MediaType,
        codec_name: String,
        codec_tag: CodecTag,
    },
    OpenFile,
    WriteHeader,
    WritePacket(FakePacket),
    WriteTrailer,
    ReleaseOutput,
    ReleaseInput,
}

/// Shared call log.
pub type CallLog = Rc<RefCell<Vec<Call>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeParameters {
    pub media_type: MediaType,
    pub codec_name: String,
    pub codec_tag: CodecTag,
}

impl StreamParameters for FakeParameters {
    fn media_type(&self) -> MediaType {
        self.media_type
    }

    fn codec_name(&self) -> &str {
        &self.codec_name
    }

    fn set_codec_tag(&mut self, codec_tag: CodecTag) {
        self.codec_tag = codec_tag;
    }
}

#[derive(Debug, Clone)]
pub struct FakeStream {
    pub time_base: TimeBase,
    pub params: FakeParameters,
    pub broken: bool,
}

impl FakeStream {
    /// Create a new stream with a given media type, codec and time base.
    pub fn new(media_type: MediaType, codec_name: &str, time_base: TimeBase) -> Self {
        Self {
            time_base,
            params: FakeParameters {
                media_type,
                codec_name: codec_name.to_string(),
                codec_tag: CodecTag::from(b"fake"),
            },
            broken: false,
        }
    }

    /// Make copying of the codec parameters fail.
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }
}

impl ContainerStream for FakeStream {
    type Parameters = FakeParameters;

    fn time_base(&self) -> TimeBase {
        self.time_base
    }

    fn media_type(&self) -> MediaType {
        self.params.media_type
    }

    fn codec_parameters(&self) -> Result<FakeParameters, Error> {
        if self.broken {
            Err(Error::allocation("unable to copy codec parameters"))
        } else {
            Ok(self.params.clone())
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FakePacket {
    pub stream_index: usize,
    pub pts: i64,
    pub dts: i64,
    pub duration: i64,
    pub time_base: TimeBase,
}

impl FakePacket {
    pub fn new(stream_index: usize, pts: i64, duration: i64, time_base: TimeBase) -> Self {
        Self {
            stream_index,
            pts,
            dts: pts,
            duration,
            time_base,
        }
    }
}

impl ContainerPacket for FakePacket {
    fn stream_index(&self) -> usize {
        self.stream_index
    }

    fn with_stream_index(mut self, index: usize) -> Self {
        self.stream_index = index;
        self
    }

    fn time_base(&self) -> TimeBase {
        self.time_base
    }

    fn with_time_base(mut self, time_base: TimeBase) -> Self {
        let rescale = |ts| {
            Timestamp::new(ts, self.time_base)
                .with_time_base(time_base)
                .timestamp()
        };

        self.pts = rescale(self.pts);
        self.dts = rescale(self.dts);

        if self.duration > 0 {
            self.duration = rescale(self.duration);
        }

        self.time_base = time_base;
        self
    }
}

pub struct FakeInput {
    streams: Vec<FakeStream>,
    packets: VecDeque<Result<FakePacket, Error>>,
    log: CallLog,
}

impl InputContainer for FakeInput {
    type Stream = FakeStream;
    type Packet = FakePacket;

    fn format_name(&self) -> &str {
        "fake"
    }

    fn streams(&self) -> &[FakeStream] {
        &self.streams
    }

    fn read_packet(&mut self) -> Result<Option<FakePacket>, Error> {
        self.packets.pop_front().transpose()
    }
}

impl Drop for FakeInput {
    fn drop(&mut self) {
        self.log.borrow_mut().push(Call::ReleaseInput);
    }
}

pub struct FakeOutput {
    time_base: TimeBase,
    streams: usize,
    written: usize,
    config: OutputConfig,
    log: CallLog,
}

impl FakeOutput {
    fn record(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl OutputContainer for FakeOutput {
    type Parameters = FakeParameters;
    type Packet = FakePacket;

    fn format_name(&self) -> &str {
        "fake"
    }

    fn add_stream(&mut self, params: &FakeParameters) -> Result<usize, Error> {
        if self.config.fail_add_stream == Some(self.streams) {
            return Err(Error::new("cannot allocate memory"));
        }

        self.record(Call::AddStream {
            media_type: params.media_type,
            codec_name: params.codec_name.clone(),
            codec_tag: params.codec_tag,
        });

        self.streams += 1;

        Ok(self.streams - 1)
    }

    fn stream_time_base(&self, index: usize) -> Option<TimeBase> {
        if index < self.streams {
            Some(self.time_base)
        } else {
            None
        }
    }

    fn needs_file(&self) -> bool {
        self.config.needs_file
    }

    fn open_file(&mut self) -> Result<(), Error> {
        if self.config.needs_file {
            self.record(Call::OpenFile);
        }

        Ok(())
    }

    fn write_header(&mut self) -> Result<(), Error> {
        if self.config.fail_header {
            return Err(Error::file("unable to write header for out.fake: failure"));
        }

        self.record(Call::WriteHeader);

        // muxers are allowed to pick their own time base
        self.time_base = self.config.time_base;

        Ok(())
    }

    fn write_packet(&mut self, packet: FakePacket) -> Result<(), Error> {
        if self.config.fail_write == Some(self.written) {
            return Err(Error::new("broken pipe"));
        }

        self.written += 1;

        self.record(Call::WritePacket(packet));

        Ok(())
    }

    fn write_trailer(&mut self) -> Result<(), Error> {
        if self.config.fail_trailer {
            return Err(Error::file("unable to write trailer for out.fake: failure"));
        }

        self.record(Call::WriteTrailer);

        Ok(())
    }
}

impl Drop for FakeOutput {
    fn drop(&mut self) {
        self.record(Call::ReleaseOutput);
    }
}

#[derive(Debug, Clone)]
struct OutputConfig {
    time_base: TimeBase,
    needs_file: bool,
    fail_add_stream: Option<usize>,
    fail_header: bool,
    fail_write: Option<usize>,
    fail_trailer: bool,
}

/// Adapter creating fake containers. Every container created by the
/// adapter shares the adapter call log.
pub struct FakeAdapter {
    streams: Vec<FakeStream>,
    packets: Vec<Result<FakePacket, Error>>,
    missing_input: bool,
    unknown_output: bool,
    output: OutputConfig,
    log: CallLog,
}

impl FakeAdapter {
    /// Create a new adapter for inputs with given streams.
    pub fn new(streams: Vec<FakeStream>) -> Self {
        Self {
            streams,
            packets: Vec::new(),
            missing_input: false,
            unknown_output: false,
            output: OutputConfig {
                time_base: TimeBase::new(1, 1_000),
                needs_file: true,
                fail_add_stream: None,
                fail_header: false,
                fail_write: None,
                fail_trailer: false,
            },
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Set packets returned by the input.
    pub fn with_packets<I>(mut self, packets: I) -> Self
    where
        I: IntoIterator<Item = FakePacket>,
    {
        self.packets = packets.into_iter().map(Ok).collect();
        self
    }

    /// Make the input return a given error after all packets.
    pub fn with_read_error(mut self, err: Error) -> Self {
        self.packets.push(Err(err));
        self
    }

    /// Set time base assigned to output streams when writing the header.
    pub fn with_output_time_base(mut self, time_base: TimeBase) -> Self {
        self.output.time_base = time_base;
        self
    }

    pub fn with_missing_input(mut self) -> Self {
        self.missing_input = true;
        self
    }

    pub fn with_unknown_output(mut self) -> Self {
        self.unknown_output = true;
        self
    }

    pub fn with_no_file_output(mut self) -> Self {
        self.output.needs_file = false;
        self
    }

    /// Make creation of the n-th output stream fail.
    pub fn with_add_stream_failure(mut self, n: usize) -> Self {
        self.output.fail_add_stream = Some(n);
        self
    }

    pub fn with_header_failure(mut self) -> Self {
        self.output.fail_header = true;
        self
    }

    /// Make writing of the n-th packet fail.
    pub fn with_write_failure(mut self, n: usize) -> Self {
        self.output.fail_write = Some(n);
        self
    }

    pub fn with_trailer_failure(mut self) -> Self {
        self.output.fail_trailer = true;
        self
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    /// Get all written packets.
    pub fn written_packets(&self) -> Vec<FakePacket> {
        self.log
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::WritePacket(packet) => Some(*packet),
                _ => None,
            })
            .collect()
    }

    /// Count recorded calls matching a given predicate.
    pub fn count<F>(&self, f: F) -> usize
    where
        F: Fn(&Call) -> bool,
    {
        self.log.borrow().iter().filter(|call| f(call)).count()
    }
}

impl ContainerAdapter for FakeAdapter {
    type Parameters = FakeParameters;
    type Packet = FakePacket;
    type Stream = FakeStream;
    type Input = FakeInput;
    type Output = FakeOutput;

    fn open_input(&self, path: &str) -> Result<FakeInput, Error> {
        if self.missing_input {
            return Err(Error::file(format!(
                "unable to open {}: No such file or directory",
                path
            )));
        }

        self.log.borrow_mut().push(Call::OpenInput(path.to_string()));

        let res = FakeInput {
            streams: self.streams.clone(),
            packets: self.packets.iter().cloned().collect(),
            log: self.log.clone(),
        };

        Ok(res)
    }

    fn open_output(&self, path: &str) -> Result<FakeOutput, Error> {
        if self.unknown_output {
            return Err(Error::allocation(format!(
                "unable to guess output format for {}",
                path
            )));
        }

        self.log
            .borrow_mut()
            .push(Call::OpenOutput(path.to_string()));

        let res = FakeOutput {
            time_base: TimeBase::new(1, 90_000),
            streams: 0,
            written: 0,
            config: self.output.clone(),
            log: self.log.clone(),
        };

        Ok(res)
    }
}
