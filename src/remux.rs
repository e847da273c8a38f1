//! Remux pipeline.

use std::fmt::{self, Display, Formatter, Write as _};

use tracing::{debug, error, warn};

use crate::{
    container::{
        ContainerAdapter, ContainerPacket, ContainerStream, FFmpegAdapter, InputContainer,
        OutputContainer, StreamParameters,
    },
    stream_map::StreamMap,
    time::TimeBase,
    Error,
};

/// Validated remux request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemuxRequest {
    input: String,
    output: String,
    verbose: bool,
}

impl RemuxRequest {
    /// Create a new request. Both paths must be non-empty.
    pub fn new<I, O>(input: I, output: O, verbose: bool) -> Result<Self, Error>
    where
        I: Into<String>,
        O: Into<String>,
    {
        let input = input.into();
        let output = output.into();

        if input.is_empty() {
            return Err(Error::invalid_arguments("input path must not be empty"));
        } else if output.is_empty() {
            return Err(Error::invalid_arguments("output path must not be empty"));
        }

        let res = Self {
            input,
            output,
            verbose,
        };

        Ok(res)
    }

    /// Get the input path.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Get the output path.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Check if the container descriptions should be printed.
    pub fn verbose(&self) -> bool {
        self.verbose
    }
}

/// Summary of a finished remux.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RemuxReport {
    /// Number of input streams.
    pub input_streams: usize,
    /// Number of output streams.
    pub output_streams: usize,
    /// Number of packets written into the output.
    pub packets_copied: u64,
    /// Number of packets of dropped or unknown streams.
    pub packets_dropped: u64,
    /// Set if all input packets were read.
    pub completed: bool,
}

impl Display for RemuxReport {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        write!(
            f,
            "{} of {} streams, {} packets copied, {} packets dropped",
            self.output_streams, self.input_streams, self.packets_copied, self.packets_dropped
        )?;

        if !self.completed {
            f.write_str(" (incomplete)")?;
        }

        Ok(())
    }
}

/// State of the remux pipeline.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RemuxState {
    Init,
    InputOpened,
    OutputOpened,
    StreamsMapped,
    HeaderWritten,
    Copying,
    TrailerWritten,
    Failed,
}

/// Remux engine.
pub struct Remuxer<A = FFmpegAdapter> {
    adapter: A,
    state: RemuxState,
}

impl Remuxer<FFmpegAdapter> {
    /// Create a new remuxer working with local media files.
    pub fn new() -> Self {
        Self::with_adapter(FFmpegAdapter::new())
    }
}

impl Default for Remuxer<FFmpegAdapter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> Remuxer<A>
where
    A: ContainerAdapter,
{
    /// Create a new remuxer using a given container adapter.
    pub fn with_adapter(adapter: A) -> Self {
        Self {
            adapter,
            state: RemuxState::Init,
        }
    }

    /// Get the current pipeline state.
    pub fn state(&self) -> RemuxState {
        self.state
    }

    /// Get the container adapter.
    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Remux a given input into a given output.
    ///
    /// Both containers are released before the method returns, no matter
    /// where the pipeline stops.
    pub fn run(&mut self, request: &RemuxRequest) -> Result<RemuxReport, Error> {
        self.state = RemuxState::Init;

        let res = self.remux(request);

        if res.is_err() {
            self.transition(RemuxState::Failed);
        }

        res
    }

    /// Run the pipeline.
    fn remux(&mut self, request: &RemuxRequest) -> Result<RemuxReport, Error> {
        let mut input = self.adapter.open_input(&request.input)?;

        self.transition(RemuxState::InputOpened);

        if request.verbose {
            print!("{}", describe_input(&input, &request.input)?);
        }

        let mut output = self.adapter.open_output(&request.output)?;

        self.transition(RemuxState::OutputOpened);

        let map = StreamMap::build(input.streams(), &mut output)?;

        self.transition(RemuxState::StreamsMapped);

        if request.verbose {
            print!("{}", describe_output(&input, &output, &map, &request.output)?);
        }

        output.open_file()?;
        output.write_header()?;

        self.transition(RemuxState::HeaderWritten);

        // the muxer may change the time bases while writing the header
        let time_bases = (0..map.kept())
            .map(|index| {
                output.stream_time_base(index).ok_or_else(|| {
                    Error::new(format!("missing time base of output stream #{}", index))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut report = RemuxReport {
            input_streams: map.len(),
            output_streams: map.kept(),
            ..Default::default()
        };

        self.transition(RemuxState::Copying);

        let completed = copy_packets(&mut input, &mut output, &map, &time_bases, &mut report);

        report.completed = completed;

        output.write_trailer()?;

        self.transition(RemuxState::TrailerWritten);

        Ok(report)
    }

    /// Move to a given state.
    fn transition(&mut self, state: RemuxState) {
        debug!(from = ?self.state, to = ?state, "remux state changed");

        self.state = state;
    }
}

/// Copy all packets from the input into the output. The function returns
/// `true` if the input was fully drained.
fn copy_packets<I, O>(
    input: &mut I,
    output: &mut O,
    map: &StreamMap,
    time_bases: &[TimeBase],
    report: &mut RemuxReport,
) -> bool
where
    I: InputContainer,
    O: OutputContainer<Packet = I::Packet>,
{
    loop {
        let packet = match input.read_packet() {
            Ok(Some(packet)) => packet,
            Ok(None) => return true,
            Err(err) => {
                warn!("unable to read packet: {}", err);
                return false;
            }
        };

        let input_index = packet.stream_index();

        let mapped = map
            .lookup(input_index)
            .and_then(|index| Some((index, *time_bases.get(index)?)));

        let (output_index, time_base) = match mapped {
            Some(mapped) => mapped,
            None => {
                report.packets_dropped += 1;
                continue;
            }
        };

        let packet = packet
            .with_stream_index(output_index)
            .with_time_base(time_base);

        if let Err(err) = output.write_packet(packet) {
            error!(stream = input_index, "unable to write packet: {}", err);

            return false;
        }

        report.packets_copied += 1;
    }
}

/// Describe a given input container. Streams that will not be copied are
/// marked as dropped.
fn describe_input<I>(input: &I, path: &str) -> Result<String, Error>
where
    I: InputContainer,
{
    let mut res = String::new();

    writeln!(res, "Input #0, {}, from '{}':", input.format_name(), path)
        .map_err(Error::new)?;

    for (index, stream) in input.streams().iter().enumerate() {
        let params = stream.codec_parameters()?;
        let time_base = stream.time_base();

        write!(
            res,
            "  Stream #0:{}: {} ({}), time base {}/{}",
            index,
            params.media_type(),
            params.codec_name(),
            time_base.num(),
            time_base.den()
        )
        .map_err(Error::new)?;

        if !stream.media_type().is_elementary() {
            res.push_str(", dropped");
        }

        res.push('\n');
    }

    Ok(res)
}

/// Describe a given output container.
fn describe_output<I, O>(
    input: &I,
    output: &O,
    map: &StreamMap,
    path: &str,
) -> Result<String, Error>
where
    I: InputContainer,
    O: OutputContainer,
{
    let mut res = String::new();

    writeln!(res, "Output #0, {}, to '{}':", output.format_name(), path)
        .map_err(Error::new)?;

    for (input_index, stream) in input.streams().iter().enumerate() {
        if let Some(output_index) = map.lookup(input_index) {
            let params = stream.codec_parameters()?;

            writeln!(
                res,
                "  Stream #0:{}: {} ({}), mapped from #0:{}",
                output_index,
                params.media_type(),
                params.codec_name(),
                input_index
            )
            .map_err(Error::new)?;
        }
    }

    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::{describe_input, describe_output, RemuxReport, RemuxRequest, RemuxState, Remuxer};

    use crate::{
        codec::MediaType,
        container::{
            fake::{Call, FakeAdapter, FakePacket, FakeStream},
            ContainerAdapter,
        },
        stream_map::StreamMap,
        time::{TimeBase, Timestamp},
        Error, ErrorKind,
    };

    const VIDEO_TB: TimeBase = TimeBase::new(1, 90_000);
    const AUDIO_TB: TimeBase = TimeBase::new(1, 48_000);
    const DATA_TB: TimeBase = TimeBase::new(1, 1_000);

    fn streams() -> Vec<FakeStream> {
        vec![
            FakeStream::new(MediaType::Video, "h264", VIDEO_TB),
            FakeStream::new(MediaType::Data, "bin_data", DATA_TB),
            FakeStream::new(MediaType::Audio, "aac", AUDIO_TB),
        ]
    }

    fn packets() -> Vec<FakePacket> {
        vec![
            FakePacket::new(0, 0, 3_000, VIDEO_TB),
            FakePacket::new(2, 0, 1_024, AUDIO_TB),
            FakePacket::new(1, 0, 40, DATA_TB),
            FakePacket::new(0, 3_000, 3_000, VIDEO_TB),
            FakePacket::new(2, 1_024, 1_024, AUDIO_TB),
            FakePacket::new(7, 0, 0, DATA_TB),
            FakePacket::new(0, 6_000, 3_000, VIDEO_TB),
        ]
    }

    fn request() -> RemuxRequest {
        RemuxRequest::new("in.fake", "out.fake", false).unwrap()
    }

    #[test]
    fn test_request_validation() {
        let request = RemuxRequest::new("in.mkv", "out.mp4", true).unwrap();

        assert_eq!(request.input(), "in.mkv");
        assert_eq!(request.output(), "out.mp4");
        assert!(request.verbose());

        let err = RemuxRequest::new("", "out.mp4", false).err().unwrap();

        assert_eq!(err.kind(), ErrorKind::InvalidArguments);

        let err = RemuxRequest::new("in.mkv", "", false).err().unwrap();

        assert_eq!(err.kind(), ErrorKind::InvalidArguments);
    }

    #[test]
    fn test_remux() {
        let adapter = FakeAdapter::new(streams()).with_packets(packets());

        let mut remuxer = Remuxer::with_adapter(adapter);

        let report = remuxer.run(&request()).unwrap();

        assert_eq!(remuxer.state(), RemuxState::TrailerWritten);

        assert_eq!(
            report,
            RemuxReport {
                input_streams: 3,
                output_streams: 2,
                packets_copied: 5,
                packets_dropped: 2,
                completed: true,
            }
        );

        let adapter = remuxer.adapter();

        let calls = adapter.calls();

        assert_eq!(calls[0], Call::OpenInput(String::from("in.fake")));
        assert_eq!(calls[1], Call::OpenOutput(String::from("out.fake")));

        let position = |expected: &Call| calls.iter().position(|call| call == expected).unwrap();

        let header = position(&Call::WriteHeader);
        let trailer = position(&Call::WriteTrailer);

        assert!(position(&Call::OpenFile) < header);
        assert!(header < trailer);

        for (index, call) in calls.iter().enumerate() {
            if let Call::WritePacket(_) = call {
                assert!(index > header && index < trailer);
            }
        }

        // both containers are released exactly once, output first
        assert_eq!(&calls[calls.len() - 2..], &[Call::ReleaseOutput, Call::ReleaseInput]);
        assert_eq!(adapter.count(|call| *call == Call::ReleaseOutput), 1);
        assert_eq!(adapter.count(|call| *call == Call::ReleaseInput), 1);
    }

    #[test]
    fn test_packets_are_remapped_and_rescaled() {
        let adapter = FakeAdapter::new(streams()).with_packets(packets());

        let mut remuxer = Remuxer::with_adapter(adapter);

        remuxer.run(&request()).unwrap();

        let written = remuxer.adapter().written_packets();

        let output_tb = TimeBase::new(1, 1_000);

        let expected = vec![
            (0, 0, 33),
            (1, 0, 21),
            (0, 33, 33),
            (1, 21, 21),
            (0, 67, 33),
        ];

        let actual = written
            .iter()
            .map(|packet| {
                assert_eq!(packet.time_base, output_tb);
                assert_eq!(packet.pts, packet.dts);

                (packet.stream_index, packet.pts, packet.duration)
            })
            .collect::<Vec<_>>();

        assert_eq!(actual, expected);
    }

    #[test]
    fn test_null_timestamps_are_preserved() {
        let null = Timestamp::null().timestamp();

        let packet = FakePacket {
            stream_index: 0,
            pts: null,
            dts: null,
            duration: 0,
            time_base: VIDEO_TB,
        };

        let adapter = FakeAdapter::new(streams()).with_packets(vec![packet]);

        let mut remuxer = Remuxer::with_adapter(adapter);

        remuxer.run(&request()).unwrap();

        let written = remuxer.adapter().written_packets();

        assert_eq!(written.len(), 1);
        assert_eq!(written[0].pts, null);
        assert_eq!(written[0].dts, null);
        assert_eq!(written[0].duration, 0);
    }

    #[test]
    fn test_rescaling_is_monotonic() {
        let input_tb = TimeBase::new(1001, 30_000);

        let packets = (0..1_000).map(|pts| FakePacket::new(0, pts, 1, input_tb));

        let adapter = FakeAdapter::new(vec![FakeStream::new(MediaType::Video, "h264", input_tb)])
            .with_packets(packets)
            .with_output_time_base(TimeBase::new(1, 25));

        let mut remuxer = Remuxer::with_adapter(adapter);

        remuxer.run(&request()).unwrap();

        let written = remuxer.adapter().written_packets();

        assert_eq!(written.len(), 1_000);
        assert!(written.windows(2).all(|w| w[0].pts <= w[1].pts));
    }

    #[test]
    fn test_no_elementary_streams() {
        let adapter = FakeAdapter::new(vec![FakeStream::new(
            MediaType::Data,
            "bin_data",
            DATA_TB,
        )])
        .with_packets(vec![FakePacket::new(0, 0, 40, DATA_TB)]);

        let mut remuxer = Remuxer::with_adapter(adapter);

        let report = remuxer.run(&request()).unwrap();

        assert_eq!(report.output_streams, 0);
        assert_eq!(report.packets_copied, 0);
        assert_eq!(report.packets_dropped, 1);
        assert!(report.completed);

        let adapter = remuxer.adapter();

        assert_eq!(adapter.count(|call| *call == Call::WriteHeader), 1);
        assert_eq!(adapter.count(|call| *call == Call::WriteTrailer), 1);
        assert!(adapter.written_packets().is_empty());
    }

    #[test]
    fn test_missing_input() {
        let adapter = FakeAdapter::new(streams()).with_missing_input();

        let mut remuxer = Remuxer::with_adapter(adapter);

        let err = remuxer.run(&request()).err().unwrap();

        assert_eq!(err.kind(), ErrorKind::FileError);
        assert!(err.message().contains("in.fake"));
        assert_eq!(remuxer.state(), RemuxState::Failed);

        // nothing has been opened
        assert!(remuxer.adapter().calls().is_empty());
    }

    #[test]
    fn test_unknown_output_format() {
        let adapter = FakeAdapter::new(streams()).with_unknown_output();

        let mut remuxer = Remuxer::with_adapter(adapter);

        let err = remuxer.run(&request()).err().unwrap();

        assert_eq!(err.kind(), ErrorKind::AllocationError);
        assert_eq!(remuxer.state(), RemuxState::Failed);

        assert_eq!(
            remuxer.adapter().calls(),
            vec![Call::OpenInput(String::from("in.fake")), Call::ReleaseInput]
        );
    }

    #[test]
    fn test_header_failure() {
        let adapter = FakeAdapter::new(streams())
            .with_packets(packets())
            .with_header_failure();

        let mut remuxer = Remuxer::with_adapter(adapter);

        let err = remuxer.run(&request()).err().unwrap();

        assert_eq!(err.kind(), ErrorKind::FileError);

        let adapter = remuxer.adapter();

        assert!(adapter.written_packets().is_empty());
        assert_eq!(adapter.count(|call| *call == Call::WriteTrailer), 0);
        assert_eq!(adapter.count(|call| *call == Call::ReleaseOutput), 1);
        assert_eq!(adapter.count(|call| *call == Call::ReleaseInput), 1);
    }

    #[test]
    fn test_write_failure_still_writes_trailer() {
        let adapter = FakeAdapter::new(streams())
            .with_packets(packets())
            .with_write_failure(2);

        let mut remuxer = Remuxer::with_adapter(adapter);

        let report = remuxer.run(&request()).unwrap();

        assert!(!report.completed);
        assert_eq!(report.packets_copied, 2);
        assert_eq!(remuxer.state(), RemuxState::TrailerWritten);

        let adapter = remuxer.adapter();

        assert_eq!(adapter.written_packets().len(), 2);
        assert_eq!(adapter.count(|call| *call == Call::WriteTrailer), 1);
    }

    #[test]
    fn test_read_error_ends_the_copy() {
        let adapter = FakeAdapter::new(streams())
            .with_packets(packets())
            .with_read_error(Error::new("invalid data found when processing input"));

        let mut remuxer = Remuxer::with_adapter(adapter);

        let report = remuxer.run(&request()).unwrap();

        assert!(!report.completed);
        assert_eq!(report.packets_copied, 5);
        assert_eq!(remuxer.adapter().count(|call| *call == Call::WriteTrailer), 1);
    }

    #[test]
    fn test_trailer_failure() {
        let adapter = FakeAdapter::new(streams())
            .with_packets(packets())
            .with_trailer_failure();

        let mut remuxer = Remuxer::with_adapter(adapter);

        let err = remuxer.run(&request()).err().unwrap();

        assert_eq!(err.kind(), ErrorKind::FileError);
        assert_eq!(remuxer.state(), RemuxState::Failed);

        let adapter = remuxer.adapter();

        assert_eq!(adapter.written_packets().len(), 5);
        assert_eq!(adapter.count(|call| *call == Call::ReleaseOutput), 1);
        assert_eq!(adapter.count(|call| *call == Call::ReleaseInput), 1);
    }

    #[test]
    fn test_no_file_output() {
        let adapter = FakeAdapter::new(streams()).with_no_file_output();

        let mut remuxer = Remuxer::with_adapter(adapter);

        remuxer.run(&request()).unwrap();

        assert_eq!(remuxer.adapter().count(|call| *call == Call::OpenFile), 0);
    }

    #[test]
    fn test_descriptions() {
        let adapter = FakeAdapter::new(streams());

        let input = adapter.open_input("in.fake").unwrap();
        let mut output = adapter.open_output("out.fake").unwrap();

        let streams = streams();

        let map = StreamMap::build(&streams, &mut output).unwrap();

        assert_eq!(
            describe_input(&input, "in.fake").unwrap(),
            "Input #0, fake, from 'in.fake':\n  \
             Stream #0:0: video (h264), time base 1/90000\n  \
             Stream #0:1: data (bin_data), time base 1/1000, dropped\n  \
             Stream #0:2: audio (aac), time base 1/48000\n"
        );

        assert_eq!(
            describe_output(&input, &output, &map, "out.fake").unwrap(),
            "Output #0, fake, to 'out.fake':\n  \
             Stream #0:0: video (h264), mapped from #0:0\n  \
             Stream #0:1: audio (aac), mapped from #0:2\n"
        );
    }

    #[test]
    fn test_report_display() {
        let report = RemuxReport {
            input_streams: 3,
            output_streams: 2,
            packets_copied: 10,
            packets_dropped: 1,
            completed: false,
        };

        assert_eq!(
            report.to_string(),
            "2 of 3 streams, 10 packets copied, 1 packets dropped (incomplete)"
        );
    }
}
