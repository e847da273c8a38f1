//! Mapping of input streams to output streams.

use crate::{
    codec::CodecTag,
    container::{ContainerStream, OutputContainer, StreamParameters},
    Error, ErrorKind,
};

/// Mapping of a single input stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamMapping {
    /// The stream is copied into the output stream with a given index.
    Kept(usize),
    /// The stream is not copied.
    Dropped,
}

/// Stream map with one entry per input stream.
///
/// Only audio, video and subtitle streams are kept. Kept streams get dense
/// output indices assigned in the input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMap {
    mappings: Vec<StreamMapping>,
}

impl StreamMap {
    /// Build the stream map and create the corresponding output streams.
    ///
    /// Codec parameters are copied for kept streams only. Codec parameters
    /// of every kept stream are copied into the new output
    /// stream and the codec tag is cleared, so that the output muxer can
    /// pick its own. Output streams created before a failure are not
    /// removed.
    pub fn build<S, O>(input_streams: &[S], output: &mut O) -> Result<StreamMap, Error>
    where
        S: ContainerStream,
        O: OutputContainer<Parameters = S::Parameters>,
    {
        let mut mappings = Vec::with_capacity(input_streams.len());

        for (index, stream) in input_streams.iter().enumerate() {
            if !stream.media_type().is_elementary() {
                mappings.push(StreamMapping::Dropped);

                continue;
            }

            let mut params = stream.codec_parameters()?;

            params.set_codec_tag(CodecTag::NONE);

            let output_index = output.add_stream(&params).map_err(|err| {
                err.context(
                    ErrorKind::AllocationError,
                    format!("unable to create output stream for input stream #{}", index),
                )
            })?;

            mappings.push(StreamMapping::Kept(output_index));
        }

        let res = StreamMap { mappings };

        Ok(res)
    }

    /// Get output index for a given input stream index. `None` is returned
    /// for dropped streams and for indices out of range.
    pub fn lookup(&self, input_index: usize) -> Option<usize> {
        match self.mappings.get(input_index) {
            Some(StreamMapping::Kept(output_index)) => Some(*output_index),
            _ => None,
        }
    }

    /// Get mapping of a given input stream.
    pub fn get(&self, input_index: usize) -> Option<StreamMapping> {
        self.mappings.get(input_index).copied()
    }

    /// Get the number of input streams.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Check if the map is empty (i.e. there are no input streams).
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Get the number of kept streams.
    pub fn kept(&self) -> usize {
        self.mappings
            .iter()
            .filter(|mapping| matches!(mapping, StreamMapping::Kept(_)))
            .count()
    }

    /// Iterate over the mappings in the input order.
    pub fn iter(&self) -> impl Iterator<Item = StreamMapping> + '_ {
        self.mappings.iter().copied()
    }
}
