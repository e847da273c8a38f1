//! Media containers.
//!
//! Demuxing of input containers, muxing of output containers and the AVIO
//! glue connecting both of them to Rust IO streams.

pub mod demuxer;
pub mod io;
pub mod muxer;
pub mod stream;
