//! Codec parameters.
//!
//! Payloads are never decoded by this crate, so the only codec related
//! information needed is the codec parameters object describing a stream.

use std::{
    ffi::CStr,
    fmt::{self, Display, Formatter},
    os::raw::{c_char, c_int, c_void},
};

use crate::Error;

extern "C" {
    fn ffw_codec_parameters_clone(params: *const c_void) -> *mut c_void;
    fn ffw_codec_parameters_get_media_type(params: *const c_void) -> c_int;
    fn ffw_codec_parameters_get_codec_name(params: *const c_void) -> *const c_char;
    fn ffw_codec_parameters_get_codec_tag(params: *const c_void) -> u32;
    fn ffw_codec_parameters_set_codec_tag(params: *mut c_void, codec_tag: u32);
    fn ffw_codec_parameters_free(params: *mut c_void);
}

/// Media type of an elementary stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MediaType {
    Video,
    Audio,
    Subtitle,
    Data,
    Attachment,
    Unknown,
}

impl MediaType {
    /// Create a media type from its raw representation.
    pub(crate) fn from_raw(value: c_int) -> Self {
        match value {
            1 => Self::Video,
            2 => Self::Audio,
            3 => Self::Subtitle,
            4 => Self::Data,
            5 => Self::Attachment,
            _ => Self::Unknown,
        }
    }

    /// Check if streams of this type carry audio, video or subtitles.
    pub const fn is_elementary(self) -> bool {
        matches!(self, Self::Video | Self::Audio | Self::Subtitle)
    }

    /// Get name of the media type.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Subtitle => "subtitle",
            Self::Data => "data",
            Self::Attachment => "attachment",
            Self::Unknown => "unknown",
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        f.write_str(self.name())
    }
}

/// A codec tag (container-specific codec identifier, e.g. a FourCC).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CodecTag(u32);

impl CodecTag {
    /// Empty tag, letting the muxer pick the right one.
    pub const NONE: CodecTag = CodecTag(0);

    /// Check if the tag is empty.
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<u32> for CodecTag {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<CodecTag> for u32 {
    fn from(value: CodecTag) -> Self {
        value.0
    }
}

impl From<&[u8; 4]> for CodecTag {
    fn from(value: &[u8; 4]) -> Self {
        Self(u32::from_le_bytes(*value))
    }
}

/// Codec parameters.
pub struct CodecParameters {
    ptr: *mut c_void,
}

impl CodecParameters {
    /// Create codec parameters from a given raw representation.
    pub(crate) unsafe fn from_raw_ptr(ptr: *mut c_void) -> Self {
        Self { ptr }
    }

    /// Get raw pointer to the underlying object.
    pub(crate) fn as_ptr(&self) -> *const c_void {
        self.ptr
    }

    /// Make a deep copy of the parameters.
    pub fn try_clone(&self) -> Result<Self, Error> {
        let ptr = unsafe { ffw_codec_parameters_clone(self.ptr) };

        if ptr.is_null() {
            Err(Error::allocation("unable to copy codec parameters"))
        } else {
            Ok(Self { ptr })
        }
    }

    /// Get media type.
    pub fn media_type(&self) -> MediaType {
        let raw = unsafe { ffw_codec_parameters_get_media_type(self.ptr) };

        MediaType::from_raw(raw)
    }

    /// Get codec name.
    pub fn codec_name(&self) -> &str {
        unsafe {
            let ptr = ffw_codec_parameters_get_codec_name(self.ptr);

            if ptr.is_null() {
                "unknown"
            } else {
                CStr::from_ptr(ptr as _).to_str().unwrap_or("unknown")
            }
        }
    }

    /// Get codec tag.
    pub fn codec_tag(&self) -> CodecTag {
        let codec_tag = unsafe { ffw_codec_parameters_get_codec_tag(self.ptr) };

        codec_tag.into()
    }

    /// Set codec tag.
    pub fn set_codec_tag(&mut self, codec_tag: CodecTag) {
        unsafe { ffw_codec_parameters_set_codec_tag(self.ptr, codec_tag.into()) }
    }
}

impl Drop for CodecParameters {
    fn drop(&mut self) {
        unsafe { ffw_codec_parameters_free(self.ptr) }
    }
}

unsafe impl Send for CodecParameters {}
unsafe impl Sync for CodecParameters {}
