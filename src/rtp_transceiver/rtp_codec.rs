use std::fmt;

use serde::{Deserialize, Serialize};

/// MediaKind determines the kind of a track, a codec or a media section.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Unspecified = 0,

    /// MediaKind::Audio indicates this is an audio track or codec
    Audio = 1,

    /// MediaKind::Video indicates this is a video track or codec
    Video = 2,
}

const MEDIA_KIND_AUDIO_STR: &str = "audio";
const MEDIA_KIND_VIDEO_STR: &str = "video";

impl From<&str> for MediaKind {
    fn from(raw: &str) -> Self {
        match raw {
            MEDIA_KIND_AUDIO_STR => MediaKind::Audio,
            MEDIA_KIND_VIDEO_STR => MediaKind::Video,
            _ => MediaKind::Unspecified,
        }
    }
}

impl From<u8> for MediaKind {
    fn from(v: u8) -> Self {
        match v {
            1 => MediaKind::Audio,
            2 => MediaKind::Video,
            _ => MediaKind::Unspecified,
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            MediaKind::Audio => MEDIA_KIND_AUDIO_STR,
            MediaKind::Video => MEDIA_KIND_VIDEO_STR,
            MediaKind::Unspecified => crate::UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

impl MediaKind {
    /// The `mime_type` prefix used by codecs of this kind.
    pub fn mime_prefix(&self) -> &'static str {
        match *self {
            MediaKind::Audio => "audio/",
            MediaKind::Video => "video/",
            MediaKind::Unspecified => "",
        }
    }
}
