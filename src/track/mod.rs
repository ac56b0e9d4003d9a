pub mod media_stream;

use std::fmt;

use crate::rtp_transceiver::rtp_codec::MediaKind;

pub use media_stream::MediaStream;

/// MediaStreamTrack identifies one audio or video source, local or remote.
///
/// Tracks are shared as `Arc<MediaStreamTrack>` and compared by reference
/// when the session needs to know whether the very same source is still
/// attached, and by id when correlating with the engine.
#[derive(Debug, PartialEq, Eq)]
pub struct MediaStreamTrack {
    id: String,
    kind: MediaKind,
}

impl MediaStreamTrack {
    pub fn new(id: impl Into<String>, kind: MediaKind) -> Self {
        MediaStreamTrack {
            id: id.into(),
            kind,
        }
    }

    /// id gets the id of the track
    pub fn id(&self) -> &str {
        &self.id
    }

    /// kind gets the kind of the track
    pub fn kind(&self) -> MediaKind {
        self.kind
    }
}

impl fmt::Display for MediaStreamTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}
