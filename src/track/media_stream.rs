use std::sync::Arc;

use super::MediaStreamTrack;
use crate::error::{Error, Result};
use crate::utilities::math_rand_alpha;

/// MediaStream is the local composite stream whose tracks are offered on the
/// send transport. Track order is insertion order, which is also the order
/// the engine lays them out in the local description.
#[derive(Debug, Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<Arc<MediaStreamTrack>>,
}

impl Default for MediaStream {
    fn default() -> Self {
        MediaStream::new(math_rand_alpha(16))
    }
}

impl MediaStream {
    pub fn new(id: impl Into<String>) -> Self {
        MediaStream {
            id: id.into(),
            tracks: vec![],
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tracks(&self) -> &[Arc<MediaStreamTrack>] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get_track_by_id(&self, id: &str) -> Option<&Arc<MediaStreamTrack>> {
        self.tracks.iter().find(|t| t.id() == id)
    }

    /// contains reports whether this exact track (by reference) is attached.
    pub fn contains(&self, track: &Arc<MediaStreamTrack>) -> bool {
        self.tracks.iter().any(|t| Arc::ptr_eq(t, track))
    }

    /// add_track appends a track. A track with the same id can only be
    /// attached once.
    pub fn add_track(&mut self, track: Arc<MediaStreamTrack>) -> Result<()> {
        if self.get_track_by_id(track.id()).is_some() {
            return Err(Error::ErrTrackAlreadyAdded(track.id().to_owned()));
        }
        self.tracks.push(track);
        Ok(())
    }

    /// remove_track detaches the track with the given id, returning it.
    pub fn remove_track(&mut self, id: &str) -> Option<Arc<MediaStreamTrack>> {
        let pos = self.tracks.iter().position(|t| t.id() == id)?;
        Some(self.tracks.remove(pos))
    }

    /// replace_track swaps `old_id` for `track` in place, keeping its
    /// position in the stream.
    pub fn replace_track(&mut self, old_id: &str, track: Arc<MediaStreamTrack>) -> Result<()> {
        if old_id != track.id() && self.get_track_by_id(track.id()).is_some() {
            return Err(Error::ErrTrackAlreadyAdded(track.id().to_owned()));
        }
        match self.tracks.iter_mut().find(|t| t.id() == old_id) {
            Some(slot) => {
                *slot = track;
                Ok(())
            }
            None => Err(Error::ErrLocalTrackNotFound(old_id.to_owned())),
        }
    }
}
