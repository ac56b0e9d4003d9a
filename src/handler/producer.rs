use std::sync::Arc;

use crate::error::{Error, Result};
use crate::rtp_transceiver::rtp_codec::MediaKind;
use crate::rtp_transceiver::rtp_parameters::RtpParameters;
use crate::track::{MediaStream, MediaStreamTrack};

/// ProducerInfo is a local source sent on the session.
#[derive(Debug, Clone)]
pub struct ProducerInfo {
    pub id: String,
    pub kind: MediaKind,
    pub track: Arc<MediaStreamTrack>,
    pub simulcast: bool,
    /// The parameters the source is sent with, known once its round settled.
    pub rtp_parameters: Option<RtpParameters>,
}

/// ProducerChange records what a mutation did, so that a failed round can
/// undo exactly that.
#[derive(Debug, Clone)]
pub(crate) enum ProducerChange {
    Added {
        id: String,
    },
    Replaced {
        id: String,
        old_track: Arc<MediaStreamTrack>,
        new_track: Arc<MediaStreamTrack>,
    },
}

/// ProducerTrackManager keeps the local stream offered on a send session
/// and the producers its tracks belong to.
#[derive(Debug, Default)]
pub(crate) struct ProducerTrackManager {
    stream: MediaStream,
    producers: Vec<ProducerInfo>,
}

impl ProducerTrackManager {
    pub(crate) fn stream(&self) -> &MediaStream {
        &self.stream
    }

    pub(crate) fn producers(&self) -> &[ProducerInfo] {
        &self.producers
    }

    pub(crate) fn get(&self, id: &str) -> Option<&ProducerInfo> {
        self.producers.iter().find(|p| p.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut ProducerInfo> {
        self.producers.iter_mut().find(|p| p.id == id)
    }

    /// add attaches `track` to the local stream on behalf of producer `id`.
    /// Nothing is mutated on error.
    pub(crate) fn add(
        &mut self,
        id: &str,
        track: Arc<MediaStreamTrack>,
        simulcast: bool,
    ) -> Result<ProducerChange> {
        if self.get(id).is_some() {
            return Err(Error::ErrProducerAlreadyExists(id.to_owned()));
        }
        if track.kind() == MediaKind::Unspecified {
            return Err(Error::ErrUnsupportedMediaKind);
        }
        self.stream.add_track(Arc::clone(&track))?;

        self.producers.push(ProducerInfo {
            id: id.to_owned(),
            kind: track.kind(),
            track,
            simulcast,
            rtp_parameters: None,
        });

        Ok(ProducerChange::Added { id: id.to_owned() })
    }

    /// remove detaches the track of producer `id` from the local stream.
    pub(crate) fn remove(&mut self, id: &str) -> Result<ProducerInfo> {
        let pos = self
            .producers
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::ErrProducerNotFound(id.to_owned()))?;
        let producer = self.producers.remove(pos);
        self.stream.remove_track(producer.track.id());

        Ok(producer)
    }

    /// replace swaps the track of producer `id` in place. The new track must
    /// be of the same kind.
    pub(crate) fn replace(
        &mut self,
        id: &str,
        track: Arc<MediaStreamTrack>,
    ) -> Result<ProducerChange> {
        let producer = self
            .get(id)
            .ok_or_else(|| Error::ErrProducerNotFound(id.to_owned()))?;
        if producer.kind != track.kind() {
            return Err(Error::ErrKindMismatch {
                expected: producer.kind,
                got: track.kind(),
            });
        }
        let old_track = Arc::clone(&producer.track);

        self.stream
            .replace_track(old_track.id(), Arc::clone(&track))?;
        if let Some(producer) = self.get_mut(id) {
            producer.track = Arc::clone(&track);
        }

        Ok(ProducerChange::Replaced {
            id: id.to_owned(),
            old_track,
            new_track: track,
        })
    }

    /// rollback undoes a single change, leaving later changes in place.
    pub(crate) fn rollback(&mut self, change: ProducerChange) {
        match change {
            ProducerChange::Added { id } => {
                if let Err(err) = self.remove(&id) {
                    log::debug!("rollback of producer {} skipped: {}", id, err);
                }
            }
            ProducerChange::Replaced {
                id,
                old_track,
                new_track,
            } => {
                let current = self.get(&id).map(|p| Arc::clone(&p.track));
                if !current.is_some_and(|t| Arc::ptr_eq(&t, &new_track)) {
                    return;
                }
                if let Err(err) = self
                    .stream
                    .replace_track(new_track.id(), Arc::clone(&old_track))
                {
                    log::warn!("rollback of producer {} failed: {}", id, err);
                    return;
                }
                if let Some(producer) = self.get_mut(&id) {
                    producer.track = old_track;
                }
            }
        }
    }
}
