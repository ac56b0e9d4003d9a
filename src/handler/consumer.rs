use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::engine::capabilities::TrackCorrelation;
use crate::engine::NegotiationEngine;
use crate::error::{Error, Result};
use crate::rtp_transceiver::rtp_codec::MediaKind;
use crate::rtp_transceiver::rtp_parameters::RtpParameters;
use crate::rtp_transceiver::SSRC;
use crate::track::MediaStreamTrack;

/// ConsumerParameters describe a remote source the application wants to
/// receive, as handed out by the server.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerParameters {
    pub id: String,
    pub kind: MediaKind,
    pub rtp_parameters: RtpParameters,
}

/// ConsumerInfo is everything the remote offer needs to announce one
/// consumer.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ConsumerInfo {
    pub id: String,
    pub kind: MediaKind,
    pub ssrc: SSRC,
    pub rtx_ssrc: Option<SSRC>,
    pub cname: String,
    pub mid: Option<SmolStr>,
    pub stream_id: String,
    pub track_id: String,
    /// Closed consumers keep their media section, disabled, so that the mids
    /// of later sections do not shift.
    pub closed: bool,
}

impl ConsumerInfo {
    /// from_parameters validates `params` and derives the stream and track
    /// ids the remote offer announces.
    pub fn from_parameters(params: &ConsumerParameters) -> Result<Self> {
        if params.kind == MediaKind::Unspecified {
            return Err(Error::ErrUnsupportedMediaKind);
        }
        let encoding = params.rtp_parameters.encodings.first().ok_or_else(|| {
            Error::ErrInvalidConsumerParameters {
                id: params.id.clone(),
                reason: "no encoding",
            }
        })?;
        if encoding.ssrc == 0 {
            return Err(Error::ErrInvalidConsumerParameters {
                id: params.id.clone(),
                reason: "missing ssrc",
            });
        }
        if params.rtp_parameters.rtcp.cname.is_empty() {
            return Err(Error::ErrInvalidConsumerParameters {
                id: params.id.clone(),
                reason: "missing cname",
            });
        }

        Ok(ConsumerInfo {
            id: params.id.clone(),
            kind: params.kind,
            ssrc: encoding.ssrc,
            rtx_ssrc: encoding.rtx.map(|rtx| rtx.ssrc),
            cname: params.rtp_parameters.rtcp.cname.clone(),
            mid: None,
            stream_id: format!("recv-stream-{}", params.id),
            track_id: format!("consumer-{}-{}", params.kind, params.id),
            closed: false,
        })
    }

    /// validate checks what a media section needs to announce the consumer:
    /// an ssrc and a cname while it is open, and a mid when every consumer
    /// owns a section.
    pub fn validate(&self, needs_mid: bool) -> Result<()> {
        let reason = if needs_mid && self.mid.as_deref().map_or(true, str::is_empty) {
            "missing mid"
        } else if self.closed {
            return Ok(());
        } else if self.ssrc == 0 {
            "missing ssrc"
        } else if self.cname.is_empty() {
            "missing cname"
        } else {
            return Ok(());
        };

        Err(Error::ErrInvalidConsumerParameters {
            id: self.id.clone(),
            reason,
        })
    }
}

/// ConsumerChange records what `add` did, so that a failed round can undo
/// exactly that.
#[derive(Debug, Clone)]
pub(crate) struct ConsumerChange {
    id: String,
    added_kind: Option<MediaKind>,
    reopened: Option<ConsumerInfo>,
    next_mid: usize,
}

/// ConsumerTrackManager keeps the consumers of a receive session and the
/// ordered set of kinds negotiated so far.
#[derive(Debug, Default)]
pub(crate) struct ConsumerTrackManager {
    kinds: Vec<MediaKind>,
    consumers: Vec<ConsumerInfo>,
    keep_closed: bool,
    next_mid: usize,
}

impl ConsumerTrackManager {
    /// With `keep_closed`, removed consumers stay in place as closed entries
    /// and every consumer gets its own mid.
    pub(crate) fn new(keep_closed: bool) -> Self {
        ConsumerTrackManager {
            keep_closed,
            ..Default::default()
        }
    }

    pub(crate) fn kinds(&self) -> &[MediaKind] {
        &self.kinds
    }

    /// All entries in insertion order, closed ones included.
    pub(crate) fn consumer_infos(&self) -> &[ConsumerInfo] {
        &self.consumers
    }

    pub(crate) fn get(&self, id: &str) -> Option<&ConsumerInfo> {
        self.consumers.iter().find(|c| c.id == id && !c.closed)
    }

    pub(crate) fn ids(&self) -> Vec<String> {
        self.consumers
            .iter()
            .filter(|c| !c.closed)
            .map(|c| c.id.clone())
            .collect()
    }

    /// add registers a consumer. An id that is already active is rejected
    /// without touching any state; the id of a closed consumer reopens its
    /// entry and keeps its mid.
    pub(crate) fn add(&mut self, mut info: ConsumerInfo) -> Result<(ConsumerInfo, ConsumerChange)> {
        if self.get(&info.id).is_some() {
            return Err(Error::ErrConsumerAlreadyExists(info.id));
        }

        let mut change = ConsumerChange {
            id: info.id.clone(),
            added_kind: None,
            reopened: None,
            next_mid: self.next_mid,
        };

        if !self.kinds.contains(&info.kind) {
            self.kinds.push(info.kind);
            change.added_kind = Some(info.kind);
        }

        if let Some(slot) = self.consumers.iter_mut().find(|c| c.id == info.id) {
            info.mid = slot.mid.clone();
            change.reopened = Some(std::mem::replace(slot, info.clone()));
        } else {
            if self.keep_closed {
                info.mid = Some(SmolStr::new(self.next_mid.to_string()));
                self.next_mid += 1;
            }
            self.consumers.push(info.clone());
        }

        Ok((info, change))
    }

    /// rollback undoes a single `add`.
    pub(crate) fn rollback(&mut self, change: ConsumerChange) {
        match change.reopened {
            Some(previous) => {
                if let Some(slot) = self.consumers.iter_mut().find(|c| c.id == change.id) {
                    *slot = previous;
                }
            }
            None => {
                self.consumers.retain(|c| c.id != change.id);
                if self.next_mid == change.next_mid + 1 {
                    self.next_mid = change.next_mid;
                }
            }
        }

        if let Some(kind) = change.added_kind {
            if !self.consumers.iter().any(|c| c.kind == kind) {
                self.kinds.retain(|k| *k != kind);
            }
        }
    }

    /// remove drops a consumer, or marks it closed when closed entries are
    /// kept. The kind stays negotiated either way.
    pub(crate) fn remove(&mut self, id: &str) -> Result<ConsumerInfo> {
        let pos = self
            .consumers
            .iter()
            .position(|c| c.id == id && !c.closed)
            .ok_or_else(|| Error::ErrConsumerNotFound(id.to_owned()))?;

        if self.keep_closed {
            self.consumers[pos].closed = true;
            Ok(self.consumers[pos].clone())
        } else {
            Ok(self.consumers.remove(pos))
        }
    }

    /// resolve_track finds the remote track of a consumer once a round has
    /// settled.
    pub(crate) async fn resolve_track(
        info: &ConsumerInfo,
        correlation: TrackCorrelation,
        engine: &dyn NegotiationEngine,
    ) -> Result<Arc<MediaStreamTrack>> {
        match correlation {
            TrackCorrelation::StreamAndTrackId => {
                for receiver in engine.current_receivers().await {
                    let track = receiver.track().await;
                    if track.id() != info.track_id {
                        continue;
                    }
                    if receiver.stream_ids().await.contains(&info.stream_id) {
                        return Ok(track);
                    }
                }
            }
            TrackCorrelation::TrackId => {
                for receiver in engine.current_receivers().await {
                    let track = receiver.track().await;
                    if track.id() == info.track_id {
                        return Ok(track);
                    }
                }
            }
            TrackCorrelation::Mid => {
                for transceiver in engine.current_transceivers().await {
                    let mid = transceiver.mid().await;
                    if mid.is_none() || mid != info.mid {
                        continue;
                    }
                    if let Some(receiver) = transceiver.receiver().await {
                        return Ok(receiver.track().await);
                    }
                }
            }
        }

        Err(Error::ErrRemoteTrackNotFound(info.id.clone()))
    }
}
