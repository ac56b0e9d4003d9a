use std::fmt;
use std::num::ParseIntError;

use thiserror::Error;
use tokio::sync::mpsc::error::SendError as MpscSendError;

use crate::engine::signaling_state::RTCSignalingState;
use crate::rtp_transceiver::rtp_codec::MediaKind;
use crate::sdp::sdp_type::RTCSdpType;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// ErrConsumerAlreadyExists indicates a consumer with the same id is
    /// already active on the session.
    #[error("consumer already added [id:{0}]")]
    ErrConsumerAlreadyExists(String),

    /// ErrProducerAlreadyExists indicates a producer with the same id is
    /// already registered on the session.
    #[error("producer already added [id:{0}]")]
    ErrProducerAlreadyExists(String),

    /// ErrTrackAlreadyAdded indicates the track is already part of the local
    /// stream.
    #[error("track already added [trackId:{0}]")]
    ErrTrackAlreadyAdded(String),

    #[error("consumer not found [id:{0}]")]
    ErrConsumerNotFound(String),

    #[error("producer not found [id:{0}]")]
    ErrProducerNotFound(String),

    /// ErrRemoteTrackNotFound indicates a negotiation round settled but the
    /// engine exposes no remote track for the consumer.
    #[error("remote track not found [consumerId:{0}]")]
    ErrRemoteTrackNotFound(String),

    /// ErrLocalTrackNotFound indicates neither a sender nor a media source
    /// exists for a local track.
    #[error("local track not found [trackId:{0}]")]
    ErrLocalTrackNotFound(String),

    /// ErrNoSendingTracks is reported by engines when the local description
    /// can not be created because no sending tracks remain.
    #[error("no sending tracks: {0}")]
    ErrNoSendingTracks(String),

    #[error("session closed")]
    ErrSessionClosed,

    /// ErrTransportNotReady indicates an operation needs transport
    /// parameters that have not been exchanged yet.
    #[error("transport parameters have not been exchanged")]
    ErrTransportNotReady,

    #[error("invalid consumer parameters [id:{id}]: {reason}")]
    ErrInvalidConsumerParameters { id: String, reason: &'static str },

    #[error("track kind {got} does not match producer kind {expected}")]
    ErrKindMismatch { expected: MediaKind, got: MediaKind },

    #[error("no rtp parameters for kind {0}")]
    ErrMissingRtpParameters(MediaKind),

    #[error("unsupported media kind")]
    ErrUnsupportedMediaKind,

    #[error("the engine does not support direct track replacement")]
    ErrReplaceTrackUnsupported,

    /// ErrSessionDescriptionNoFingerprint indicates the local description
    /// carries no DTLS fingerprint.
    #[error("session description has no fingerprint")]
    ErrSessionDescriptionNoFingerprint,

    #[error("session description has an invalid fingerprint")]
    ErrSessionDescriptionInvalidFingerprint,

    #[error("session description has conflicting fingerprints")]
    ErrSessionDescriptionConflictingFingerprints,

    #[error("session description missing ice-ufrag")]
    ErrSessionDescriptionMissingIceUfrag,

    #[error("session description missing ice-pwd")]
    ErrSessionDescriptionMissingIcePwd,

    #[error("session description has no media section for {0}")]
    ErrSessionDescriptionMissingMedia(String),

    #[error("local description is not set")]
    ErrNoLocalDescription,

    #[error("can't rollback from stable state")]
    ErrSignalingStateCannotRollback,

    #[error(
        "invalid proposed signaling state transition from {} applying {} {}",
        from,
        if *is_local { "local" } else {  "remote" },
        applying
    )]
    ErrSignalingStateProposedTransitionInvalid {
        from: RTCSignalingState,
        applying: RTCSdpType,
        is_local: bool,
    },

    #[error("invalid ice candidate: {0}")]
    ErrICECandidateInvalid(String),

    #[error("ice server has no urls")]
    ErrNoIceServerUrls,

    /// ErrNoTurnCredentials indicates that a TURN server URL was provided
    /// without required credentials.
    #[error("turn server credentials required")]
    ErrNoTurnCredentials,

    #[error("simulcast needs at least two layers, got {0}")]
    ErrInvalidSimulcastLayers(usize),

    #[error("transport request timed out")]
    ErrTransportRequestTimeout,

    #[error("transport request dropped without response")]
    ErrTransportRequestDropped,

    #[error("transport: {0}")]
    ErrTransport(String),

    #[error("negotiation engine: {0}")]
    ErrEngine(String),

    #[error("SdpError: {0}")]
    ErrSdpError(#[from] sdp::Error),

    #[error("parse int: {0}")]
    ParseInt(#[from] ParseIntError),

    #[error("MpscSend: {0}")]
    MpscSend(String),

    #[allow(non_camel_case_types)]
    #[error("{0}")]
    new(String),
}

/// ErrorKind classifies every [`Error`] at the session boundary.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// An entity with the same id already exists; nothing was mutated.
    DuplicateEntity,
    /// The referenced entity (consumer, producer, track) does not exist.
    EntityNotFound,
    /// The engine reported a benign failure that callers never see.
    ExpectedNegotiationNoOp,
    /// The operation is not valid in the current session state or with the
    /// given parameters.
    InvalidState,
    /// Anything else going wrong during a negotiation round.
    UnexpectedNegotiationFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            ErrorKind::DuplicateEntity => "duplicate-entity",
            ErrorKind::EntityNotFound => "entity-not-found",
            ErrorKind::ExpectedNegotiationNoOp => "expected-negotiation-no-op",
            ErrorKind::InvalidState => "invalid-state",
            ErrorKind::UnexpectedNegotiationFailure => "unexpected-negotiation-failure",
        };
        write!(f, "{s}")
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ErrConsumerAlreadyExists(_)
            | Error::ErrProducerAlreadyExists(_)
            | Error::ErrTrackAlreadyAdded(_) => ErrorKind::DuplicateEntity,
            Error::ErrConsumerNotFound(_)
            | Error::ErrProducerNotFound(_)
            | Error::ErrRemoteTrackNotFound(_)
            | Error::ErrLocalTrackNotFound(_) => ErrorKind::EntityNotFound,
            Error::ErrNoSendingTracks(_) => ErrorKind::ExpectedNegotiationNoOp,
            Error::ErrSessionClosed
            | Error::ErrTransportNotReady
            | Error::ErrInvalidConsumerParameters { .. }
            | Error::ErrKindMismatch { .. }
            | Error::ErrMissingRtpParameters(_)
            | Error::ErrUnsupportedMediaKind
            | Error::ErrNoIceServerUrls
            | Error::ErrNoTurnCredentials
            | Error::ErrInvalidSimulcastLayers(_) => ErrorKind::InvalidState,
            _ => ErrorKind::UnexpectedNegotiationFailure,
        }
    }
}

// Because Tokio SendError is parameterized, we sadly lose the payload.
impl<T> From<MpscSendError<T>> for Error {
    fn from(e: MpscSendError<T>) -> Self {
        Error::MpscSend(e.to_string())
    }
}

/// flatten_errs flattens multiple errors into one
pub fn flatten_errs(errs: Vec<impl Into<Error>>) -> Result<()> {
    if errs.is_empty() {
        Ok(())
    } else {
        let errs_strs: Vec<String> = errs.into_iter().map(|e| e.into().to_string()).collect();
        Err(Error::new(errs_strs.join("\n")))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_error_kind() {
        let tests = vec![
            (
                Error::ErrConsumerAlreadyExists("1".to_owned()),
                ErrorKind::DuplicateEntity,
            ),
            (
                Error::ErrTrackAlreadyAdded("t".to_owned()),
                ErrorKind::DuplicateEntity,
            ),
            (
                Error::ErrProducerNotFound("1".to_owned()),
                ErrorKind::EntityNotFound,
            ),
            (
                Error::ErrRemoteTrackNotFound("1".to_owned()),
                ErrorKind::EntityNotFound,
            ),
            (
                Error::ErrNoSendingTracks("Failed to create channels".to_owned()),
                ErrorKind::ExpectedNegotiationNoOp,
            ),
            (Error::ErrSessionClosed, ErrorKind::InvalidState),
            (
                Error::ErrEngine("boom".to_owned()),
                ErrorKind::UnexpectedNegotiationFailure,
            ),
            (
                Error::ErrTransportRequestTimeout,
                ErrorKind::UnexpectedNegotiationFailure,
            ),
        ];

        for (err, expected) in tests {
            assert_eq!(err.kind(), expected, "{err}");
        }
    }

    #[test]
    fn test_flatten_errs() {
        assert!(flatten_errs(Vec::<Error>::new()).is_ok());

        let err = flatten_errs(vec![
            Error::ErrEngine("a".to_owned()),
            Error::ErrTransport("b".to_owned()),
        ])
        .unwrap_err();
        assert_eq!(err.to_string(), "negotiation engine: a\ntransport: b");
    }
}
