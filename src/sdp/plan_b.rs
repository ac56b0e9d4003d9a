//! Plan-B helpers: every local track of a kind shares the single media
//! section of that kind and is told apart by its `a=ssrc:<ssrc> msid` line.

use sdp::description::media::MediaDescription;
use sdp::description::session::SessionDescription;

use super::{fill_encodings, inject_simulcast_layers, primary_ssrcs};
use crate::error::{Error, Result};
use crate::rtp_transceiver::rtp_codec::MediaKind;
use crate::rtp_transceiver::rtp_parameters::RtpParameters;
use crate::rtp_transceiver::SSRC;

fn media_for_kind(desc: &SessionDescription, kind: MediaKind) -> Result<&MediaDescription> {
    desc.media_descriptions
        .iter()
        .find(|m| MediaKind::from(m.media_name.media.as_str()) == kind)
        .ok_or_else(|| Error::ErrSessionDescriptionMissingMedia(kind.to_string()))
}

/// primary_ssrc_for_track returns the first non repair source announced for
/// `track_id` in a media section.
pub fn primary_ssrc_for_track(media: &MediaDescription, track_id: &str) -> Option<SSRC> {
    primary_ssrcs(media)
        .into_iter()
        .find(|i| i.track_id.as_deref() == Some(track_id))
        .map(|i| i.ssrc)
}

/// add_simulcast_for_track rewrites the sources of `track_id` in the media
/// section of `kind` into `layers` simulcast flows.
pub fn add_simulcast_for_track(
    desc: &mut SessionDescription,
    kind: MediaKind,
    track_id: &str,
    layers: usize,
) -> Result<Vec<SSRC>> {
    let media = desc
        .media_descriptions
        .iter_mut()
        .find(|m| MediaKind::from(m.media_name.media.as_str()) == kind)
        .ok_or_else(|| Error::ErrSessionDescriptionMissingMedia(kind.to_string()))?;
    let primary = primary_ssrc_for_track(media, track_id)
        .ok_or_else(|| Error::ErrLocalTrackNotFound(track_id.to_owned()))?;

    inject_simulcast_layers(media, primary, layers)
}

/// fill_rtp_parameters_for_track sets the encodings and RTCP cname of
/// `params` from the sources `track_id` is sent with.
pub fn fill_rtp_parameters_for_track(
    params: &mut RtpParameters,
    desc: &SessionDescription,
    kind: MediaKind,
    track_id: &str,
) -> Result<()> {
    let media = media_for_kind(desc, kind)?;
    let primary = primary_ssrc_for_track(media, track_id)
        .ok_or_else(|| Error::ErrLocalTrackNotFound(track_id.to_owned()))?;

    fill_encodings(params, media, primary)
}
