//! Unified-plan helpers: every local track owns a media section, addressed
//! by its mid.

use sdp::description::common::Attribute;
use sdp::description::session::{SessionDescription, ATTR_KEY_MSID};

use super::{
    fill_encodings, get_by_mid, get_by_mid_mut, get_mid_value, inject_simulcast_layers,
    primary_ssrcs, ssrc_infos, SDP_ATTRIBUTE_RID, SDP_ATTRIBUTE_SIMULCAST,
};
use crate::error::{Error, Result};
use crate::rtp_transceiver::rtp_parameters::RtpParameters;
use crate::rtp_transceiver::SSRC;

/// add_simulcast_for_mid splits the source of the section `mid` into
/// `layers` flows and announces them as send rids `r0`, `r1`, ... together
/// with the matching `a=simulcast` line.
pub fn add_simulcast_for_mid(
    desc: &mut SessionDescription,
    mid: &str,
    layers: usize,
) -> Result<Vec<SSRC>> {
    let media = get_by_mid_mut(desc, mid)
        .ok_or_else(|| Error::ErrSessionDescriptionMissingMedia(mid.to_owned()))?;
    let primary = primary_ssrcs(media)
        .first()
        .map(|i| i.ssrc)
        .ok_or_else(|| Error::ErrLocalTrackNotFound(mid.to_owned()))?;

    let ssrcs = inject_simulcast_layers(media, primary, layers)?;
    if media.has_attribute(SDP_ATTRIBUTE_SIMULCAST) {
        return Ok(ssrcs);
    }

    let rids: Vec<String> = (0..ssrcs.len()).map(|i| format!("r{i}")).collect();
    for rid in &rids {
        media.attributes.push(Attribute::new(
            SDP_ATTRIBUTE_RID.to_owned(),
            Some(format!("{rid} send")),
        ));
    }
    media.attributes.push(Attribute::new(
        SDP_ATTRIBUTE_SIMULCAST.to_owned(),
        Some(format!("send {}", rids.join(";"))),
    ));

    Ok(ssrcs)
}

/// fill_rtp_parameters_for_mid sets the mid, encodings and RTCP cname of
/// `params` from the section `mid`.
pub fn fill_rtp_parameters_for_mid(
    params: &mut RtpParameters,
    desc: &SessionDescription,
    mid: &str,
) -> Result<()> {
    let media = get_by_mid(desc, mid)
        .ok_or_else(|| Error::ErrSessionDescriptionMissingMedia(mid.to_owned()))?;
    let primary = primary_ssrcs(media)
        .first()
        .map(|i| i.ssrc)
        .ok_or_else(|| Error::ErrLocalTrackNotFound(mid.to_owned()))?;

    fill_encodings(params, media, primary)
}

/// mid_for_track returns the mid of the active section sending `track_id`,
/// found through its `a=msid` line or the msid of one of its sources.
pub fn mid_for_track(desc: &SessionDescription, track_id: &str) -> Option<String> {
    desc.media_descriptions
        .iter()
        .filter(|m| m.media_name.port.value != 0)
        .find(|m| {
            let by_msid = m.attributes.iter().any(|a| {
                a.key == ATTR_KEY_MSID
                    && a.value
                        .as_deref()
                        .and_then(|v| v.split(' ').nth(1))
                        .is_some_and(|t| t == track_id)
            });
            by_msid
                || ssrc_infos(m)
                    .iter()
                    .any(|i| i.track_id.as_deref() == Some(track_id))
        })
        .and_then(|m| get_mid_value(m).cloned())
}
