#[cfg(test)]
mod sdp_test;

pub mod plan_b;
pub mod sdp_type;
pub mod session_description;
pub mod unified_plan;

use std::collections::HashSet;
use std::io::{BufReader, Cursor};

use sdp::description::media::MediaDescription;
use sdp::description::session::*;
use sdp::extmap::ExtMap;
use smol_str::SmolStr;

use crate::dtls_transport::dtls_fingerprint::RTCDtlsFingerprint;
use crate::dtls_transport::dtls_parameters::DTLSParameters;
use crate::dtls_transport::dtls_role::DTLSRole;
use crate::error::{Error, Result};
use crate::ice_transport::ice_candidate::RTCIceCandidate;
use crate::ice_transport::ice_parameters::RTCIceParameters;
use crate::rtp_transceiver::rtp_codec::MediaKind;
use crate::rtp_transceiver::rtp_parameters::{
    RtcpFeedback, RtpCapabilities, RtpCodecCapability, RtpCodecParameters, RtpEncodingParameters,
    RtpHeaderExtensionCapability, RtpHeaderExtensionParameters, RtpParameters, RtxParameters,
};
use crate::rtp_transceiver::rtp_transceiver_direction::RtpTransceiverDirection;
use crate::rtp_transceiver::{PayloadType, SSRC};
use crate::utilities::rand_ssrc;

pub(crate) const SDP_ATTRIBUTE_RID: &str = "rid";
pub(crate) const SDP_ATTRIBUTE_SIMULCAST: &str = "simulcast";
pub(crate) const SEMANTIC_TOKEN_SIMULCAST: &str = "SIM";

/// parse turns SDP text into its structured form.
pub fn parse(text: &str) -> Result<SessionDescription> {
    let mut reader = Cursor::new(text.as_bytes());
    Ok(SessionDescription::unmarshal(&mut reader)?)
}

/// write serializes a structured SDP back to text.
pub fn write(desc: &SessionDescription) -> String {
    desc.marshal()
}

pub(crate) fn get_mid_value(media: &MediaDescription) -> Option<&String> {
    for attr in &media.attributes {
        if attr.key == ATTR_KEY_MID {
            return attr.value.as_ref();
        }
    }
    None
}

pub(crate) fn get_peer_direction(media: &MediaDescription) -> RtpTransceiverDirection {
    for a in &media.attributes {
        let direction = RtpTransceiverDirection::from(a.key.as_str());
        if direction != RtpTransceiverDirection::Unspecified {
            return direction;
        }
    }
    RtpTransceiverDirection::Unspecified
}

pub(crate) fn get_by_mid<'a>(
    desc: &'a SessionDescription,
    search_mid: &str,
) -> Option<&'a MediaDescription> {
    desc.media_descriptions
        .iter()
        .find(|m| get_mid_value(m).is_some_and(|mid| mid == search_mid))
}

pub(crate) fn get_by_mid_mut<'a>(
    desc: &'a mut SessionDescription,
    search_mid: &str,
) -> Option<&'a mut MediaDescription> {
    desc.media_descriptions
        .iter_mut()
        .find(|m| get_mid_value(m).is_some_and(|mid| mid == search_mid))
}

/// extract_fingerprints collects the DTLS fingerprints announced at session
/// level or in any media section. All sections must agree.
pub fn extract_fingerprints(desc: &SessionDescription) -> Result<Vec<RTCDtlsFingerprint>> {
    let mut fingerprints = vec![];

    if let Some(fingerprint) = desc.attribute("fingerprint") {
        fingerprints.push(fingerprint.clone());
    }

    for m in &desc.media_descriptions {
        if let Some(fingerprint) = m.attribute("fingerprint").and_then(|o| o) {
            fingerprints.push(fingerprint.to_owned());
        }
    }

    if fingerprints.is_empty() {
        return Err(Error::ErrSessionDescriptionNoFingerprint);
    }

    for m in 1..fingerprints.len() {
        if fingerprints[m] != fingerprints[0] {
            return Err(Error::ErrSessionDescriptionConflictingFingerprints);
        }
    }

    Ok(vec![RTCDtlsFingerprint::try_from(fingerprints[0].as_str())?])
}

/// extract_dtls_parameters reads the fingerprints and the `a=setup` role of
/// a description.
pub fn extract_dtls_parameters(desc: &SessionDescription) -> Result<DTLSParameters> {
    Ok(DTLSParameters {
        role: DTLSRole::from(desc),
        fingerprints: extract_fingerprints(desc)?,
    })
}

/// extract_ice_parameters reads the ICE credentials of a description. If
/// every media section is inactive the credentials of the first inactive
/// section are used.
pub fn extract_ice_parameters(desc: &SessionDescription) -> Result<RTCIceParameters> {
    let mut backup_ufrag = None;
    let mut backup_pwd = None;

    let mut ufrag = desc.attribute("ice-ufrag").map(|s| s.as_str());
    let mut pwd = desc.attribute("ice-pwd").map(|s| s.as_str());

    for m in &desc.media_descriptions {
        let media_ufrag = m.attribute("ice-ufrag").and_then(|o| o);
        let media_pwd = m.attribute("ice-pwd").and_then(|o| o);

        if m.attribute(ATTR_KEY_INACTIVE).is_some() {
            if backup_ufrag.is_none() {
                backup_ufrag = media_ufrag;
            }
            if backup_pwd.is_none() {
                backup_pwd = media_pwd;
            }
            continue;
        }

        if ufrag.is_none() {
            ufrag = media_ufrag;
        }
        if pwd.is_none() {
            pwd = media_pwd;
        }
    }

    let ufrag = ufrag
        .or(backup_ufrag)
        .ok_or(Error::ErrSessionDescriptionMissingIceUfrag)?;
    let pwd = pwd
        .or(backup_pwd)
        .ok_or(Error::ErrSessionDescriptionMissingIcePwd)?;

    Ok(RTCIceParameters {
        username_fragment: ufrag.to_owned(),
        password: pwd.to_owned(),
        ice_lite: desc.has_attribute("ice-lite"),
    })
}

/// extract_ice_candidates returns the candidates of every media section,
/// skipping duplicates carried by bundled sections.
pub fn extract_ice_candidates(desc: &SessionDescription) -> Result<Vec<RTCIceCandidate>> {
    let mut seen = HashSet::new();
    let mut candidates = vec![];

    for m in &desc.media_descriptions {
        for a in &m.attributes {
            if !a.is_ice_candidate() {
                continue;
            }
            if let Some(value) = &a.value {
                if seen.insert(value.clone()) {
                    candidates.push(RTCIceCandidate::try_from(value.as_str())?);
                }
            }
        }
    }

    Ok(candidates)
}

/// extract_rtp_capabilities lists the codecs and header extensions the
/// description supports, per media kind, in the order they appear.
pub fn extract_rtp_capabilities(desc: &SessionDescription) -> Result<RtpCapabilities> {
    let mut caps = RtpCapabilities::default();
    let mut seen_codecs = HashSet::new();
    let mut seen_extensions = HashSet::new();

    for m in &desc.media_descriptions {
        let kind = MediaKind::from(m.media_name.media.as_str());
        if kind == MediaKind::Unspecified {
            continue;
        }

        for codec in codecs_from_media_description(m)? {
            if !seen_codecs.insert((kind, codec.payload_type)) {
                continue;
            }
            caps.codecs.push(RtpCodecCapability {
                kind,
                mime_type: codec.mime_type,
                preferred_payload_type: codec.payload_type,
                clock_rate: codec.clock_rate,
                channels: codec.channels,
                sdp_fmtp_line: codec.sdp_fmtp_line,
                rtcp_feedback: codec.rtcp_feedback,
            });
        }

        for ext in rtp_extensions_from_media_description(m)? {
            if !seen_extensions.insert((kind, ext.uri.clone())) {
                continue;
            }
            caps.header_extensions.push(RtpHeaderExtensionCapability {
                kind,
                uri: ext.uri,
                preferred_id: ext.id,
            });
        }
    }

    Ok(caps)
}

pub(crate) fn codecs_from_media_description(
    m: &MediaDescription,
) -> Result<Vec<RtpCodecParameters>> {
    let s = SessionDescription {
        media_descriptions: vec![m.clone()],
        ..Default::default()
    };

    let mut out = vec![];
    for payload_str in &m.media_name.formats {
        let payload_type: PayloadType = payload_str.parse::<u8>()?;
        let codec = match s.get_codec_for_payload_type(payload_type) {
            Ok(codec) => codec,
            Err(err) => {
                if payload_type == 0 {
                    continue;
                }
                return Err(err.into());
            }
        };

        let channels = codec.encoding_parameters.parse::<u16>().unwrap_or(0);

        let mut feedback = vec![];
        for raw in &codec.rtcp_feedback {
            let split: Vec<&str> = raw.split(' ').collect();

            let entry = if split.len() == 2 {
                RtcpFeedback {
                    typ: split[0].to_string(),
                    parameter: split[1].to_string(),
                }
            } else {
                RtcpFeedback {
                    typ: split[0].to_string(),
                    parameter: String::new(),
                }
            };

            feedback.push(entry);
        }

        out.push(RtpCodecParameters {
            mime_type: m.media_name.media.clone() + "/" + codec.name.as_str(),
            payload_type,
            clock_rate: codec.clock_rate,
            channels,
            sdp_fmtp_line: codec.fmtp.clone(),
            rtcp_feedback: feedback,
        })
    }

    Ok(out)
}

pub(crate) fn rtp_extensions_from_media_description(
    m: &MediaDescription,
) -> Result<Vec<RtpHeaderExtensionParameters>> {
    let mut out = vec![];

    for a in &m.attributes {
        if a.key == ATTR_KEY_EXT_MAP {
            let a_str = a.to_string();
            let mut reader = BufReader::new(a_str.as_bytes());
            let e = ExtMap::unmarshal(&mut reader)?;

            if let Some(uri) = e.uri {
                out.push(RtpHeaderExtensionParameters {
                    uri: uri.to_string(),
                    id: e.value as u16,
                });
            }
        }
    }

    Ok(out)
}

/// SsrcInfo gathers the `a=ssrc:<ssrc> <attr>` lines of one source.
#[derive(Default, Debug, Clone, PartialEq)]
pub(crate) struct SsrcInfo {
    pub(crate) ssrc: SSRC,
    pub(crate) cname: Option<String>,
    pub(crate) stream_id: Option<String>,
    pub(crate) track_id: Option<String>,
}

/// ssrc_infos returns every source of a media section in order of first
/// appearance.
pub(crate) fn ssrc_infos(media: &MediaDescription) -> Vec<SsrcInfo> {
    let mut infos: Vec<SsrcInfo> = vec![];

    for attr in &media.attributes {
        if attr.key != ATTR_KEY_SSRC {
            continue;
        }
        let Some(value) = &attr.value else {
            continue;
        };
        let (ssrc_str, rest) = value.split_once(' ').unwrap_or((value.as_str(), ""));
        let ssrc = match ssrc_str.parse::<SSRC>() {
            Ok(ssrc) => ssrc,
            Err(err) => {
                log::warn!("Failed to parse SSRC: {}", err);
                continue;
            }
        };

        let pos = match infos.iter().position(|i| i.ssrc == ssrc) {
            Some(pos) => pos,
            None => {
                infos.push(SsrcInfo {
                    ssrc,
                    ..Default::default()
                });
                infos.len() - 1
            }
        };
        let info = &mut infos[pos];

        if let Some(cname) = rest.strip_prefix("cname:") {
            info.cname = Some(cname.to_owned());
        } else if let Some(msid) = rest.strip_prefix("msid:") {
            let mut split = msid.split(' ');
            info.stream_id = split.next().map(|s| s.to_owned());
            info.track_id = split.next().map(|s| s.to_owned());
        }
    }

    infos
}

/// ssrc_groups returns the ssrc lists of every `a=ssrc-group` line with the
/// given semantics.
pub(crate) fn ssrc_groups(media: &MediaDescription, semantics: &str) -> Vec<Vec<SSRC>> {
    let mut groups = vec![];

    for attr in &media.attributes {
        if attr.key != ATTR_KEY_SSRCGROUP {
            continue;
        }
        let Some(value) = &attr.value else {
            continue;
        };
        let mut split = value.split(' ');
        if split.next() != Some(semantics) {
            continue;
        }
        let ssrcs: Vec<SSRC> = split.filter_map(|s| s.parse::<SSRC>().ok()).collect();
        if !ssrcs.is_empty() {
            groups.push(ssrcs);
        }
    }

    groups
}

/// rtx_ssrc_for returns the repair flow RFC 4588 pairs with `ssrc`.
pub(crate) fn rtx_ssrc_for(media: &MediaDescription, ssrc: SSRC) -> Option<SSRC> {
    ssrc_groups(media, SEMANTIC_TOKEN_FLOW_IDENTIFICATION)
        .into_iter()
        .find(|g| g.len() == 2 && g[0] == ssrc)
        .map(|g| g[1])
}

/// primary_ssrcs returns the sources of a media section that are not repair
/// flows of another source.
pub(crate) fn primary_ssrcs(media: &MediaDescription) -> Vec<SsrcInfo> {
    let repair: Vec<SSRC> = ssrc_groups(media, SEMANTIC_TOKEN_FLOW_IDENTIFICATION)
        .into_iter()
        .filter(|g| g.len() == 2)
        .map(|g| g[1])
        .collect();

    ssrc_infos(media)
        .into_iter()
        .filter(|i| !repair.contains(&i.ssrc))
        .collect()
}

/// get_rids returns the send rids of a media section in declaration order.
pub(crate) fn get_rids(media: &MediaDescription) -> Vec<SmolStr> {
    let mut rids = vec![];
    for attr in &media.attributes {
        if attr.key.as_str() != SDP_ATTRIBUTE_RID {
            continue;
        }
        if let Some(value) = &attr.value {
            let mut split = value.split(' ');
            if let (Some(id), Some("send")) = (split.next(), split.next()) {
                rids.push(SmolStr::new(id));
            }
        }
    }
    rids
}

/// inject_simulcast_layers replaces the single flow `primary` (and its
/// repair flow, if any) by `layers` flows tied together with an
/// `a=ssrc-group:SIM` line. Returns the layer ssrcs, lowest first. A source
/// that already belongs to a SIM group is left untouched.
pub(crate) fn inject_simulcast_layers(
    media: &mut MediaDescription,
    primary: SSRC,
    layers: usize,
) -> Result<Vec<SSRC>> {
    if let Some(group) = ssrc_groups(media, SEMANTIC_TOKEN_SIMULCAST)
        .into_iter()
        .find(|g| g.contains(&primary))
    {
        return Ok(group);
    }

    let infos = ssrc_infos(media);
    let info = infos
        .iter()
        .find(|i| i.ssrc == primary)
        .cloned()
        .ok_or_else(|| Error::ErrLocalTrackNotFound(primary.to_string()))?;
    let cname = info
        .cname
        .clone()
        .ok_or_else(|| Error::ErrLocalTrackNotFound(primary.to_string()))?;
    let rtx = rtx_ssrc_for(media, primary);

    let mut taken: Vec<SSRC> = infos.iter().map(|i| i.ssrc).collect();
    let mut ssrcs = vec![primary];
    let mut rtx_ssrcs = vec![];
    if let Some(rtx) = rtx {
        rtx_ssrcs.push(rtx);
    }
    for _ in 1..layers {
        let ssrc = rand_ssrc(&taken);
        taken.push(ssrc);
        ssrcs.push(ssrc);
        if rtx.is_some() {
            let rtx_ssrc = rand_ssrc(&taken);
            taken.push(rtx_ssrc);
            rtx_ssrcs.push(rtx_ssrc);
        }
    }

    let own: Vec<SSRC> = std::iter::once(primary).chain(rtx).collect();
    media.attributes.retain(|a| {
        let Some(value) = &a.value else {
            return true;
        };
        if a.key == ATTR_KEY_SSRC {
            let ssrc = value.split(' ').next().and_then(|s| s.parse::<SSRC>().ok());
            return !ssrc.is_some_and(|s| own.contains(&s));
        }
        if a.key == ATTR_KEY_SSRCGROUP {
            return !value
                .split(' ')
                .skip(1)
                .filter_map(|s| s.parse::<SSRC>().ok())
                .any(|s| own.contains(&s));
        }
        true
    });

    let msid = match (&info.stream_id, &info.track_id) {
        (Some(stream_id), Some(track_id)) => Some(format!("{stream_id} {track_id}")),
        _ => None,
    };

    let sim = ssrcs
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<String>>()
        .join(" ");
    let mut m = std::mem::take(media).with_value_attribute(
        ATTR_KEY_SSRCGROUP.to_owned(),
        format!("{SEMANTIC_TOKEN_SIMULCAST} {sim}"),
    );
    for (i, ssrc) in ssrcs.iter().enumerate() {
        let mut flows = vec![*ssrc];
        if let Some(rtx_ssrc) = rtx_ssrcs.get(i) {
            flows.push(*rtx_ssrc);
            m = m.with_value_attribute(
                ATTR_KEY_SSRCGROUP.to_owned(),
                format!("{SEMANTIC_TOKEN_FLOW_IDENTIFICATION} {ssrc} {rtx_ssrc}"),
            );
        }
        for flow in flows {
            m = m.with_value_attribute(ATTR_KEY_SSRC.to_owned(), format!("{flow} cname:{cname}"));
            if let Some(msid) = &msid {
                m = m.with_value_attribute(ATTR_KEY_SSRC.to_owned(), format!("{flow} msid:{msid}"));
            }
        }
    }
    *media = m;

    Ok(ssrcs)
}

/// fill_encodings completes `params` with the flows `primary` is sent on:
/// one encoding per simulcast layer (or a single one), their repair flows,
/// the send rids if the section announces as many as there are layers, and
/// the RTCP cname.
pub(crate) fn fill_encodings(
    params: &mut RtpParameters,
    media: &MediaDescription,
    primary: SSRC,
) -> Result<()> {
    let cname = ssrc_infos(media)
        .into_iter()
        .find(|i| i.ssrc == primary)
        .and_then(|i| i.cname)
        .ok_or_else(|| Error::ErrLocalTrackNotFound(primary.to_string()))?;

    let layers = ssrc_groups(media, SEMANTIC_TOKEN_SIMULCAST)
        .into_iter()
        .find(|g| g.contains(&primary))
        .unwrap_or_else(|| vec![primary]);
    let rids = get_rids(media);

    params.encodings = layers
        .iter()
        .enumerate()
        .map(|(i, ssrc)| RtpEncodingParameters {
            ssrc: *ssrc,
            rtx: rtx_ssrc_for(media, *ssrc).map(|ssrc| RtxParameters { ssrc }),
            rid: if rids.len() == layers.len() {
                Some(rids[i].clone())
            } else {
                None
            },
        })
        .collect();
    params.rtcp.cname = cname;
    params.mid = get_mid_value(media).map(SmolStr::new);

    Ok(())
}
