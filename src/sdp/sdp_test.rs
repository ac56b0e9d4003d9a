use sdp::description::common::Attribute;

use super::plan_b;
use super::unified_plan;
use super::*;
use crate::ice_transport::ice_candidate_type::RTCIceCandidateType;

const PLAN_B_OFFER: &str = "v=0\r\n\
o=- 4215775240449105457 2 IN IP4 127.0.0.1\r\n\
s=-\r\n\
t=0 0\r\n\
a=group:BUNDLE audio video\r\n\
a=msid-semantic: WMS stream\r\n\
m=audio 9 UDP/TLS/RTP/SAVPF 111\r\n\
c=IN IP4 0.0.0.0\r\n\
a=candidate:1 1 udp 2122260223 192.168.1.2 54321 typ host\r\n\
a=ice-ufrag:uFrA\r\n\
a=ice-pwd:pAsSwOrDpAsSwOrDpAsSwOrD\r\n\
a=fingerprint:sha-256 AB:CD:EF\r\n\
a=setup:actpass\r\n\
a=mid:audio\r\n\
a=extmap:1 urn:ietf:params:rtp-hdrext:ssrc-audio-level\r\n\
a=sendrecv\r\n\
a=rtcp-mux\r\n\
a=rtpmap:111 opus/48000/2\r\n\
a=rtcp-fb:111 transport-cc\r\n\
a=fmtp:111 minptime=10;useinbandfec=1\r\n\
a=ssrc:1001 cname:cn\r\n\
a=ssrc:1001 msid:stream audio-track\r\n\
m=video 9 UDP/TLS/RTP/SAVPF 96 97\r\n\
c=IN IP4 0.0.0.0\r\n\
a=candidate:1 1 udp 2122260223 192.168.1.2 54321 typ host\r\n\
a=ice-ufrag:uFrA\r\n\
a=ice-pwd:pAsSwOrDpAsSwOrDpAsSwOrD\r\n\
a=fingerprint:sha-256 AB:CD:EF\r\n\
a=setup:actpass\r\n\
a=mid:video\r\n\
a=extmap:3 http://www.webrtc.org/experiments/rtp-hdrext/abs-send-time\r\n\
a=sendrecv\r\n\
a=rtcp-mux\r\n\
a=rtcp-rsize\r\n\
a=rtpmap:96 VP8/90000\r\n\
a=rtcp-fb:96 nack\r\n\
a=rtcp-fb:96 nack pli\r\n\
a=rtpmap:97 rtx/90000\r\n\
a=fmtp:97 apt=96\r\n\
a=ssrc-group:FID 2001 2002\r\n\
a=ssrc:2001 cname:cn\r\n\
a=ssrc:2001 msid:stream video-track\r\n\
a=ssrc:2002 cname:cn\r\n\
a=ssrc:2002 msid:stream video-track\r\n";

#[test]
fn test_extract_fingerprint() -> Result<()> {
    //"Good Session Fingerprint"
    {
        let s = SessionDescription {
            attributes: vec![Attribute {
                key: "fingerprint".to_owned(),
                value: Some("foo bar".to_owned()),
            }],
            ..Default::default()
        };

        let fingerprints = extract_fingerprints(&s)?;
        assert_eq!(fingerprints.len(), 1);
        assert_eq!(fingerprints[0].algorithm, "foo");
        assert_eq!(fingerprints[0].value, "bar");
    }

    //"Good Media Fingerprint"
    {
        let s = SessionDescription {
            media_descriptions: vec![MediaDescription {
                attributes: vec![Attribute {
                    key: "fingerprint".to_owned(),
                    value: Some("foo bar".to_owned()),
                }],
                ..Default::default()
            }],
            ..Default::default()
        };

        let fingerprints = extract_fingerprints(&s)?;
        assert_eq!(fingerprints[0].algorithm, "foo");
        assert_eq!(fingerprints[0].value, "bar");
    }

    //"No Fingerprint"
    {
        let s = SessionDescription::default();
        assert_eq!(
            extract_fingerprints(&s),
            Err(Error::ErrSessionDescriptionNoFingerprint)
        );
    }

    //"Invalid Fingerprint"
    {
        let s = SessionDescription {
            attributes: vec![Attribute {
                key: "fingerprint".to_owned(),
                value: Some("foo".to_owned()),
            }],
            ..Default::default()
        };
        assert_eq!(
            extract_fingerprints(&s),
            Err(Error::ErrSessionDescriptionInvalidFingerprint)
        );
    }

    //"Conflicting Fingerprint"
    {
        let s = SessionDescription {
            attributes: vec![Attribute {
                key: "fingerprint".to_owned(),
                value: Some("foo".to_owned()),
            }],
            media_descriptions: vec![MediaDescription {
                attributes: vec![Attribute {
                    key: "fingerprint".to_owned(),
                    value: Some("foo blah".to_owned()),
                }],
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(
            extract_fingerprints(&s),
            Err(Error::ErrSessionDescriptionConflictingFingerprints)
        );
    }

    Ok(())
}

#[test]
fn test_extract_transport_parameters() -> Result<()> {
    let s = parse(PLAN_B_OFFER)?;

    let dtls = extract_dtls_parameters(&s)?;
    assert_eq!(dtls.role, DTLSRole::Auto);
    assert_eq!(dtls.fingerprints[0].algorithm, "sha-256");
    assert_eq!(dtls.fingerprints[0].value, "ab:cd:ef");

    let ice = extract_ice_parameters(&s)?;
    assert_eq!(ice.username_fragment, "uFrA");
    assert_eq!(ice.password, "pAsSwOrDpAsSwOrDpAsSwOrD");
    assert!(!ice.ice_lite);

    // Bundled sections repeat the same candidate.
    let candidates = extract_ice_candidates(&s)?;
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].address, "192.168.1.2");
    assert_eq!(candidates[0].port, 54321);
    assert_eq!(candidates[0].typ, RTCIceCandidateType::Host);

    Ok(())
}

#[test]
fn test_extract_ice_parameters_missing() {
    let s = SessionDescription {
        media_descriptions: vec![MediaDescription::default()],
        ..Default::default()
    };
    assert_eq!(
        extract_ice_parameters(&s),
        Err(Error::ErrSessionDescriptionMissingIceUfrag)
    );
}

#[test]
fn test_extract_rtp_capabilities() -> Result<()> {
    let s = parse(PLAN_B_OFFER)?;
    let caps = extract_rtp_capabilities(&s)?;

    let mime_types: Vec<&str> = caps.codecs.iter().map(|c| c.mime_type.as_str()).collect();
    assert_eq!(mime_types, vec!["audio/opus", "video/VP8", "video/rtx"]);

    let opus = &caps.codecs[0];
    assert_eq!(opus.kind, MediaKind::Audio);
    assert_eq!(opus.preferred_payload_type, 111);
    assert_eq!(opus.clock_rate, 48000);
    assert_eq!(opus.channels, 2);
    assert_eq!(opus.sdp_fmtp_line, "minptime=10;useinbandfec=1");
    assert_eq!(opus.rtcp_feedback[0].typ, "transport-cc");

    let vp8 = &caps.codecs[1];
    assert_eq!(vp8.channels, 0);
    assert_eq!(vp8.rtcp_feedback.len(), 2);
    assert_eq!(vp8.rtcp_feedback[1].typ, "nack");
    assert_eq!(vp8.rtcp_feedback[1].parameter, "pli");

    assert_eq!(caps.header_extensions.len(), 2);
    assert_eq!(caps.header_extensions[0].kind, MediaKind::Audio);
    assert_eq!(caps.header_extensions[0].preferred_id, 1);
    assert_eq!(
        caps.header_extensions[1].uri,
        "http://www.webrtc.org/experiments/rtp-hdrext/abs-send-time"
    );

    Ok(())
}

#[test]
fn test_ssrc_infos() -> Result<()> {
    let s = parse(PLAN_B_OFFER)?;
    let video = &s.media_descriptions[1];

    let infos = ssrc_infos(video);
    assert_eq!(infos.len(), 2);
    assert_eq!(infos[0].ssrc, 2001);
    assert_eq!(infos[0].cname.as_deref(), Some("cn"));
    assert_eq!(infos[0].stream_id.as_deref(), Some("stream"));
    assert_eq!(infos[0].track_id.as_deref(), Some("video-track"));

    assert_eq!(rtx_ssrc_for(video, 2001), Some(2002));
    assert_eq!(rtx_ssrc_for(video, 2002), None);

    let primaries = primary_ssrcs(video);
    assert_eq!(primaries.len(), 1);
    assert_eq!(primaries[0].ssrc, 2001);

    Ok(())
}

#[test]
fn test_plan_b_fill_rtp_parameters() -> Result<()> {
    let s = parse(PLAN_B_OFFER)?;

    let mut params = RtpParameters::default();
    plan_b::fill_rtp_parameters_for_track(&mut params, &s, MediaKind::Video, "video-track")?;
    assert_eq!(params.encodings.len(), 1);
    assert_eq!(params.encodings[0].ssrc, 2001);
    assert_eq!(params.encodings[0].rtx, Some(RtxParameters { ssrc: 2002 }));
    assert_eq!(params.rtcp.cname, "cn");
    assert_eq!(params.mid.as_deref(), Some("video"));

    assert_eq!(
        plan_b::fill_rtp_parameters_for_track(&mut params, &s, MediaKind::Video, "nope"),
        Err(Error::ErrLocalTrackNotFound("nope".to_owned()))
    );

    Ok(())
}

#[test]
fn test_plan_b_add_simulcast() -> Result<()> {
    let mut s = parse(PLAN_B_OFFER)?;

    let layers = plan_b::add_simulcast_for_track(&mut s, MediaKind::Video, "video-track", 3)?;
    assert_eq!(layers.len(), 3);
    assert_eq!(layers[0], 2001);

    // Survives a text round trip, the way it reaches the engine.
    let s = parse(&write(&s))?;
    let video = &s.media_descriptions[1];

    let sim = ssrc_groups(video, SEMANTIC_TOKEN_SIMULCAST);
    assert_eq!(sim, vec![layers.clone()]);
    assert_eq!(ssrc_groups(video, SEMANTIC_TOKEN_FLOW_IDENTIFICATION).len(), 3);

    let mut params = RtpParameters::default();
    plan_b::fill_rtp_parameters_for_track(&mut params, &s, MediaKind::Video, "video-track")?;
    let encodings: Vec<SSRC> = params.encodings.iter().map(|e| e.ssrc).collect();
    assert_eq!(encodings, layers);
    assert_eq!(params.encodings[0].rtx, Some(RtxParameters { ssrc: 2002 }));
    assert!(params.encodings.iter().all(|e| e.rtx.is_some() && e.rid.is_none()));

    // Injecting again keeps the existing layers.
    let mut s = s;
    let again = plan_b::add_simulcast_for_track(&mut s, MediaKind::Video, "video-track", 3)?;
    assert_eq!(again, layers);

    // Audio is never touched by a video simulcast.
    assert_eq!(ssrc_infos(&s.media_descriptions[0]).len(), 1);

    Ok(())
}

#[test]
fn test_unified_plan_add_simulcast() -> Result<()> {
    let mut s = parse(PLAN_B_OFFER)?;

    let layers = unified_plan::add_simulcast_for_mid(&mut s, "video", 2)?;
    assert_eq!(layers.len(), 2);

    let s = parse(&write(&s))?;
    let video = get_by_mid(&s, "video").unwrap();
    assert_eq!(get_rids(video), vec![SmolStr::new("r0"), SmolStr::new("r1")]);
    assert_eq!(
        video.attribute(SDP_ATTRIBUTE_SIMULCAST),
        Some(Some("send r0;r1"))
    );

    let mut params = RtpParameters::default();
    unified_plan::fill_rtp_parameters_for_mid(&mut params, &s, "video")?;
    let rids: Vec<Option<SmolStr>> = params.encodings.iter().map(|e| e.rid.clone()).collect();
    assert_eq!(rids, vec![Some("r0".into()), Some("r1".into())]);

    assert_eq!(
        unified_plan::add_simulcast_for_mid(&mut s.clone(), "3", 2),
        Err(Error::ErrSessionDescriptionMissingMedia("3".to_owned()))
    );

    Ok(())
}

#[test]
fn test_get_peer_direction() -> Result<()> {
    let s = parse(PLAN_B_OFFER)?;
    assert_eq!(
        get_peer_direction(&s.media_descriptions[0]),
        RtpTransceiverDirection::Sendrecv
    );
    assert_eq!(
        get_mid_value(&s.media_descriptions[1]).map(|m| m.as_str()),
        Some("video")
    );
    Ok(())
}
