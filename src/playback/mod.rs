//! Playback descriptor assembly.
//!
//! The playback surface consumes one uniform input shape: a [`Channel`].
//! Live channels pass through as-is; resolved catalog targets are wrapped
//! into the same shape with an inferred manifest kind and the fixed header
//! pair the player host requires.

use crate::models::{Channel, ResolvedPlaybackTarget, StreamProperties};

/// Live path: a parsed channel is already the descriptor shape.
pub fn descriptor_for_channel(channel: &Channel) -> Channel {
    channel.clone()
}

/// VOD path: wraps a resolved target into a channel-shaped descriptor.
///
/// The manifest kind is inferred from the URL suffix: an `mpd` manifest
/// keeps that kind, anything else is treated as a segmented `m3u8` stream.
pub fn descriptor_for_resolved(
    target: &ResolvedPlaybackTarget,
    id: &str,
    title: &str,
) -> Channel {
    let manifest_type = if target.url.ends_with("mpd") {
        "mpd"
    } else {
        "m3u8"
    };

    Channel {
        id: id.to_string(),
        title: title.to_string(),
        logo: None,
        staff_id: None,
        group_title: None,
        url: target.url.clone(),
        stream_props: StreamProperties {
            manifest_type: Some(manifest_type.to_string()),
            license_type: None,
            license_key: None,
            stream_headers: Some(target.headers.clone()),
        },
    }
}
