//! M3U playlist parser.
//!
//! Converts raw M3U text into an ordered list of [`Channel`] records. The
//! parser never fails: malformed or incomplete entries are dropped rather
//! than aborting the whole parse.

use std::collections::HashMap;
use tracing::debug;

use crate::models::{Channel, StreamProperties};

const EXTINF_PREFIX: &str = "#EXTINF:";
const KODIPROP_PREFIX: &str = "#KODIPROP:";

const PROP_MANIFEST_TYPE: &str = "inputstream.adaptive.manifest_type";
const PROP_LICENSE_TYPE: &str = "inputstream.adaptive.license_type";
const PROP_LICENSE_KEY: &str = "inputstream.adaptive.license_key";
const PROP_STREAM_HEADERS: &str = "inputstream.adaptive.stream_headers";

/// Channel entry under construction while the parser walks the line stream.
#[derive(Debug, Default)]
struct PendingChannel {
    id: String,
    title: Option<String>,
    logo: Option<String>,
    staff_id: Option<String>,
    group_title: Option<String>,
    stream_props: StreamProperties,
}

/// Parses M3U-family playlist text into channel records.
///
/// Identifiers are assigned `channel_<n>` at metadata-line time, where n is
/// one plus the count of channels completed so far. An `#EXTINF` block that
/// is never followed by a URL line never completes, so its identifier is
/// handed to the next block and emitted ids stay contiguous.
pub fn parse_m3u(content: &str) -> Vec<Channel> {
    let mut channels: Vec<Channel> = Vec::new();
    let mut pending: Option<PendingChannel> = None;

    for raw_line in content.lines() {
        let line = raw_line.trim();

        if line.starts_with(EXTINF_PREFIX) {
            // A new metadata line abandons any unfinished entry.
            let mut next = PendingChannel {
                id: format!("channel_{}", channels.len() + 1),
                ..Default::default()
            };

            if let Some(comma_pos) = line.rfind(',') {
                next.title = Some(line[comma_pos + 1..].trim_start().to_string());
            }
            next.logo = extract_attribute(line, "tvg-logo");
            next.group_title = extract_attribute(line, "group-title");
            next.staff_id = extract_attribute(line, "staff-id");

            pending = Some(next);
        } else if line.starts_with(KODIPROP_PREFIX) {
            if let Some(entry) = pending.as_mut() {
                if let Some((name, value)) = line[KODIPROP_PREFIX.len()..].split_once('=') {
                    apply_stream_property(&mut entry.stream_props, name, value);
                }
            }
        } else if !line.starts_with('#') && !line.is_empty() {
            // A bare line is the stream URL: it completes the pending entry.
            // With no titled entry pending the line is ignored.
            match pending.take() {
                Some(entry) if entry.title.is_some() => {
                    channels.push(finish_channel(entry, line));
                }
                other => {
                    pending = other;
                    debug!("Ignoring URL line with no pending channel: {}", line);
                }
            }
        }
    }

    channels
}

fn finish_channel(entry: PendingChannel, url: &str) -> Channel {
    Channel {
        id: entry.id,
        title: entry.title.unwrap_or_default(),
        logo: entry.logo,
        staff_id: entry.staff_id,
        group_title: entry.group_title,
        url: url.to_string(),
        stream_props: entry.stream_props,
    }
}

/// Extracts a `key="value"` attribute from an `#EXTINF` metadata line.
fn extract_attribute(line: &str, key: &str) -> Option<String> {
    let marker = format!("{key}=\"");
    let start = line.find(&marker)? + marker.len();
    let end = line[start..].find('"')? + start;
    Some(line[start..end].to_string())
}

fn apply_stream_property(props: &mut StreamProperties, name: &str, value: &str) {
    match name {
        PROP_MANIFEST_TYPE => props.manifest_type = Some(value.to_string()),
        PROP_LICENSE_TYPE => props.license_type = Some(value.to_string()),
        PROP_LICENSE_KEY => props.license_key = Some(value.to_string()),
        PROP_STREAM_HEADERS => {
            let headers = props.stream_headers.get_or_insert_with(HashMap::new);
            for pair in value.split('&') {
                if let Some((key, val)) = pair.split_once('=') {
                    if !key.is_empty() && !val.is_empty() {
                        headers.insert(key.to_string(), val.to_string());
                    }
                }
            }
        }
        // Unrecognized property names are ignored without error.
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_channel_with_group() {
        let content = "#EXTM3U\n#EXTINF:-1 group-title=\"Sport\",Channel A\nhttp://x/a.m3u8";
        let channels = parse_m3u(content);

        assert_eq!(channels.len(), 1);
        let channel = &channels[0];
        assert_eq!(channel.id, "channel_1");
        assert_eq!(channel.title, "Channel A");
        assert_eq!(channel.group_title.as_deref(), Some("Sport"));
        assert_eq!(channel.url, "http://x/a.m3u8");
        assert_eq!(channel.stream_props, StreamProperties::default());
    }

    #[test]
    fn parses_all_extinf_attributes() {
        let content = concat!(
            "#EXTM3U\n",
            "#EXTINF:-1 tvg-logo=\"http://logo/a.png\" group-title=\"News\" staff-id=\"RAI\",Rai News\n",
            "http://x/news.mpd\n",
        );
        let channels = parse_m3u(content);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].logo.as_deref(), Some("http://logo/a.png"));
        assert_eq!(channels[0].group_title.as_deref(), Some("News"));
        assert_eq!(channels[0].staff_id.as_deref(), Some("RAI"));
    }

    #[test]
    fn kodiprop_lines_populate_stream_properties() {
        let content = concat!(
            "#EXTINF:-1,DRM Channel\n",
            "#KODIPROP:inputstream.adaptive.manifest_type=mpd\n",
            "#KODIPROP:inputstream.adaptive.license_type=org.w3.clearkey\n",
            "#KODIPROP:inputstream.adaptive.license_key=kid123:key456\n",
            "#KODIPROP:inputstream.adaptive.stream_headers=k1=v1&k2=v2\n",
            "#KODIPROP:inputstream.adaptive.unknown_thing=whatever\n",
            "http://x/drm.mpd\n",
        );
        let channels = parse_m3u(content);

        assert_eq!(channels.len(), 1);
        let props = &channels[0].stream_props;
        assert_eq!(props.manifest_type.as_deref(), Some("mpd"));
        assert_eq!(props.license_type.as_deref(), Some("org.w3.clearkey"));
        assert_eq!(props.license_key.as_deref(), Some("kid123:key456"));

        let headers = props.stream_headers.as_ref().unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("k1").map(String::as_str), Some("v1"));
        assert_eq!(headers.get("k2").map(String::as_str), Some("v2"));
    }

    #[test]
    fn block_without_url_is_dropped_and_its_id_is_reused() {
        let content = concat!(
            "#EXTINF:-1,First\n",
            "http://x/1.m3u8\n",
            "#EXTINF:-1,Abandoned\n",
            "#EXTINF:-1,Third\n",
            "http://x/3.m3u8\n",
        );
        let channels = parse_m3u(content);

        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].id, "channel_1");
        // The abandoned block never completed, so channel_2 went to the
        // next block and the emitted ids are contiguous.
        assert_eq!(channels[1].id, "channel_2");
        assert_eq!(channels[1].title, "Third");
    }

    #[test]
    fn url_line_without_pending_title_is_ignored() {
        let content = "#EXTM3U\nhttp://stray.example/feed.m3u8\n#EXTINF:-1,Real\nhttp://x/r.m3u8";
        let channels = parse_m3u(content);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].title, "Real");
    }

    #[test]
    fn second_url_line_does_not_duplicate_channel() {
        let content = "#EXTINF:-1,One\nhttp://x/a.m3u8\nhttp://x/b.m3u8";
        let channels = parse_m3u(content);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].url, "http://x/a.m3u8");
    }

    #[test]
    fn tolerates_crlf_and_blank_lines() {
        let content = "#EXTM3U\r\n\r\n#EXTINF:-1 group-title=\"Film\",Cinema  \r\n\r\nhttp://x/c.mpd\r\n";
        let channels = parse_m3u(content);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].title, "Cinema");
        assert_eq!(channels[0].url, "http://x/c.mpd");
    }

    #[test]
    fn title_is_everything_after_last_comma() {
        let content = "#EXTINF:-1 tvg-logo=\"a,b.png\",Name, With Comma\nhttp://x/n.m3u8";
        let channels = parse_m3u(content);

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].title, "With Comma");
    }

    #[test]
    fn header_pairs_with_missing_value_are_skipped() {
        let content = concat!(
            "#EXTINF:-1,H\n",
            "#KODIPROP:inputstream.adaptive.stream_headers=good=yes&bad&=nope\n",
            "http://x/h.m3u8\n",
        );
        let channels = parse_m3u(content);

        let headers = channels[0].stream_props.stream_headers.as_ref().unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("good").map(String::as_str), Some("yes"));
    }

    #[test]
    fn empty_and_comment_only_input_yields_no_channels() {
        assert!(parse_m3u("").is_empty());
        assert!(parse_m3u("#EXTM3U\n# comment\n").is_empty());
    }
}
