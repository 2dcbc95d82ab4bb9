//! Channel aggregation: flat channel list to category groups.

use std::collections::HashMap;

use crate::models::{Channel, ChannelGroup, OTHER_GROUP_TITLE};

/// Groups channels by their category label.
///
/// Both group order and member order follow first encounter in the input;
/// channels with no declared category land in the "Other" group. Every input
/// channel appears in exactly one group.
pub fn group_channels(channels: &[Channel]) -> Vec<ChannelGroup> {
    let mut groups: Vec<ChannelGroup> = Vec::new();
    let mut index_by_title: HashMap<String, usize> = HashMap::new();

    for channel in channels {
        let title = channel
            .group_title
            .clone()
            .unwrap_or_else(|| OTHER_GROUP_TITLE.to_string());

        let idx = *index_by_title.entry(title.clone()).or_insert_with(|| {
            groups.push(ChannelGroup {
                title,
                channels: Vec::new(),
            });
            groups.len() - 1
        });
        groups[idx].channels.push(channel.clone());
    }

    groups
}

/// Finds a channel by id across all groups.
pub fn find_channel<'a>(groups: &'a [ChannelGroup], channel_id: &str) -> Option<&'a Channel> {
    groups
        .iter()
        .flat_map(|group| group.channels.iter())
        .find(|channel| channel.id == channel_id)
}
