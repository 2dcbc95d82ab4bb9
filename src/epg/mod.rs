//! In-memory electronic program guide store.
//!
//! A mapping from channel identifier to a time-ordered program list,
//! replaced wholesale on every refresh.

use chrono::{DateTime, Utc};

use crate::models::{EpgData, ProgramEntry};

#[derive(Debug, Clone, Default)]
pub struct EpgStore {
    data: EpgData,
}

impl EpgStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_data(data: EpgData) -> Self {
        Self { data }
    }

    /// Replaces the full guide; the refresh path is the only mutator.
    pub fn replace_all(&mut self, data: EpgData) {
        self.data = data;
    }

    pub fn programs_for(&self, channel_id: &str) -> &[ProgramEntry] {
        self.data
            .get(channel_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The program airing on `channel_id` at time `at`.
    ///
    /// Returns the first entry satisfying `start <= at < end`. If a malformed
    /// feed has overlapping entries, the first encountered wins; no further
    /// tie-breaking is applied.
    pub fn current_program(&self, channel_id: &str, at: DateTime<Utc>) -> Option<&ProgramEntry> {
        self.programs_for(channel_id)
            .iter()
            .find(|program| program.start_time <= at && at < program.end_time)
    }

    /// Up to `limit` programs starting at or after `at`, in feed order.
    pub fn upcoming(&self, channel_id: &str, at: DateTime<Utc>, limit: usize) -> Vec<&ProgramEntry> {
        self.programs_for(channel_id)
            .iter()
            .filter(|program| program.start_time >= at)
            .take(limit)
            .collect()
    }

    pub fn channel_count(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn entry(channel_id: &str, idx: usize, start_hour: u32, end_hour: u32) -> ProgramEntry {
        ProgramEntry {
            id: format!("{channel_id}_program_{idx}"),
            channel_id: channel_id.to_string(),
            title: format!("Program {idx}"),
            description: None,
            start_time: Utc.with_ymd_and_hms(2024, 5, 1, start_hour, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 5, 1, end_hour, 0, 0).unwrap(),
            duration_minutes: 60,
        }
    }

    fn store() -> EpgStore {
        let mut data: EpgData = HashMap::new();
        data.insert(
            "channel_1".to_string(),
            vec![entry("channel_1", 0, 8, 9), entry("channel_1", 1, 9, 10)],
        );
        EpgStore::from_data(data)
    }

    #[test]
    fn current_program_inside_second_window() {
        let store = store();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let program = store.current_program("channel_1", at).unwrap();
        assert_eq!(program.id, "channel_1_program_1");
    }

    #[test]
    fn current_program_before_schedule_is_none() {
        let store = store();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
        assert!(store.current_program("channel_1", at).is_none());
    }

    #[test]
    fn window_start_is_inclusive_and_end_exclusive() {
        let store = store();
        let at_start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert_eq!(
            store.current_program("channel_1", at_start).unwrap().id,
            "channel_1_program_0"
        );
        let at_boundary = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        assert_eq!(
            store.current_program("channel_1", at_boundary).unwrap().id,
            "channel_1_program_1"
        );
    }

    #[test]
    fn overlapping_entries_first_encountered_wins() {
        let mut data: EpgData = HashMap::new();
        data.insert(
            "channel_1".to_string(),
            vec![entry("channel_1", 0, 8, 10), entry("channel_1", 1, 9, 10)],
        );
        let store = EpgStore::from_data(data);

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        assert_eq!(
            store.current_program("channel_1", at).unwrap().id,
            "channel_1_program_0"
        );
    }

    #[test]
    fn unknown_channel_has_no_programs() {
        let store = store();
        assert!(store.programs_for("channel_99").is_empty());
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        assert!(store.current_program("channel_99", at).is_none());
    }

    #[test]
    fn upcoming_respects_limit_and_cutoff() {
        let store = store();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let next = store.upcoming("channel_1", at, 5);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].id, "channel_1_program_1");
    }
}
