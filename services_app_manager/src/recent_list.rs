//! Most-recently-used list of spawned applications

use core_types::{AppRecordId, ProcessId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One entry of the recent list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppTaskInfo {
    pub app_name: String,
    pub process_name: String,
    pub pid: ProcessId,
    pub record_id: AppRecordId,
}

/// Bounded list ordered from most to least recently used
#[derive(Debug, Clone)]
pub struct RecentAppList {
    entries: VecDeque<AppTaskInfo>,
    capacity: usize,
}

impl RecentAppList {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Adds an entry at the front, evicting the oldest when full
    ///
    /// An existing entry for the same record is replaced.
    pub fn add(&mut self, info: AppTaskInfo) {
        self.remove_by_id(info.record_id);
        self.entries.push_front(info);
        self.entries.truncate(self.capacity);
    }

    /// Moves the entry for `record_id` to the front
    pub fn push_front(&mut self, record_id: AppRecordId) -> bool {
        match self.entries.iter().position(|e| e.record_id == record_id) {
            Some(index) => {
                if let Some(entry) = self.entries.remove(index) {
                    self.entries.push_front(entry);
                }
                true
            }
            None => false,
        }
    }

    pub fn remove_by_id(&mut self, record_id: AppRecordId) -> Option<AppTaskInfo> {
        let index = self.entries.iter().position(|e| e.record_id == record_id)?;
        self.entries.remove(index)
    }

    pub fn find(&self, app_name: &str, process_name: &str) -> Option<&AppTaskInfo> {
        self.entries
            .iter()
            .find(|e| e.app_name == app_name && e.process_name == process_name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &AppTaskInfo> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
