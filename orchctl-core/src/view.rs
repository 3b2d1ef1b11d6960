use std::collections::HashMap;

use crate::model::{GroupKey, ProcessRecord};

/// Processes sharing a group key, in snapshot order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupView {
    pub group_key: GroupKey,
    pub members: Vec<ProcessRecord>,
}

impl GroupView {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn running_count(&self) -> usize {
        self.members.iter().filter(|p| p.running).count()
    }
}

/// Group a snapshot for rendering.
///
/// Groups come out in the order their key first appears in `records`, and
/// members keep their relative input order. Keys are never sorted.
pub fn group_records(records: &[ProcessRecord]) -> Vec<GroupView> {
    let mut groups: Vec<GroupView> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let slot = *slots.entry(record.group.as_str()).or_insert_with(|| {
            groups.push(GroupView {
                group_key: record.group.clone(),
                members: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].members.push(record.clone());
    }

    groups
}

/// The set/unset action offered to the user.
///
/// Derived from the last rendered snapshot, so it can lag the orchestrator
/// by up to one refresh.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ModeToggle {
    /// Nothing rendered yet; the toggle is disabled.
    #[default]
    Pending,
    Set,
    Unset,
}

impl ModeToggle {
    pub fn from_snapshot(records: &[ProcessRecord]) -> Self {
        if records.is_empty() {
            Self::Set
        } else {
            Self::Unset
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "-",
            Self::Set => "set",
            Self::Unset => "unset",
        }
    }
}
