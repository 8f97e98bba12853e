//! Read-only lookup tables built once per run from board metadata.
use std::collections::HashMap;

use crate::error::ProjectionError;
use crate::model::{BoardList, Member};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardLookup {
    members: HashMap<String, String>,
    lists: HashMap<String, String>,
    closed_lists: HashMap<String, String>,
}

impl BoardLookup {
    /// `lists` is keyed by every list on the board so that an open card left
    /// on an archived list still resolves its name; `closed_lists` holds the
    /// archived ones only.
    pub fn build(
        members: &[Member],
        open_lists: &[BoardList],
        closed_lists: &[BoardList],
    ) -> Self {
        let members = members
            .iter()
            .map(|m| (m.id.clone(), m.username.clone()))
            .collect();
        let lists = open_lists
            .iter()
            .chain(closed_lists)
            .map(|l| (l.id.clone(), l.name.clone()))
            .collect();
        let closed_lists = closed_lists
            .iter()
            .map(|l| (l.id.clone(), l.name.clone()))
            .collect();
        Self {
            members,
            lists,
            closed_lists,
        }
    }

    pub fn member_name(&self, card_id: &str, member_id: &str) -> Result<&str, ProjectionError> {
        self.members
            .get(member_id)
            .map(String::as_str)
            .ok_or_else(|| ProjectionError::UnknownMember {
                card_id: card_id.to_string(),
                member_id: member_id.to_string(),
            })
    }

    pub fn list_name(&self, card_id: &str, list_id: &str) -> Result<&str, ProjectionError> {
        self.lists
            .get(list_id)
            .map(String::as_str)
            .ok_or_else(|| ProjectionError::UnknownList {
                card_id: card_id.to_string(),
                list_id: list_id.to_string(),
            })
    }

    pub fn is_closed_list(&self, list_id: &str) -> bool {
        self.closed_lists.contains_key(list_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    pub fn closed_list_count(&self) -> usize {
        self.closed_lists.len()
    }
}
