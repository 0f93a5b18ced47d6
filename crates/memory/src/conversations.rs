//! Insertion-ordered map of conversation id to turns.
//!
//! Serialized as a plain JSON object whose key order is creation order, so
//! the sidebar order survives a reload without pulling in an ordered-map crate.

use std::fmt;

use aurion_core::turn::{ConversationId, Turn};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversations {
    entries: Vec<(ConversationId, Vec<Turn>)>,
}

impl Conversations {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &ConversationId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: &ConversationId) -> Option<&Vec<Turn>> {
        self.position(id).map(|i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, id: &ConversationId) -> Option<&mut Vec<Turn>> {
        self.position(id).map(|i| &mut self.entries[i].1)
    }

    /// The turns for `id`, appending an empty conversation at the end if needed.
    pub fn get_or_create(&mut self, id: &ConversationId) -> &mut Vec<Turn> {
        let index = match self.position(id) {
            Some(i) => i,
            None => {
                self.entries.push((id.clone(), Vec::new()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    pub fn remove(&mut self, id: &ConversationId) -> Option<Vec<Turn>> {
        self.position(id).map(|i| self.entries.remove(i).1)
    }

    pub fn ids(&self) -> Vec<ConversationId> {
        self.entries.iter().map(|(id, _)| id.clone()).collect()
    }

    fn position(&self, id: &ConversationId) -> Option<usize> {
        self.entries.iter().position(|(existing, _)| existing == id)
    }
}

impl Serialize for Conversations {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, turns) in &self.entries {
            map.serialize_entry(id, turns)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Conversations {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ConversationsVisitor)
    }
}

struct ConversationsVisitor;

impl<'de> Visitor<'de> for ConversationsVisitor {
    type Value = Conversations;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of conversation id to a list of turns")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut conversations = Conversations::default();
        while let Some((id, turns)) = access.next_entry::<ConversationId, Vec<Turn>>()? {
            // A repeated key replaces the earlier value but keeps its slot.
            *conversations.get_or_create(&id) = turns;
        }
        Ok(conversations)
    }
}
