/**
 * Favorites Data Model
 *
 * This module defines the identifiers and the set type shared by the local
 * state, the delta queue and the remote store adapters.
 *
 * Identifiers are opaque strings issued by the backend. Both `UserId` and
 * `ItemId` serialize transparently so cached files and remote documents keep
 * the plain `["offerA", "offerB"]` array shape.
 */
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Identifier of an authenticated user
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Identifier of a favoritable item (an offer)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Mutation carried by a sync delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Add-to-set
    Add,
    /// Remove-from-set
    Remove,
}

impl Operation {
    /// Operation that moves an item to the given membership
    pub fn for_membership(member: bool) -> Self {
        if member {
            Operation::Add
        } else {
            Operation::Remove
        }
    }

    /// Membership an item has after this operation is applied
    pub fn membership(self) -> bool {
        matches!(self, Operation::Add)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add => f.write_str("add"),
            Operation::Remove => f.write_str("remove"),
        }
    }
}

/// Set of favorite item identifiers
///
/// Ordering carries no meaning; a `BTreeSet` is used so snapshots compare and
/// serialize deterministically. Deserializing an array with duplicate ids
/// collapses them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoriteSet(BTreeSet<ItemId>);

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, item_id: &ItemId) -> bool {
        self.0.contains(item_id)
    }

    /// Returns true if the item was not present
    pub fn insert(&mut self, item_id: ItemId) -> bool {
        self.0.insert(item_id)
    }

    /// Returns true if the item was present
    pub fn remove(&mut self, item_id: &ItemId) -> bool {
        self.0.remove(item_id)
    }

    /// Force membership of an item
    pub fn set_membership(&mut self, item_id: &ItemId, member: bool) {
        if member {
            self.0.insert(item_id.clone());
        } else {
            self.0.remove(item_id);
        }
    }

    /// Apply an add/remove operation
    pub fn apply(&mut self, item_id: &ItemId, operation: Operation) {
        self.set_membership(item_id, operation.membership());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<ItemId> {
        self.0.iter().cloned().collect()
    }
}

impl FromIterator<ItemId> for FavoriteSet {
    fn from_iter<T: IntoIterator<Item = ItemId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for FavoriteSet {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Self(iter.into_iter().map(ItemId::new).collect())
    }
}

impl IntoIterator for FavoriteSet {
    type Item = ItemId;
    type IntoIter = std::collections::btree_set::IntoIter<ItemId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
