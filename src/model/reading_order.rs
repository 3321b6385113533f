//! Reading order as an index over page content.

use super::{BlockId, RegionId};
use serde::{Deserialize, Serialize};

/// A non-owning reference into a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "ref", content = "id", rename_all = "snake_case")]
pub enum OrderRef {
    /// A text block
    Block(BlockId),
    /// A whole region (tables and images)
    Region(RegionId),
}

/// The sequence in which a reader visits a page's content.
///
/// Kept apart from the geometric region list so the two can disagree,
/// as they do on multi-column pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReadingOrder(pub Vec<OrderRef>);

impl ReadingOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: OrderRef) {
        self.0.push(item);
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderRef> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Position of an entry, if present.
    pub fn position(&self, item: OrderRef) -> Option<usize> {
        self.0.iter().position(|r| *r == item)
    }

    /// Block ids in order, skipping region entries.
    pub fn block_ids(&self) -> Vec<BlockId> {
        self.0
            .iter()
            .filter_map(|r| match r {
                OrderRef::Block(id) => Some(*id),
                OrderRef::Region(_) => None,
            })
            .collect()
    }
}

impl Extend<OrderRef> for ReadingOrder {
    fn extend<T: IntoIterator<Item = OrderRef>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl FromIterator<OrderRef> for ReadingOrder {
    fn from_iter<T: IntoIterator<Item = OrderRef>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
