use crate::coords::{NdcRect, Vec2};

/// One quad as drawn: identifier plus its NDC bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadRecord {
    pub id: String,
    pub rect: NdcRect,
}

/// Quads drawn during the current (or most recent) frame.
///
/// Items stay in insertion order, which is also hit-test precedence.
/// `clear()` keeps allocated capacity for reuse across frames.
#[derive(Debug, Default)]
pub struct DrawList {
    items: Vec<QuadRecord>,
}

impl DrawList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears recorded items. Keeps allocated capacity for reuse.
    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[inline]
    pub fn push(&mut self, id: impl Into<String>, rect: NdcRect) {
        self.items.push(QuadRecord { id: id.into(), rect });
    }

    /// Returns items in insertion order.
    #[inline]
    pub fn items(&self) -> &[QuadRecord] {
        &self.items
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First record, in insertion order, whose closed bounds contain `p`.
    pub fn first_containing(&self, p: Vec2) -> Option<&QuadRecord> {
        self.items.iter().find(|q| q.rect.contains(p))
    }
}
