use crate::model::{Frame, Rect};

pub mod atlas;
pub mod maxrects;
pub mod skyline;

/// Dimensions and padding of a single bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinConfig {
    pub width: u32,
    pub height: u32,
    /// Pixels reserved around each rect: half before it, the remainder after.
    pub padding: u32,
}

impl BinConfig {
    pub fn new(width: u32, height: u32, padding: u32) -> Self {
        Self {
            width,
            height,
            padding,
        }
    }

    /// Size of the slot reserved for a `w x h` rect.
    pub fn slot_size(&self, w: u32, h: u32) -> (u32, u32) {
        (w.saturating_add(self.padding), h.saturating_add(self.padding))
    }

    /// Content rect inside a reserved slot.
    pub fn content_rect(&self, slot: &Rect, w: u32, h: u32) -> Rect {
        let off = self.padding / 2;
        Rect::new(slot.x.saturating_add(off), slot.y.saturating_add(off), w, h)
    }
}

/// A packer places rectangles into one bin.
///
/// Implementations must ensure no overlaps and keep reserved slots inside the bin.
/// `pack` returns `None` if the rectangle cannot be placed in the bin.
pub trait Packer<K> {
    fn can_pack(&self, rect: &Rect) -> bool;
    fn pack(&mut self, key: K, rect: &Rect) -> Option<Frame<K>>;
}
