use super::{BinConfig, Packer};
use crate::model::{Frame, Rect};

#[derive(Clone, Copy, Debug)]
struct SkylineNode {
    x: u32,
    y: u32,
    w: u32,
}

impl SkylineNode {
    #[inline]
    fn right(&self) -> u32 {
        self.x + self.w
    }
}

/// Bottom-left skyline packer; rectangles are placed in the order they are offered.
pub struct SkylinePacker {
    bin: BinConfig,
    border: Rect,
    skylines: Vec<SkylineNode>,
}

impl SkylinePacker {
    pub fn new(bin: BinConfig) -> Self {
        Self {
            bin,
            border: Rect::new(0, 0, bin.width, bin.height),
            skylines: vec![SkylineNode {
                x: 0,
                y: 0,
                w: bin.width,
            }],
        }
    }

    fn can_put(&self, mut i: usize, w: u32, h: u32) -> Option<Rect> {
        let mut rect = Rect::new(self.skylines[i].x, 0, w, h);
        let mut width_left = rect.w;
        loop {
            rect.y = rect.y.max(self.skylines[i].y);
            if !self.border.contains(&rect) {
                return None;
            }
            if self.skylines[i].w >= width_left {
                return Some(rect);
            }
            width_left -= self.skylines[i].w;
            i += 1;
            if i >= self.skylines.len() {
                return None;
            }
        }
    }

    fn find_bottom_left(&self, w: u32, h: u32) -> Option<(usize, Rect)> {
        if w == 0 || h == 0 {
            return None;
        }
        let mut best: Option<(u32, u32, usize, Rect)> = None; // (bottom, node width, index, rect)
        for i in 0..self.skylines.len() {
            if let Some(r) = self.can_put(i, w, h) {
                let cand = (r.bottom(), self.skylines[i].w);
                if best.is_none_or(|b| cand < (b.0, b.1)) {
                    best = Some((cand.0, cand.1, i, r));
                }
            }
        }
        best.map(|(_, _, i, r)| (i, r))
    }

    fn split(&mut self, index: usize, rect: &Rect) {
        self.skylines.insert(
            index,
            SkylineNode {
                x: rect.x,
                y: rect.bottom(),
                w: rect.w,
            },
        );

        // shrink or drop the nodes now covered by the new one
        let i = index + 1;
        while i < self.skylines.len() {
            let prev_right = self.skylines[i - 1].right();
            if self.skylines[i].x >= prev_right {
                break;
            }
            let shrink = prev_right - self.skylines[i].x;
            if self.skylines[i].w <= shrink {
                self.skylines.remove(i);
            } else {
                self.skylines[i].x += shrink;
                self.skylines[i].w -= shrink;
                break;
            }
        }
    }

    fn merge(&mut self) {
        let mut i = 1;
        while i < self.skylines.len() {
            if self.skylines[i - 1].y == self.skylines[i].y {
                let w = self.skylines[i].w;
                self.skylines[i - 1].w = self.skylines[i - 1].w.saturating_add(w);
                self.skylines.remove(i);
            } else {
                i += 1;
            }
        }
    }
}

impl<K> Packer<K> for SkylinePacker {
    fn can_pack(&self, rect: &Rect) -> bool {
        let (w, h) = self.bin.slot_size(rect.w, rect.h);
        self.find_bottom_left(w, h).is_some()
    }

    fn pack(&mut self, key: K, rect: &Rect) -> Option<Frame<K>> {
        let (w, h) = self.bin.slot_size(rect.w, rect.h);
        let (i, slot) = self.find_bottom_left(w, h)?;
        self.split(i, &slot);
        self.merge();
        Some(Frame {
            key,
            frame: self.bin.content_rect(&slot, rect.w, rect.h),
        })
    }
}
