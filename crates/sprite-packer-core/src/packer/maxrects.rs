use super::{BinConfig, Packer};
use crate::config::MaxRectsHeuristic;
use crate::model::{Frame, Rect};

pub struct MaxRectsPacker {
    bin: BinConfig,
    free: Vec<Rect>,
    heuristic: MaxRectsHeuristic,
}

impl MaxRectsPacker {
    pub fn new(bin: BinConfig, heuristic: MaxRectsHeuristic) -> Self {
        Self {
            bin,
            free: vec![Rect::new(0, 0, bin.width, bin.height)],
            heuristic,
        }
    }

    fn place_rect(&mut self, node: &Rect) {
        // split all free rectangles that intersect with node
        let mut new_free: Vec<Rect> = Vec::with_capacity(self.free.len() + 4);
        for fr in self.free.iter() {
            if !fr.intersects(node) {
                new_free.push(*fr);
                continue;
            }
            // above
            if node.y > fr.y {
                new_free.push(Rect::new(fr.x, fr.y, fr.w, node.y - fr.y));
            }
            // below
            if node.bottom() < fr.bottom() {
                new_free.push(Rect::new(fr.x, node.bottom(), fr.w, fr.bottom() - node.bottom()));
            }
            // left
            if node.x > fr.x {
                new_free.push(Rect::new(fr.x, fr.y, node.x - fr.x, fr.h));
            }
            // right
            if node.right() < fr.right() {
                new_free.push(Rect::new(node.right(), fr.y, fr.right() - node.right(), fr.h));
            }
        }
        self.free = new_free;
        self.prune_free_list();
    }

    fn prune_free_list(&mut self) {
        let mut i = 0;
        while i < self.free.len() {
            let a = self.free[i];
            let mut remove_i = false;
            let mut j = i + 1;
            while j < self.free.len() {
                let b = self.free[j];
                if b.contains(&a) {
                    remove_i = true;
                    break;
                }
                if a.contains(&b) {
                    self.free.remove(j);
                    continue;
                }
                j += 1;
            }
            if remove_i {
                self.free.remove(i);
            } else {
                i += 1;
            }
        }
    }

    fn score(&self, fr: &Rect, w: u32, h: u32) -> (u64, u64) {
        let leftover_h = (fr.w - w) as u64;
        let leftover_v = (fr.h - h) as u64;
        let short_fit = leftover_h.min(leftover_v);
        let long_fit = leftover_h.max(leftover_v);
        match self.heuristic {
            MaxRectsHeuristic::BestAreaFit => (fr.area() - (w as u64 * h as u64), short_fit),
            MaxRectsHeuristic::BestShortSideFit => (short_fit, long_fit),
            MaxRectsHeuristic::BottomLeft => ((fr.y + h) as u64, fr.x as u64),
        }
    }

    fn find_position(&self, w: u32, h: u32) -> Option<Rect> {
        if w == 0 || h == 0 {
            return None;
        }
        let mut best: Option<(u64, u64, u32, u32)> = None; // (score1, score2, top, left)
        let mut best_rect = None;

        for fr in &self.free {
            if fr.w < w || fr.h < h {
                continue;
            }
            // perfect fit early-out
            if fr.w == w && fr.h == h {
                return Some(Rect::new(fr.x, fr.y, w, h));
            }
            let (s1, s2) = self.score(fr, w, h);
            // tie-break: prefer smaller top side (y + h), then smaller x
            let cand = (s1, s2, fr.y + h, fr.x);
            if best.is_none_or(|b| cand < b) {
                best = Some(cand);
                best_rect = Some(Rect::new(fr.x, fr.y, w, h));
            }
        }
        best_rect
    }

    pub fn free_list_len(&self) -> usize {
        self.free.len()
    }
}

impl<K> Packer<K> for MaxRectsPacker {
    fn can_pack(&self, rect: &Rect) -> bool {
        let (w, h) = self.bin.slot_size(rect.w, rect.h);
        self.find_position(w, h).is_some()
    }

    fn pack(&mut self, key: K, rect: &Rect) -> Option<Frame<K>> {
        let (w, h) = self.bin.slot_size(rect.w, rect.h);
        let slot = self.find_position(w, h)?;
        self.place_rect(&slot);
        Some(Frame {
            key,
            frame: self.bin.content_rect(&slot, rect.w, rect.h),
        })
    }
}
