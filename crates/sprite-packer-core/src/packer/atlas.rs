use super::{BinConfig, Packer, maxrects::MaxRectsPacker, skyline::SkylinePacker};
use crate::compositing::next_pow2;
use crate::config::{AtlasConfig, MaxRectsHeuristic, PackingStrategy};
use crate::error::{Result, SpritePackerError};
use crate::model::{Frame, NormRect, PackStats, Rect};
use crate::pixel::PixelBuffer;
use tracing::{debug, instrument};

/// Output of one packing run: the atlas bitmap and one rect per input.
#[derive(Debug, Clone)]
pub struct PackedAtlas {
    pub pixels: PixelBuffer,
    /// Per input index; `None` if the input had no pixels to place.
    pub rects: Vec<Option<NormRect>>,
    pixel_rects: Vec<Option<Rect>>,
}

impl PackedAtlas {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Exact pixel rect of input `index`.
    pub fn pixel_rect(&self, index: usize) -> Option<Rect> {
        self.pixel_rects.get(index).copied().flatten()
    }

    pub fn stats(&self) -> PackStats {
        let placed: Vec<&Rect> = self.pixel_rects.iter().flatten().collect();
        let used_area: u64 = placed.iter().map(|r| r.area()).sum();
        let total = self.pixels.area();
        PackStats {
            num_frames: placed.len(),
            atlas_width: self.width(),
            atlas_height: self.height(),
            used_area,
            occupancy: if total > 0 {
                used_area as f64 / total as f64
            } else {
                0.0
            },
        }
    }
}

/// A packing strategy: the order inputs are offered in and the bin packer that places them.
pub trait AtlasPacker {
    fn name(&self) -> &'static str;
    /// Input indices in placement order. Indices of missing inputs come last.
    fn placement_order(&self, sizes: &[Option<(u32, u32)>]) -> Vec<usize>;
    fn new_bin(&self, bin: BinConfig) -> Box<dyn Packer<usize>>;
}

/// Descending area, stable by input index; missing inputs last.
pub struct MaxRectsStrategy {
    pub heuristic: MaxRectsHeuristic,
}

impl AtlasPacker for MaxRectsStrategy {
    fn name(&self) -> &'static str {
        "maxrects"
    }

    fn placement_order(&self, sizes: &[Option<(u32, u32)>]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..sizes.len()).collect();
        order.sort_by(|&a, &b| match (sizes[a], sizes[b]) {
            (Some((aw, ah)), Some((bw, bh))) => {
                (bw as u64 * bh as u64).cmp(&(aw as u64 * ah as u64))
            }
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
        order
    }

    fn new_bin(&self, bin: BinConfig) -> Box<dyn Packer<usize>> {
        Box::new(MaxRectsPacker::new(bin, self.heuristic))
    }
}

/// Input order, skyline bottom-left.
pub struct NativeStrategy;

impl AtlasPacker for NativeStrategy {
    fn name(&self) -> &'static str {
        "native"
    }

    fn placement_order(&self, sizes: &[Option<(u32, u32)>]) -> Vec<usize> {
        let (mut present, missing): (Vec<usize>, Vec<usize>) =
            (0..sizes.len()).partition(|&i| sizes[i].is_some());
        present.extend(missing);
        present
    }

    fn new_bin(&self, bin: BinConfig) -> Box<dyn Packer<usize>> {
        Box::new(SkylinePacker::new(bin))
    }
}

impl PackingStrategy {
    pub fn packer(&self, heuristic: MaxRectsHeuristic) -> Box<dyn AtlasPacker> {
        match self {
            PackingStrategy::MaxRects => Box::new(MaxRectsStrategy { heuristic }),
            PackingStrategy::NativePacker => Box::new(NativeStrategy),
        }
    }
}

/// Packs with the strategy and limits of `cfg`.
pub fn pack_atlas(buffers: &[Option<PixelBuffer>], cfg: &AtlasConfig) -> Result<PackedAtlas> {
    let strategy = cfg.packing_strategy.packer(cfg.max_rects_heuristic);
    pack(buffers, cfg.padding, cfg.max_size, strategy.as_ref())
}

#[instrument(skip_all, fields(inputs = buffers.len(), padding = padding, max_size = max_size, strategy = strategy.name()))]
/// Packs `buffers` into a single atlas no larger than `max_size` on either side.
///
/// Notes:
/// - Every rect is kept at least `padding` pixels away from its neighbours.
/// - The bin starts at the smallest power of two that can hold the padded area and doubles
///   (width first) until `max_size`; if nothing fits there the call fails with `ExceedsMaxSize`.
/// - The final bitmap is cropped to the used extent rounded up to a power of two.
/// - Inputs that are `None` or empty are not placed and get a `None` rect.
pub fn pack(
    buffers: &[Option<PixelBuffer>],
    padding: u32,
    max_size: u32,
    strategy: &dyn AtlasPacker,
) -> Result<PackedAtlas> {
    if max_size == 0 || padding.saturating_mul(2) >= max_size {
        return Err(SpritePackerError::InvalidConfig(format!(
            "padding {padding} does not fit a max size of {max_size}"
        )));
    }
    let sizes: Vec<Option<(u32, u32)>> = buffers
        .iter()
        .map(|b| b.as_ref().map(|b| b.dimensions()).filter(|&(w, h)| w > 0 && h > 0))
        .collect();
    let total = sizes.iter().flatten().count();
    if total == 0 {
        return Ok(PackedAtlas {
            pixels: PixelBuffer::new(1, 1),
            rects: vec![None; buffers.len()],
            pixel_rects: vec![None; buffers.len()],
        });
    }

    let order = strategy.placement_order(&sizes);
    let mut padded_area = 0u64;
    let (mut max_w, mut max_h) = (0u32, 0u32);
    for &(w, h) in sizes.iter().flatten() {
        let (pw, ph) = (w.saturating_add(padding), h.saturating_add(padding));
        padded_area += pw as u64 * ph as u64;
        max_w = max_w.max(pw);
        max_h = max_h.max(ph);
    }
    if max_w > max_size || max_h > max_size {
        return Err(SpritePackerError::ExceedsMaxSize {
            max_size,
            placed: 0,
            total,
        });
    }
    let too_large = || SpritePackerError::ExceedsMaxSize {
        max_size,
        placed: 0,
        total,
    };
    let side = next_pow2((padded_area as f64).sqrt().ceil().min(u32::MAX as f64) as u32)
        .ok_or_else(too_large)?;
    let mut bin_w = side
        .max(next_pow2(max_w).ok_or_else(too_large)?)
        .min(max_size);
    let mut bin_h = side
        .max(next_pow2(max_h).ok_or_else(too_large)?)
        .min(max_size);

    loop {
        let bin = BinConfig::new(bin_w, bin_h, padding);
        match place_all(strategy, bin, &order, &sizes) {
            Ok(frames) => {
                debug!(bin_w, bin_h, placed = frames.len(), "all inputs placed");
                return Ok(compose(buffers, &frames, bin));
            }
            Err(placed) => {
                if bin_w >= max_size && bin_h >= max_size {
                    return Err(SpritePackerError::ExceedsMaxSize {
                        max_size,
                        placed,
                        total,
                    });
                }
                if bin_w <= bin_h && bin_w < max_size {
                    bin_w = bin_w.saturating_mul(2).min(max_size);
                } else {
                    bin_h = bin_h.saturating_mul(2).min(max_size);
                }
                debug!(bin_w, bin_h, placed, total, "growing bin");
            }
        }
    }
}

/// Places every present input into one bin, or reports how many fit before the first failure.
fn place_all(
    strategy: &dyn AtlasPacker,
    bin: BinConfig,
    order: &[usize],
    sizes: &[Option<(u32, u32)>],
) -> std::result::Result<Vec<Frame>, usize> {
    let mut packer = strategy.new_bin(bin);
    let mut frames = Vec::with_capacity(order.len());
    for &idx in order {
        let Some((w, h)) = sizes[idx] else {
            continue;
        };
        match packer.pack(idx, &Rect::new(0, 0, w, h)) {
            Some(f) => frames.push(f),
            None => return Err(frames.len()),
        }
    }
    Ok(frames)
}

/// Crops the bin to the used extent (power of two) and blits every placed buffer.
fn compose(buffers: &[Option<PixelBuffer>], frames: &[Frame], bin: BinConfig) -> PackedAtlas {
    let pad_rem = bin.padding - bin.padding / 2;
    let (mut used_w, mut used_h) = (1u32, 1u32);
    for f in frames {
        used_w = used_w.max(f.frame.right() + pad_rem);
        used_h = used_h.max(f.frame.bottom() + pad_rem);
    }
    let width = next_pow2(used_w).map_or(bin.width, |w| w.min(bin.width));
    let height = next_pow2(used_h).map_or(bin.height, |h| h.min(bin.height));

    let mut pixels = PixelBuffer::new(width, height);
    let mut rects = vec![None; buffers.len()];
    let mut pixel_rects = vec![None; buffers.len()];
    for f in frames {
        if let Some(src) = &buffers[f.key] {
            pixels.blit(src, f.frame.x, f.frame.y);
        }
        rects[f.key] = Some(NormRect::from_pixels(&f.frame, width, height));
        pixel_rects[f.key] = Some(f.frame);
    }
    PackedAtlas {
        pixels,
        rects,
        pixel_rects,
    }
}
