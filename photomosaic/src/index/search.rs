//! Nearest-tile search over the color-bin candidate map.
//!
//! Lookup expands outward from the query color's bin one shell at a time.
//! For unconstrained lookup the first non-empty shell set wins; for
//! forbidden-set lookup candidates accumulate across shells until a cutoff
//! so the ranking has enough alternatives to route around the exclusions.
//!
//! The no-repeat constraint is only waived when it is genuinely
//! unsatisfiable: before settling for a forbidden tile, the search falls
//! back to a full scan excluding the forbidden set.

use super::descriptor::TileId;
use super::TileIndex;
use crate::color::{bin_key, distance_squared, BIN_QUANT};
use image::Rgb;
use std::collections::HashSet;

/// Maximum shell radius for unconstrained nearest lookup.
const NEAREST_MAX_RADIUS: i16 = 6;

/// Maximum shell radius when accumulating candidates around a forbidden set.
const AVOID_MAX_RADIUS: i16 = 9;

/// Stop accumulating once this many candidates are gathered.
const AVOID_CANDIDATE_CUTOFF: usize = 2000;

impl TileIndex {
    /// Returns the tile whose average color is nearest to `rgb`.
    ///
    /// Returns None only for an empty index, which a built index never is.
    pub fn nearest(&self, rgb: Rgb<u8>) -> Option<TileId> {
        if self.is_empty() {
            return None;
        }

        let center = bin_key(rgb);
        for radius in 0..NEAREST_MAX_RADIUS {
            let mut best: Option<(u32, TileId)> = None;
            for id in self.shell_candidates(center, radius) {
                let d = self.distance_to(rgb, id);
                if best.map_or(true, |(bd, _)| d < bd) {
                    best = Some((d, id));
                }
            }
            if let Some((_, id)) = best {
                // First populated radius wins; later shells are farther bins.
                return Some(id);
            }
        }

        // Bins exhausted without a hit; scan everything.
        self.scan_nearest(rgb, None)
    }

    /// Returns the nearest tile whose id is not in `forbidden`.
    ///
    /// Falls back to the overall nearest tile when every tile in the index
    /// is forbidden (the constraint is unsatisfiable and must not block
    /// progress).
    pub fn nearest_avoiding(&self, rgb: Rgb<u8>, forbidden: &HashSet<TileId>) -> Option<TileId> {
        if self.is_empty() {
            return None;
        }
        if forbidden.is_empty() {
            return self.nearest(rgb);
        }

        let center = bin_key(rgb);
        let mut candidates: Vec<TileId> = Vec::new();
        for radius in 0..AVOID_MAX_RADIUS {
            candidates.extend(self.shell_candidates(center, radius));
            if candidates.len() >= AVOID_CANDIDATE_CUTOFF {
                break;
            }
        }

        if candidates.is_empty() {
            // No binned neighbors at all; the plain scan path handles it.
            return self.scan_nearest(rgb, Some(forbidden)).or_else(|| self.nearest(rgb));
        }

        let mut scored: Vec<(u32, TileId)> = candidates
            .into_iter()
            .map(|id| (self.distance_to(rgb, id), id))
            .collect();
        scored.sort_unstable();

        if let Some(&(_, id)) = scored.iter().find(|(_, id)| !forbidden.contains(id)) {
            return Some(id);
        }

        // Every binned candidate is forbidden. Check the whole index before
        // waiving the constraint.
        if let Some(id) = self.scan_nearest(rgb, Some(forbidden)) {
            return Some(id);
        }

        // Unsatisfiable; favor completion over strict non-repetition.
        Some(scored[0].1)
    }

    /// Linear scan over all descriptors, optionally excluding a set.
    fn scan_nearest(&self, rgb: Rgb<u8>, forbidden: Option<&HashSet<TileId>>) -> Option<TileId> {
        self.descriptors()
            .filter(|d| forbidden.map_or(true, |f| !f.contains(&d.id)))
            .min_by_key(|d| distance_squared(rgb, d.average))
            .map(|d| d.id)
    }

    /// Tile ids in all bins at exactly `radius` from the center bin.
    fn shell_candidates(
        &self,
        center: (u8, u8, u8),
        radius: i16,
    ) -> impl Iterator<Item = TileId> + '_ {
        let max_bin = (255 / BIN_QUANT) as i16;
        let (cr, cg, cb) = (center.0 as i16, center.1 as i16, center.2 as i16);
        let mut out: Vec<TileId> = Vec::new();

        for dr in -radius..=radius {
            for dg in -radius..=radius {
                for db in -radius..=radius {
                    // Interior bins were already visited at smaller radii.
                    if dr.abs().max(dg.abs()).max(db.abs()) != radius {
                        continue;
                    }
                    let (r, g, b) = (cr + dr, cg + dg, cb + db);
                    if r < 0 || g < 0 || b < 0 || r > max_bin || g > max_bin || b > max_bin {
                        continue;
                    }
                    if let Some(ids) = self.bins().get(&(r as u8, g as u8, b as u8)) {
                        out.extend_from_slice(ids);
                    }
                }
            }
        }

        out.into_iter()
    }

    #[inline]
    fn distance_to(&self, rgb: Rgb<u8>, id: TileId) -> u32 {
        // Ids produced by this index are always valid.
        distance_squared(rgb, self.get(id).map(|d| d.average).unwrap_or(Rgb([0, 0, 0])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexBuilder;
    use image::RgbImage;
    use std::io::Cursor;

    fn index_of_colors(colors: &[Rgb<u8>]) -> TileIndex {
        let entries: Vec<(String, Vec<u8>)> = colors
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let img = RgbImage::from_pixel(4, 4, c);
                let mut bytes = Vec::new();
                img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
                    .unwrap();
                (format!("{}.png", i), bytes)
            })
            .collect();
        IndexBuilder::new(4).build(entries).unwrap()
    }

    #[test]
    fn test_nearest_exact_match() {
        let index = index_of_colors(&[Rgb([0, 0, 0]), Rgb([128, 128, 128]), Rgb([255, 255, 255])]);
        assert_eq!(index.nearest(Rgb([130, 130, 130])), Some(TileId::new(1)));
        assert_eq!(index.nearest(Rgb([5, 5, 5])), Some(TileId::new(0)));
    }

    #[test]
    fn test_nearest_far_query_falls_back_to_scan() {
        // Single dark tile, query at the opposite corner of color space:
        // well outside the bin search radius.
        let index = index_of_colors(&[Rgb([0, 0, 0])]);
        assert_eq!(index.nearest(Rgb([255, 255, 255])), Some(TileId::new(0)));
    }

    #[test]
    fn test_nearest_avoiding_picks_second_best() {
        let index = index_of_colors(&[Rgb([100, 100, 100]), Rgb([110, 110, 110])]);
        let mut forbidden = HashSet::new();
        forbidden.insert(TileId::new(0));

        assert_eq!(
            index.nearest_avoiding(Rgb([100, 100, 100]), &forbidden),
            Some(TileId::new(1))
        );
    }

    #[test]
    fn test_nearest_avoiding_finds_distant_alternative() {
        // The only alternative is far outside the accumulated bins; the
        // constraint must still be honored via the full scan.
        let index = index_of_colors(&[Rgb([10, 10, 10]), Rgb([250, 250, 250])]);
        let mut forbidden = HashSet::new();
        forbidden.insert(TileId::new(0));

        assert_eq!(
            index.nearest_avoiding(Rgb([10, 10, 10]), &forbidden),
            Some(TileId::new(1))
        );
    }

    #[test]
    fn test_nearest_avoiding_waives_when_unsatisfiable() {
        let index = index_of_colors(&[Rgb([10, 10, 10]), Rgb([20, 20, 20])]);
        let forbidden: HashSet<TileId> = [TileId::new(0), TileId::new(1)].into_iter().collect();

        // All tiles forbidden: constraint is waived, nearest wins.
        assert_eq!(
            index.nearest_avoiding(Rgb([10, 10, 10]), &forbidden),
            Some(TileId::new(0))
        );
    }

    #[test]
    fn test_empty_forbidden_set_is_plain_nearest() {
        let index = index_of_colors(&[Rgb([1, 1, 1]), Rgb([200, 200, 200])]);
        assert_eq!(
            index.nearest_avoiding(Rgb([2, 2, 2]), &HashSet::new()),
            index.nearest(Rgb([2, 2, 2]))
        );
    }
}
