use crate::error::PlotError;
use crate::linkage::Linkage;
use log::debug;

/// Horizontal spacing between neighbouring leaves.
pub const LEAF_SPACING: f64 = 10.0;

/// The upside-down "U" drawn for one merge.
///
/// Points run bottom-left, top-left, top-right, bottom-right. The top two
/// sit at the merge distance; the bottom ones sit at the heights where the
/// children were formed (0 for leaves).
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Row of the linkage matrix this link draws.
    pub merge: usize,
    pub xs: [f64; 4],
    pub ys: [f64; 4],
}

impl Link {
    pub fn distance(&self) -> f64 {
        self.ys[1]
    }

    /// Midpoint of the horizontal bar.
    pub fn apex(&self) -> (f64, f64) {
        (0.5 * (self.xs[1] + self.xs[2]), self.ys[1])
    }
}

/// Dendrogram geometry in data coordinates.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Links in drawing order (post-order from the root, left before right).
    pub links: Vec<Link>,
    /// Leaf ids from left to right.
    pub leaf_order: Vec<usize>,
    /// Highest merge distance.
    pub max_distance: f64,
}

impl Layout {
    pub fn leaf_position(slot: usize) -> f64 {
        slot as f64 * LEAF_SPACING + LEAF_SPACING / 2.0
    }

    /// Width of the x-axis in data units.
    pub fn x_extent(&self) -> f64 {
        self.leaf_order.len() as f64 * LEAF_SPACING
    }

    /// Height of the y-axis in data units, with 5% headroom above the root.
    ///
    /// Distances too small to scale (zero or subnormal) give a unit axis;
    /// headroom that would overflow is clamped to `f64::MAX`.
    pub fn y_extent(&self) -> f64 {
        if self.max_distance < f64::MIN_POSITIVE {
            return 1.0;
        }
        let extent = self.max_distance + self.max_distance * 0.05;
        if extent.is_finite() {
            extent
        } else {
            f64::MAX
        }
    }
}

enum Step {
    Visit(usize),
    Join(usize),
}

/// Place leaves and merges.
///
/// Leaves get consecutive slots in the order a left-first walk from the root
/// reaches them, so no two links cross. A merged cluster then stands at the
/// midpoint of its children for any higher merge.
pub fn compute(linkage: &Linkage) -> Result<Layout, PlotError> {
    let n = linkage.leaf_count();
    let merges = linkage.merges();

    // (x, height) once a node has been placed
    let mut placed: Vec<Option<(f64, f64)>> = vec![None; 2 * n - 1];
    let mut leaf_order = Vec::with_capacity(n);
    let mut links = Vec::with_capacity(merges.len());

    let mut stack = vec![Step::Visit(linkage.root())];
    while let Some(step) = stack.pop() {
        match step {
            Step::Visit(id) if id < n => {
                placed[id] = Some((Layout::leaf_position(leaf_order.len()), 0.0));
                leaf_order.push(id);
            }
            Step::Visit(id) => {
                let merge = &merges[id - n];
                stack.push(Step::Join(id));
                stack.push(Step::Visit(merge.right));
                stack.push(Step::Visit(merge.left));
            }
            Step::Join(id) => {
                let row = id - n;
                let merge = &merges[row];
                let (Some((xl, hl)), Some((xr, hr))) = (placed[merge.left], placed[merge.right])
                else {
                    return Err(PlotError::invalid(
                        row + 1,
                        "merge reached before both of its children were placed",
                    ));
                };
                let h = merge.distance;
                links.push(Link {
                    merge: row,
                    xs: [xl, xl, xr, xr],
                    ys: [hl, h, h, hr],
                });
                placed[id] = Some((0.5 * (xl + xr), h));
            }
        }
    }

    if links.len() != merges.len() || leaf_order.len() != n {
        return Err(PlotError::invalid(
            merges.len(),
            "some merges are not reachable from the root",
        ));
    }

    debug!("Leaf order: {:?}", leaf_order);

    Ok(Layout {
        links,
        leaf_order,
        max_distance: linkage.max_distance(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkage::Merge;

    fn linkage(rows: &[(usize, usize, f64)]) -> Linkage {
        let merges = rows
            .iter()
            .map(|&(left, right, distance)| Merge { left, right, distance, size: 2.0 })
            .collect();
        Linkage::from_merges(merges, false).unwrap()
    }

    #[test]
    fn places_three_leaves() {
        let layout = compute(&linkage(&[(0, 1, 0.5), (2, 3, 1.2)])).unwrap();

        assert_eq!(layout.leaf_order, vec![2, 0, 1]);
        assert_eq!(
            layout.links,
            vec![
                Link { merge: 0, xs: [15.0, 15.0, 25.0, 25.0], ys: [0.0, 0.5, 0.5, 0.0] },
                Link { merge: 1, xs: [5.0, 5.0, 20.0, 20.0], ys: [0.0, 1.2, 1.2, 0.5] },
            ]
        );
        assert_eq!(layout.links[1].apex(), (12.5, 1.2));
        assert_eq!(layout.x_extent(), 30.0);
        assert!((layout.y_extent() - 1.26).abs() < 1e-12);
    }

    #[test]
    fn drawing_order_follows_the_tree_not_the_rows() {
        // root joins row 1 (left) with row 0 (right)
        let layout = compute(&linkage(&[(2, 3, 1.0), (0, 1, 2.0), (5, 4, 3.0)])).unwrap();

        let order: Vec<usize> = layout.links.iter().map(|l| l.merge).collect();
        assert_eq!(order, vec![1, 0, 2]);
        assert_eq!(layout.leaf_order, vec![0, 1, 2, 3]);
        assert_eq!(layout.links[2].xs, [10.0, 10.0, 30.0, 30.0]);
        assert_eq!(layout.links[2].ys, [2.0, 3.0, 3.0, 1.0]);
    }

    #[test]
    fn every_merge_yields_one_link() {
        let rows: Vec<(usize, usize, f64)> = (0..50)
            .map(|i| if i == 0 { (0, 1, 0.1) } else { (i + 1, 50 + i, 0.1 * (i + 1) as f64) })
            .collect();
        let layout = compute(&linkage(&rows)).unwrap();

        assert_eq!(layout.links.len(), 50);
        assert_eq!(layout.leaf_order.len(), 51);
        for link in &layout.links {
            assert_eq!(link.ys[1], link.ys[2]);
            assert_eq!(link.xs[0], link.xs[1]);
            assert_eq!(link.xs[2], link.xs[3]);
        }
    }

    #[test]
    fn flat_linkage_keeps_a_unit_axis() {
        let layout = compute(&linkage(&[(0, 1, 0.0)])).unwrap();
        assert_eq!(layout.y_extent(), 1.0);

        let layout = compute(&linkage(&[(0, 1, 5e-324)])).unwrap();
        assert_eq!(layout.y_extent(), 1.0);
    }

    #[test]
    fn huge_distances_keep_a_finite_axis() {
        let layout = compute(&linkage(&[(0, 1, 1.75e308)])).unwrap();
        let extent = layout.y_extent();
        assert!(extent.is_finite());
        assert!(extent >= 1.75e308);
    }
}
