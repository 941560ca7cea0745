use kiddo::{KdTree, SquaredEuclidean};
use tracing::debug;

use crate::adapter::Row;

pub fn radec_to_xyz(ra: f64, dec: f64) -> [f64; 3] {
    let (ra, dec) = (ra.to_radians(), dec.to_radians());
    [dec.cos() * ra.cos(), dec.cos() * ra.sin(), dec.sin()]
}

#[derive(Debug, Clone, Copy)]
pub struct Neighbour<'a> {
    pub row: &'a Row,
    /// Angular separation in degrees.
    pub separation: f64,
}

pub struct SpatialIndex {
    tree: KdTree<f64, 3>,
    rows: Vec<Row>,
}

impl SpatialIndex {
    /// Rows without a finite `ra`/`dec` pair are left out.
    pub fn build(rows: Vec<Row>) -> Self {
        let total = rows.len();
        let mut tree: KdTree<f64, 3> = KdTree::with_capacity(total);
        let mut indexed = Vec::with_capacity(total);
        for row in rows {
            let (Some(ra), Some(dec)) = (row.float("ra"), row.float("dec")) else {
                continue;
            };
            if !ra.is_finite() || !dec.is_finite() {
                continue;
            }
            tree.add(&radec_to_xyz(ra, dec), indexed.len() as u64);
            indexed.push(row);
        }
        debug!(indexed = indexed.len(), skipped = total - indexed.len(), "spatial index");
        Self {
            tree,
            rows: indexed,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Up to `count` rows closest to (`ra`, `dec`), nearest first.
    pub fn nearest(&self, ra: f64, dec: f64, count: usize) -> Vec<Neighbour<'_>> {
        if count == 0 || self.rows.is_empty() {
            return Vec::new();
        }
        self.tree
            .nearest_n::<SquaredEuclidean>(&radec_to_xyz(ra, dec), count)
            .into_iter()
            .filter_map(|found| {
                let row = self.rows.get(found.item as usize)?;
                Some(Neighbour {
                    row,
                    separation: chord_to_degrees(found.distance),
                })
            })
            .collect()
    }
}

fn chord_to_degrees(squared_chord: f64) -> f64 {
    let half = (squared_chord.sqrt() / 2.0).min(1.0);
    (2.0 * half.asin()).to_degrees()
}
