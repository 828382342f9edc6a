use log::warn;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexWeight {
    pub point_index: u32,
    pub bone_index: i32,
    pub weight: f32,
}

/// Raw skin influences, sorted by point index.
///
/// Weights are kept exactly as stored; a point may have several influences and
/// they are never normalized.
#[derive(Debug, Clone, Default)]
pub struct WeightsAsset {
    weights: Vec<VertexWeight>,
}

impl WeightsAsset {
    pub fn new(mut weights: Vec<VertexWeight>) -> Self {
        // Stable, so influences of one point keep their file order
        weights.sort_by_key(|weight| weight.point_index);
        Self { weights }
    }

    pub fn weights(&self) -> &[VertexWeight] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Contiguous influence runs, one per weighted point.
    pub fn by_point(&self) -> impl Iterator<Item = (u32, &[VertexWeight])> {
        self.weights
            .chunk_by(|a, b| a.point_index == b.point_index)
            .map(|group| (group[0].point_index, group))
    }

    /// `(point_index, weight)` lists indexed by bone, in point order.
    pub fn group_by_bone(&self, bone_count: usize) -> Vec<Vec<(u32, f32)>> {
        let mut groups = vec![Vec::new(); bone_count];
        let mut skipped = 0usize;
        for weight in &self.weights {
            match usize::try_from(weight.bone_index)
                .ok()
                .and_then(|bone| groups.get_mut(bone))
            {
                Some(group) => group.push((weight.point_index, weight.weight)),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(
                "{} weights reference bones outside the {} bone skeleton, skipped",
                skipped, bone_count
            );
        }
        groups
    }
}
