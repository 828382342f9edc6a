use std::collections::BTreeMap;

use glam::{Vec2, Vec3};

use crate::{skeleton::SkeletonAsset, weight::WeightsAsset};

/// A point duplicated per UV seam.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WedgeAsset {
    pub point_index: u32,
    /// Stored UV, V not flipped.
    pub uv: Vec2,
    pub material_index: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceAsset {
    /// Wedge indices in output winding, the reverse of the stored order.
    pub wedges: [usize; 3],
    pub material_index: i8,
    pub aux_material_index: i8,
    pub smoothing_group: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MaterialAsset {
    pub name: String,
    pub texture_index: i32,
    pub poly_flags: u32,
    pub two_sided: bool,
    pub masked: bool,
    pub translucent: bool,
    pub modulated: bool,
    pub aux_material: i32,
    pub aux_flags: i32,
    pub lod_bias: i32,
    pub lod_style: i32,
}

#[derive(Debug, Clone, Default)]
pub struct MeshAsset {
    pub points: Vec<Vec3>,
    pub wedges: Vec<WedgeAsset>,
    pub faces: Vec<FaceAsset>,
    pub materials: Vec<MaterialAsset>,
}

impl MeshAsset {
    pub fn face_points(&self, face: &FaceAsset) -> [u32; 3] {
        face.wedges.map(|wedge| self.wedges[wedge].point_index)
    }

    /// UVs of a face's corners with V flipped for a bottom-left origin.
    pub fn face_uvs(&self, face: &FaceAsset) -> [Vec2; 3] {
        face.wedges.map(|wedge| {
            let uv = self.wedges[wedge].uv;
            Vec2::new(uv.x, 1.0 - uv.y)
        })
    }

    /// Face indices per material index.
    pub fn material_groups(&self) -> BTreeMap<i8, Vec<usize>> {
        let mut groups: BTreeMap<i8, Vec<usize>> = BTreeMap::new();
        for (index, face) in self.faces.iter().enumerate() {
            groups.entry(face.material_index).or_default().push(index);
        }
        groups
    }
}

#[derive(Debug, Clone)]
pub struct SkeletalMeshAsset {
    pub mesh: MeshAsset,
    pub skeleton: SkeletonAsset,
    pub weights: WeightsAsset,
}

#[cfg(test)]
mod test {
    use glam::{Vec2, Vec3};

    use super::{FaceAsset, MeshAsset, WedgeAsset};

    fn mesh() -> MeshAsset {
        let wedge = |point_index, u, v| WedgeAsset {
            point_index,
            uv: Vec2::new(u, v),
            material_index: 0,
        };
        let face = |wedges, material_index| FaceAsset {
            wedges,
            material_index,
            aux_material_index: 0,
            smoothing_group: 0,
        };
        MeshAsset {
            points: vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z],
            wedges: vec![
                wedge(0, 0.0, 0.0),
                wedge(1, 1.0, 0.25),
                wedge(2, 0.0, 1.0),
                wedge(3, 0.5, 0.5),
            ],
            faces: vec![face([2, 1, 0], 0), face([3, 2, 1], 1), face([0, 1, 3], 0)],
            materials: vec![],
        }
    }

    #[test]
    fn test_face_uvs_flip_v() {
        let mesh = mesh();
        let face = mesh.faces[0];
        assert_eq!(mesh.face_points(&face), [2, 1, 0]);
        assert_eq!(
            mesh.face_uvs(&face),
            [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.75), Vec2::new(0.0, 1.0)]
        );
        // The stored model itself is untouched
        assert_eq!(mesh.wedges[1].uv, Vec2::new(1.0, 0.25));
    }

    #[test]
    fn test_material_groups() {
        let groups = mesh().material_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&0], vec![0, 2]);
        assert_eq!(groups[&1], vec![1]);
    }
}
