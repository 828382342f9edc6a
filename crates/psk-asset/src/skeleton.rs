use std::collections::HashMap;

use glam::{Mat3, Mat4, Quat, Vec3};
use log::{debug, warn};

use crate::error::ImportError;

#[derive(Debug, Clone)]
pub struct BoneAsset {
    pub name: String,
    /// Position in the bone table, also the id used by weights.
    pub index: usize,
    /// Parent index as stored in the file.
    pub parent_index: i32,
    /// Resolved parent, `None` only for the root.
    pub parent: Option<usize>,
    pub flags: i32,
    pub child_count: i32,
    pub local_position: Vec3,
    /// Stored rotation with its imaginary part negated.
    pub local_rotation: Quat,
    pub local_scale: Vec3,
    pub length: f32,
    pub bind_matrix: Mat4,
}

impl BoneAsset {
    /// Build a bone from raw stored fields. `rotation` is `[x, y, z, w]` as stored.
    pub fn new(
        name: String,
        index: usize,
        parent_index: i32,
        rotation: [f32; 4],
        position: [f32; 3],
    ) -> Self {
        let [x, y, z, w] = rotation;
        let mut bone = Self {
            name,
            index,
            parent_index,
            parent: None,
            flags: 0,
            child_count: 0,
            local_position: Vec3::from_array(position),
            local_rotation: Quat::from_xyzw(-x, -y, -z, w),
            local_scale: Vec3::ONE,
            length: 0.0,
            bind_matrix: Mat4::IDENTITY,
        };
        bone.bind_matrix = bone.local_matrix();
        bone
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.local_position) * Mat4::from_quat(self.local_rotation)
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Name to bone resolution used when binding animations to a skeleton.
pub trait BoneLookup {
    fn bone_index(&self, name: &str) -> Option<usize>;
}

impl BoneLookup for HashMap<String, usize> {
    fn bone_index(&self, name: &str) -> Option<usize> {
        self.get(name).copied()
    }
}

/// Bone as handed to the host armature.
#[derive(Debug, Clone, PartialEq)]
pub struct EditBone {
    pub name: String,
    pub parent: Option<String>,
    pub head: Vec3,
    pub tail: Vec3,
    /// Rotation around the head to tail axis, in radians.
    pub roll: f32,
}

#[derive(Debug, Clone)]
pub struct SkeletonAsset {
    bones: Vec<BoneAsset>,
    // Processing order, parents first
    order: Vec<usize>,
    // bone index -> position in `order`
    rank: Vec<usize>,
    by_name: HashMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    InPath,
    Done,
}

impl SkeletonAsset {
    /// Resolve parents, validate the hierarchy and compute bind matrices.
    pub fn new(mut bones: Vec<BoneAsset>) -> Result<Self, ImportError> {
        let count = bones.len();
        for index in 0..count {
            let bone = &bones[index];
            let parent = if index == 0 && bone.parent_index == 0 {
                None
            } else if bone.parent_index >= 0
                && (bone.parent_index as usize) < count
                && bone.parent_index as usize != index
            {
                Some(bone.parent_index as usize)
            } else {
                return Err(Self::integrity_error(bone));
            };
            bones[index].parent = parent;
        }

        let order = Self::topological_order(&bones)?;
        if order.iter().enumerate().any(|(position, index)| position != *index) {
            warn!("Bone table stores children before their parents, reordered");
        }
        let mut rank = vec![0; count];
        for (position, index) in order.iter().enumerate() {
            rank[*index] = position;
        }

        for index in order.iter().copied() {
            let local = bones[index].local_matrix();
            bones[index].bind_matrix = match bones[index].parent {
                Some(parent) => bones[parent].bind_matrix * local,
                None => local,
            };
            debug!(
                "Bone #{} {:?} parent {:?}",
                index, bones[index].name, bones[index].parent
            );
        }

        let mut by_name = HashMap::with_capacity(count);
        for bone in bones.iter() {
            if by_name.insert(bone.name.clone(), bone.index).is_some() {
                warn!("Duplicated bone name {:?}, last one wins", bone.name);
            }
        }

        Ok(Self {
            bones,
            order,
            rank,
            by_name,
        })
    }

    fn integrity_error(bone: &BoneAsset) -> ImportError {
        ImportError::SkeletonIntegrity {
            bone: bone.index,
            name: bone.name.clone(),
            parent_index: bone.parent_index,
        }
    }

    fn topological_order(bones: &[BoneAsset]) -> Result<Vec<usize>, ImportError> {
        let mut state = vec![VisitState::Unvisited; bones.len()];
        let mut order = Vec::with_capacity(bones.len());
        let mut path = Vec::new();
        for start in 0..bones.len() {
            let mut current = Some(start);
            while let Some(index) = current {
                match state[index] {
                    VisitState::Done => break,
                    VisitState::InPath => return Err(Self::integrity_error(&bones[index])),
                    VisitState::Unvisited => {
                        state[index] = VisitState::InPath;
                        path.push(index);
                        current = bones[index].parent;
                    }
                }
            }
            while let Some(index) = path.pop() {
                state[index] = VisitState::Done;
                order.push(index);
            }
        }
        Ok(order)
    }

    pub fn bones(&self) -> &[BoneAsset] {
        &self.bones
    }

    pub fn bone(&self, index: usize) -> &BoneAsset {
        &self.bones[index]
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    /// Bone indices in an order where every parent precedes its children.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn rank(&self, index: usize) -> usize {
        self.rank[index]
    }

    pub fn find(&self, name: &str) -> Option<&BoneAsset> {
        self.by_name.get(name).map(|index| &self.bones[*index])
    }

    pub fn bind_matrices(&self) -> Vec<Mat4> {
        self.bones.iter().map(|bone| bone.bind_matrix).collect()
    }

    pub fn edit_bones(&self, bone_length: f32) -> Vec<EditBone> {
        self.bones
            .iter()
            .map(|bone| {
                let rotation = Mat3::from_mat4(bone.bind_matrix);
                let direction = (rotation * Vec3::X).try_normalize().unwrap_or(Vec3::Y);
                let up = (rotation * Vec3::Z).try_normalize().unwrap_or(Vec3::Z);
                let head = bone.bind_matrix.w_axis.truncate();
                EditBone {
                    name: bone.name.clone(),
                    parent: bone.parent.map(|parent| self.bones[parent].name.clone()),
                    head,
                    tail: head + direction * bone_length,
                    roll: roll_towards(direction, up),
                }
            })
            .collect()
    }
}

impl BoneLookup for SkeletonAsset {
    fn bone_index(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }
}

/// Roll that turns the zero-roll Z axis of a Y-forward bone pointing along
/// `direction` towards `up`.
fn roll_towards(direction: Vec3, up: Vec3) -> f32 {
    let zero_roll_z = Quat::from_rotation_arc(Vec3::Y, direction) * Vec3::Z;
    let Some(up) = (up - direction * up.dot(direction)).try_normalize() else {
        return 0.0;
    };
    direction
        .dot(zero_roll_z.cross(up))
        .atan2(zero_roll_z.dot(up))
}

#[cfg(test)]
mod test {
    use std::f32::consts::FRAC_PI_2;

    use glam::{Mat4, Quat, Vec3};

    use super::{roll_towards, BoneAsset, SkeletonAsset};
    use crate::error::ImportError;

    fn stored(rotation: Quat) -> [f32; 4] {
        // Files store the conjugate of the local rotation
        let conjugate = rotation.conjugate();
        [conjugate.x, conjugate.y, conjugate.z, conjugate.w]
    }

    #[test]
    fn test_bind_matrix_composes_parent_chain() {
        let rotations = [
            Quat::from_rotation_z(FRAC_PI_2),
            Quat::from_rotation_x(0.3),
            Quat::from_rotation_y(-0.7),
        ];
        let positions = [[1.0, 2.0, 3.0], [0.0, 4.0, 0.0], [2.0, 0.0, -1.0]];
        let bones = vec![
            BoneAsset::new("root".into(), 0, 0, stored(rotations[0]), positions[0]),
            BoneAsset::new("spine".into(), 1, 0, stored(rotations[1]), positions[1]),
            BoneAsset::new("head".into(), 2, 1, stored(rotations[2]), positions[2]),
        ];
        let skeleton = SkeletonAsset::new(bones).unwrap();

        let local: Vec<Mat4> = (0..3)
            .map(|index| {
                Mat4::from_translation(Vec3::from_array(positions[index]))
                    * Mat4::from_quat(rotations[index])
            })
            .collect();
        let expected_root = local[0];
        let expected_spine = expected_root * local[1];
        let expected_head = expected_spine * local[2];

        assert!(skeleton.bone(0).bind_matrix.abs_diff_eq(expected_root, 1e-5));
        assert!(skeleton.bone(1).bind_matrix.abs_diff_eq(expected_spine, 1e-5));
        assert!(skeleton.bone(2).bind_matrix.abs_diff_eq(expected_head, 1e-5));
        assert_eq!(skeleton.bone(2).parent, Some(1));
        assert!(skeleton.bone(0).is_root());
    }

    #[test]
    fn test_children_stored_before_parents_are_reordered() {
        let bones = vec![
            BoneAsset::new("root".into(), 0, 0, [0.0, 0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            BoneAsset::new("hand".into(), 1, 2, [0.0, 0.0, 0.0, 1.0], [0.0, 0.0, 1.0]),
            BoneAsset::new("arm".into(), 2, 0, [0.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ];
        let skeleton = SkeletonAsset::new(bones).unwrap();
        assert_eq!(skeleton.order(), &[0, 2, 1]);
        assert!(skeleton.rank(2) < skeleton.rank(1));
        let head = skeleton.bone(1).bind_matrix.w_axis.truncate();
        assert!(head.abs_diff_eq(Vec3::new(1.0, 1.0, 1.0), 1e-6));
    }

    #[test]
    fn test_unresolved_parent() {
        let bones = vec![
            BoneAsset::new("root".into(), 0, 0, [0.0, 0.0, 0.0, 1.0], [0.0; 3]),
            BoneAsset::new("lost".into(), 1, 7, [0.0, 0.0, 0.0, 1.0], [0.0; 3]),
        ];
        let error = SkeletonAsset::new(bones).unwrap_err();
        assert!(matches!(
            error,
            ImportError::SkeletonIntegrity {
                bone: 1,
                parent_index: 7,
                ..
            }
        ));
    }

    #[test]
    fn test_parent_cycle() {
        let bones = vec![
            BoneAsset::new("root".into(), 0, 0, [0.0, 0.0, 0.0, 1.0], [0.0; 3]),
            BoneAsset::new("a".into(), 1, 2, [0.0, 0.0, 0.0, 1.0], [0.0; 3]),
            BoneAsset::new("b".into(), 2, 1, [0.0, 0.0, 0.0, 1.0], [0.0; 3]),
        ];
        let error = SkeletonAsset::new(bones).unwrap_err();
        assert!(matches!(error, ImportError::SkeletonIntegrity { .. }));
    }

    #[test]
    fn test_edit_bone_points_along_local_x() {
        let bones = vec![
            BoneAsset::new("root".into(), 0, 0, [0.0, 0.0, 0.0, 1.0], [0.0; 3]),
            BoneAsset::new(
                "child".into(),
                1,
                0,
                stored(Quat::from_rotation_z(FRAC_PI_2)),
                [1.0, 0.0, 0.0],
            ),
        ];
        let skeleton = SkeletonAsset::new(bones).unwrap();
        let edit_bones = skeleton.edit_bones(0.5);

        assert_eq!(edit_bones[0].parent, None);
        assert!(edit_bones[0].tail.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
        assert!(edit_bones[0].roll.abs() < 1e-6);

        assert_eq!(edit_bones[1].parent.as_deref(), Some("root"));
        assert!(edit_bones[1].head.abs_diff_eq(Vec3::X, 1e-6));
        assert!(edit_bones[1]
            .tail
            .abs_diff_eq(Vec3::new(1.0, 0.5, 0.0), 1e-6));
    }

    #[test]
    fn test_roll_sign() {
        assert!((roll_towards(Vec3::Y, Vec3::X) - FRAC_PI_2).abs() < 1e-6);
        assert!((roll_towards(Vec3::Y, -Vec3::X) + FRAC_PI_2).abs() < 1e-6);
    }
}
