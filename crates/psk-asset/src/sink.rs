//! Host-side receivers for imported data.
//!
//! The loaders build immutable assets; a host application implements
//! [`MeshSink`] and [`AnimationSink`] to turn them into scene objects.
//! [`SceneCollector`] is an owning implementation of both.

use glam::{Quat, Vec2, Vec3};
use log::{debug, warn};

use crate::{
    animation::{PoseFrame, TrackInfo},
    loader::{ImportParams, TrackLayout},
    mesh::{MaterialAsset, SkeletalMeshAsset},
    skeleton::EditBone,
};

pub const SINGLE_UV_LAYER: &str = "psk_uv_map_single";
pub const MULTI_UV_LAYER_PREFIX: &str = "psk_uv_map_multi_";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceDesc {
    /// Point indices in output winding.
    pub points: [u32; 3],
    pub material_index: i8,
    pub smoothing_group: i32,
}

/// Per-face UV triples, V already flipped.
#[derive(Debug, Clone, PartialEq)]
pub struct UvLayer {
    pub name: String,
    pub uvs: Vec<[Vec2; 3]>,
}

pub trait MeshSink {
    fn mesh(&mut self, name: &str, points: &[Vec3], faces: &[FaceDesc]);
    fn uv_layer(&mut self, layer: UvLayer);
    fn materials(&mut self, materials: &[MaterialAsset]);
    fn armature(&mut self, name: &str, bones: &[EditBone]);
    /// Add `weights` to the group named after a bone. Weights are added as
    /// they come, never normalized.
    fn vertex_group(&mut self, bone_name: &str, weights: &[(u32, f32)]);
    /// Deform the mesh with the armature. Called only when both were created.
    fn bind(&mut self, _mesh: &str, _armature: &str) {}
}

pub trait AnimationSink {
    fn begin_import(&mut self, _layout: TrackLayout, _source_name: &str) {}
    fn begin_track(&mut self, track: &TrackInfo);
    fn pose(&mut self, pose: &PoseFrame);
    fn end_track(&mut self, _track: &TrackInfo) {}
    fn end_import(&mut self) {}
}

/// Hand a decoded skeletal mesh to `sink` according to `params`.
///
/// Returns false when `params` asks for neither mesh nor bones.
pub fn emit_skeletal_mesh<S: MeshSink + ?Sized>(
    asset: &SkeletalMeshAsset,
    name: &str,
    params: &ImportParams,
    sink: &mut S,
) -> bool {
    if !params.import_mesh && !params.import_bones {
        warn!("Nothing to do, neither mesh nor bones selected for import");
        return false;
    }

    let mesh_name = format!("{}.mo", name);
    let armature_name = format!("{}.ao", name);

    if params.import_bones {
        let bones = asset.skeleton.edit_bones(params.clamped_bone_length());
        debug!("Armature {:?}: {} bones", armature_name, bones.len());
        sink.armature(&armature_name, &bones);
    }

    if params.import_mesh {
        let mesh = &asset.mesh;
        let faces: Vec<FaceDesc> = mesh
            .faces
            .iter()
            .map(|face| FaceDesc {
                points: mesh.face_points(face),
                material_index: face.material_index,
                smoothing_group: face.smoothing_group,
            })
            .collect();
        sink.mesh(&mesh_name, &mesh.points, &faces);
        sink.materials(&mesh.materials);

        let uvs: Vec<[Vec2; 3]> = mesh.faces.iter().map(|face| mesh.face_uvs(face)).collect();
        if params.multi_uv_layers {
            for material in 0..mesh.materials.len() {
                let layer = mesh
                    .faces
                    .iter()
                    .zip(uvs.iter())
                    .map(|(face, uv)| {
                        if face.material_index as i64 == material as i64 {
                            *uv
                        } else {
                            [Vec2::ZERO; 3]
                        }
                    })
                    .collect();
                sink.uv_layer(UvLayer {
                    name: format!("{}{}", MULTI_UV_LAYER_PREFIX, material),
                    uvs: layer,
                });
            }
        } else {
            sink.uv_layer(UvLayer {
                name: SINGLE_UV_LAYER.to_string(),
                uvs,
            });
        }

        let groups = asset.weights.group_by_bone(asset.skeleton.len());
        for (bone, weights) in asset.skeleton.bones().iter().zip(groups.iter()) {
            sink.vertex_group(&bone.name, weights);
        }

        if params.import_bones {
            sink.bind(&mesh_name, &armature_name);
        }
    }
    true
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectedMesh {
    pub name: String,
    pub points: Vec<Vec3>,
    pub faces: Vec<FaceDesc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectedPose {
    pub bone_name: String,
    pub bone_index: usize,
    pub frame_index: u32,
    pub translation: Vec3,
    pub rotation: Quat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectedTrack {
    pub info: TrackInfo,
    pub poses: Vec<CollectedPose>,
}

/// Sink that keeps owned copies of everything it receives.
#[derive(Debug, Clone, Default)]
pub struct SceneCollector {
    pub mesh: Option<CollectedMesh>,
    pub uv_layers: Vec<UvLayer>,
    pub materials: Vec<MaterialAsset>,
    pub armature: Option<(String, Vec<EditBone>)>,
    pub vertex_groups: Vec<(String, Vec<(u32, f32)>)>,
    pub bound: Option<(String, String)>,
    pub layout: Option<TrackLayout>,
    pub tracks: Vec<CollectedTrack>,
}

impl MeshSink for SceneCollector {
    fn mesh(&mut self, name: &str, points: &[Vec3], faces: &[FaceDesc]) {
        self.mesh = Some(CollectedMesh {
            name: name.to_string(),
            points: points.to_vec(),
            faces: faces.to_vec(),
        });
    }

    fn uv_layer(&mut self, layer: UvLayer) {
        self.uv_layers.push(layer);
    }

    fn materials(&mut self, materials: &[MaterialAsset]) {
        self.materials.extend_from_slice(materials);
    }

    fn armature(&mut self, name: &str, bones: &[EditBone]) {
        self.armature = Some((name.to_string(), bones.to_vec()));
    }

    fn vertex_group(&mut self, bone_name: &str, weights: &[(u32, f32)]) {
        match self
            .vertex_groups
            .iter_mut()
            .find(|(name, _)| name == bone_name)
        {
            Some((_, group)) => group.extend_from_slice(weights),
            None => self
                .vertex_groups
                .push((bone_name.to_string(), weights.to_vec())),
        }
    }

    fn bind(&mut self, mesh: &str, armature: &str) {
        self.bound = Some((mesh.to_string(), armature.to_string()));
    }
}

impl AnimationSink for SceneCollector {
    fn begin_import(&mut self, layout: TrackLayout, _source_name: &str) {
        self.layout = Some(layout);
    }

    fn begin_track(&mut self, track: &TrackInfo) {
        self.tracks.push(CollectedTrack {
            info: track.clone(),
            poses: Vec::new(),
        });
    }

    fn pose(&mut self, pose: &PoseFrame) {
        let Some(track) = self.tracks.last_mut() else {
            warn!("Pose for {:?} outside of any track, dropped", pose.bone_name);
            return;
        };
        track.poses.push(CollectedPose {
            bone_name: pose.bone_name.to_string(),
            bone_index: pose.bone_index,
            frame_index: pose.frame_index,
            translation: pose.translation,
            rotation: pose.rotation,
        });
    }
}
