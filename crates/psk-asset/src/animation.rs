//! Animation sets and their reconstruction into bone poses.
//!
//! Raw keys are stored in clip, frame, bone slot order. [`PoseReconstructor`]
//! walks that stream once, composing keys with the skeleton's world transforms
//! and handing every resolved pose to an [`AnimationSink`].

use std::{collections::BTreeSet, f32::consts::FRAC_PI_2};

use glam::{Mat4, Quat, Vec3};
use log::{debug, info, warn};

use crate::{
    chunk::ChunkHeader,
    error::ImportError,
    loader::{ImportParams, TrackLayout},
    sink::AnimationSink,
    skeleton::SkeletonAsset,
};

/// Entry of the animation bone table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationBone {
    pub name: String,
    /// Matching bone of the target skeleton.
    pub target: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub group: String,
    pub bone_count: usize,
    pub frame_count: usize,
    pub root_include: i32,
    pub key_compression_style: i32,
    pub key_quotum: i32,
    pub key_reduction: f32,
    pub track_time: f32,
    pub anim_rate: f32,
    pub start_bone: i32,
    pub first_raw_frame: i32,
}

impl AnimationClip {
    /// `bone_count * frame_count`, `None` when that does not fit a `u64`.
    pub fn raw_key_count(&self) -> Option<u64> {
        (self.bone_count as u64).checked_mul(self.frame_count as u64)
    }

    /// Name shown to the host, `"(group) name"` unless the group is `"None"`.
    pub fn display_name(&self, prefix: Option<&str>) -> String {
        let name = if self.group == "None" {
            self.name.clone()
        } else {
            format!("({}) {}", self.group, self.name)
        };
        match prefix {
            Some(prefix) => format!("({}) {}", prefix, name),
            None => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawKey {
    pub translation: Vec3,
    pub rotation: Quat,
    /// Time until the next key.
    pub time_delta: f32,
}

#[derive(Debug, Clone)]
pub struct AnimationSetAsset {
    bones: Vec<AnimationBone>,
    clips: Vec<AnimationClip>,
    keys: Vec<RawKey>,
    // Key range of clip `i` is `clip_offsets[i]..clip_offsets[i + 1]`
    clip_offsets: Vec<usize>,
    trailing_chunks: Vec<ChunkHeader>,
}

impl AnimationSetAsset {
    /// Fails with [`ImportError::KeyCountMismatch`] unless the clips cover
    /// exactly `keys`.
    pub fn new(
        bones: Vec<AnimationBone>,
        clips: Vec<AnimationClip>,
        keys: Vec<RawKey>,
        trailing_chunks: Vec<ChunkHeader>,
    ) -> Result<Self, ImportError> {
        let expected = Self::expected_raw_keys(&clips)?;
        if expected != keys.len() as u64 {
            return Err(ImportError::KeyCountMismatch {
                expected,
                actual: keys.len() as u64,
            });
        }
        // Every count fits now, their total is keys.len()
        let mut clip_offsets = Vec::with_capacity(clips.len() + 1);
        let mut offset = 0usize;
        clip_offsets.push(offset);
        for clip in &clips {
            offset += clip.bone_count * clip.frame_count;
            clip_offsets.push(offset);
        }
        Ok(Self {
            bones,
            clips,
            keys,
            clip_offsets,
            trailing_chunks,
        })
    }

    /// Total raw keys the clips cover.
    ///
    /// Fails with [`ImportError::InvalidClip`] naming the first clip that pushes
    /// the total past `u64::MAX`.
    pub fn expected_raw_keys(clips: &[AnimationClip]) -> Result<u64, ImportError> {
        clips.iter().try_fold(0u64, |total, clip| {
            clip.raw_key_count()
                .and_then(|count| total.checked_add(count))
                .ok_or_else(|| ImportError::InvalidClip {
                    name: clip.name.clone(),
                    bone_count: i32::try_from(clip.bone_count).unwrap_or(i32::MAX),
                    frame_count: i32::try_from(clip.frame_count).unwrap_or(i32::MAX),
                })
        })
    }

    pub fn bones(&self) -> &[AnimationBone] {
        &self.bones
    }

    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    pub fn keys(&self) -> &[RawKey] {
        &self.keys
    }

    /// File indices of bone table entries without a target bone.
    pub fn not_found(&self) -> BTreeSet<usize> {
        self.bones
            .iter()
            .enumerate()
            .filter(|(_, bone)| bone.target.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    /// Target bone of a clip slot. Slots beyond the bone table never resolve.
    pub fn slot_target(&self, slot: usize) -> Option<usize> {
        self.bones.get(slot).and_then(|bone| bone.target)
    }

    pub fn clip_keys(&self, clip: usize) -> &[RawKey] {
        &self.keys[self.clip_offsets[clip]..self.clip_offsets[clip + 1]]
    }

    /// Headers of optional chunks after the raw keys, payloads skipped.
    pub fn trailing_chunks(&self) -> &[ChunkHeader] {
        &self.trailing_chunks
    }
}

/// Fixed correction applied to every non-root pose rotation.
pub fn axis_correction() -> Quat {
    Quat::from_rotation_z(-FRAC_PI_2)
}

/// Pose of one skeleton bone at one frame, in armature space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseFrame<'a> {
    pub bone_name: &'a str,
    pub bone_index: usize,
    /// Frame within the clip.
    pub frame_index: u32,
    pub translation: Vec3,
    pub rotation: Quat,
}

impl PoseFrame<'_> {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }
}

/// Placement of one clip in the host's animation tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    /// Track the clip is placed on.
    pub track: String,
    /// Display name of the clip.
    pub name: String,
    pub clip_index: usize,
    pub start_frame: u32,
    pub frame_count: u32,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconstructSummary {
    pub tracks: usize,
    pub consumed_keys: usize,
    pub emitted_poses: usize,
}

pub struct PoseReconstructor<'a> {
    skeleton: &'a SkeletonAsset,
    animation: &'a AnimationSetAsset,
    // (slot, bone) pairs, parents before children
    slot_order: Vec<(usize, usize)>,
}

impl<'a> PoseReconstructor<'a> {
    pub fn new(skeleton: &'a SkeletonAsset, animation: &'a AnimationSetAsset) -> Self {
        let mut slot_order: Vec<(usize, usize)> = animation
            .bones()
            .iter()
            .enumerate()
            .filter_map(|(slot, bone)| bone.target.map(|target| (slot, target)))
            .filter(|(_, target)| *target < skeleton.len())
            .collect();
        slot_order.sort_by_key(|(slot, target)| (skeleton.rank(*target), *slot));
        Self {
            skeleton,
            animation,
            slot_order,
        }
    }

    /// Replay one clip from the bind pose, returning the number of keys consumed.
    pub fn reconstruct_clip(
        &self,
        clip_index: usize,
        mut emit: impl FnMut(PoseFrame<'a>),
    ) -> usize {
        let skeleton = self.skeleton;
        let clip = &self.animation.clips()[clip_index];
        let keys = self.animation.clip_keys(clip_index);
        if clip.bone_count == 0 {
            return 0;
        }
        let mut world = skeleton.bind_matrices();

        for (frame_index, frame_keys) in keys.chunks_exact(clip.bone_count).enumerate() {
            for (slot, bone_index) in self.slot_order.iter().copied() {
                let Some(key) = frame_keys.get(slot) else {
                    continue;
                };
                let bone = skeleton.bone(bone_index);
                let (translation, rotation) = match bone.parent {
                    Some(parent) => {
                        let parent_world = world[parent];
                        let local_rotation = key.rotation.conjugate();
                        world[bone_index] = parent_world
                            * Mat4::from_rotation_translation(local_rotation, key.translation);
                        let (_, parent_rotation, _) = parent_world.to_scale_rotation_translation();
                        (
                            parent_world.transform_point3(key.translation),
                            parent_rotation * local_rotation * axis_correction(),
                        )
                    }
                    None => {
                        world[bone_index] =
                            Mat4::from_rotation_translation(key.rotation, key.translation);
                        (key.translation, key.rotation)
                    }
                };
                emit(PoseFrame {
                    bone_name: &bone.name,
                    bone_index,
                    frame_index: frame_index as u32,
                    translation,
                    rotation,
                });
            }
        }
        keys.len()
    }

    /// Stream every clip to `sink`, laid out as `params.track_layout` says.
    pub fn run<S: AnimationSink + ?Sized>(
        &self,
        params: &ImportParams,
        source_name: &str,
        sink: &mut S,
    ) -> ReconstructSummary {
        let not_found = self.animation.not_found();
        if !not_found.is_empty() {
            warn!(
                "{} animation bones have no match in the skeleton, their keys are skipped",
                not_found.len()
            );
        }

        let prefix = params.filename_as_prefix.then_some(source_name);
        let mut summary = ReconstructSummary::default();
        let mut start_frame = 0u32;
        sink.begin_import(params.track_layout, source_name);
        for (clip_index, clip) in self.animation.clips().iter().enumerate() {
            let name = clip.display_name(prefix);
            let track = match params.track_layout {
                TrackLayout::Timeline => TrackInfo {
                    track: source_name.to_string(),
                    name,
                    clip_index,
                    start_frame,
                    frame_count: clip.frame_count as u32,
                    active: false,
                },
                TrackLayout::Separate => TrackInfo {
                    track: name.clone(),
                    name,
                    clip_index,
                    start_frame: 0,
                    frame_count: clip.frame_count as u32,
                    active: clip_index == 0,
                },
            };
            info!(
                "Clip {:>3}/{:<3} frames: {:>4} {}",
                clip_index + 1,
                self.animation.clips().len(),
                clip.frame_count,
                track.name
            );

            sink.begin_track(&track);
            let mut emitted = 0usize;
            let consumed = self.reconstruct_clip(clip_index, |pose| {
                emitted += 1;
                sink.pose(&pose);
            });
            sink.end_track(&track);
            debug!("Clip {:?}: {} keys, {} poses", track.name, consumed, emitted);

            start_frame += clip.frame_count as u32;
            summary.tracks += 1;
            summary.consumed_keys += consumed;
            summary.emitted_poses += emitted;
        }
        sink.end_import();
        summary
    }
}
