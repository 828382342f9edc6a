use std::{
    fs::File,
    io::{BufReader, Cursor, Read, Seek},
    path::Path,
};

use glam::{Quat, Vec3};
use log::{debug, info, warn};

use crate::{
    animation::{AnimationBone, AnimationClip, AnimationSetAsset, RawKey},
    chunk::{self, Chunk, ChunkHeader, ChunkTag},
    error::ImportError,
    skeleton::BoneLookup,
};

use format::{PsaAnimInfo, PsaBone, PsaRawKey};

pub mod format;

struct PsaLoader<'a, R, L: ?Sized> {
    reader: &'a mut R,
    lookup: &'a L,
}

impl<'a, R: Read + Seek, L: BoneLookup + ?Sized> PsaLoader<'a, R, L> {
    fn new(reader: &'a mut R, lookup: &'a L) -> Self {
        Self { reader, lookup }
    }

    fn next_chunk(&mut self, tag: ChunkTag) -> Result<Chunk, ImportError> {
        let chunk = chunk::read_chunk(self.reader)?;
        chunk.check_id(tag);
        Ok(chunk)
    }

    fn read_bones(&mut self) -> Result<Vec<AnimationBone>, ImportError> {
        let bones: Vec<PsaBone> = self.next_chunk(format::BONES_TAG)?.records()?;
        let bones: Vec<AnimationBone> = bones
            .into_iter()
            .map(|bone| {
                let target = self.lookup.bone_index(&bone.name);
                match target {
                    Some(target) => debug!("Bone {:?} -> #{}", bone.name, target),
                    None => warn!("Bone {:?} not found in the skeleton", bone.name),
                }
                AnimationBone {
                    name: bone.name,
                    target,
                }
            })
            .collect();
        if bones.iter().all(|bone| bone.target.is_none()) {
            return Err(ImportError::NoMatchingBones);
        }
        Ok(bones)
    }

    fn read_clips(&mut self) -> Result<Vec<AnimationClip>, ImportError> {
        let infos: Vec<PsaAnimInfo> = self.next_chunk(format::INFO_TAG)?.records()?;
        infos
            .into_iter()
            .map(|info| {
                let (Ok(bone_count), Ok(frame_count)) = (
                    usize::try_from(info.total_bones),
                    usize::try_from(info.num_raw_frames),
                ) else {
                    return Err(ImportError::InvalidClip {
                        name: info.name,
                        bone_count: info.total_bones,
                        frame_count: info.num_raw_frames,
                    });
                };
                Ok(AnimationClip {
                    name: info.name,
                    group: info.group,
                    bone_count,
                    frame_count,
                    root_include: info.root_include,
                    key_compression_style: info.key_compression_style,
                    key_quotum: info.key_quotum,
                    key_reduction: info.key_reduction,
                    track_time: info.track_time,
                    anim_rate: info.anim_rate,
                    start_bone: info.start_bone,
                    first_raw_frame: info.first_raw_frame,
                })
            })
            .collect()
    }

    fn read_keys(&mut self, expected: u64) -> Result<Vec<RawKey>, ImportError> {
        let header = chunk::read_header(self.reader)?;
        if header.element_count < 0 || header.element_count as u64 != expected {
            return Err(ImportError::KeyCountMismatch {
                expected,
                actual: header.element_count.max(0) as u64,
            });
        }
        let chunk = chunk::read_payload(self.reader, header)?;
        chunk.check_id(format::KEYS_TAG);
        let keys: Vec<PsaRawKey> = chunk.records()?;
        Ok(keys
            .into_iter()
            .map(|key| {
                let [x, y, z, w] = key.rotation;
                RawKey {
                    translation: Vec3::from_array(key.position),
                    rotation: Quat::from_xyzw(x, y, z, w),
                    time_delta: key.time,
                }
            })
            .collect())
    }

    fn read_trailing(&mut self) -> Result<Vec<ChunkHeader>, ImportError> {
        let mut headers = Vec::new();
        while !chunk::at_end(self.reader)? {
            match chunk::skip_chunk(self.reader) {
                Ok(header) => {
                    debug!("Skipped optional chunk {}", header);
                    headers.push(header);
                }
                Err(err) => {
                    warn!("Stopped reading optional chunks: {}", err);
                    break;
                }
            }
        }
        if headers.is_empty() {
            debug!("No scale or curve keys");
        }
        Ok(headers)
    }

    fn load(mut self) -> Result<AnimationSetAsset, ImportError> {
        chunk::read_file_header(self.reader, format::PSA_MAGIC)?;

        let bones = self.read_bones()?;
        let clips = self.read_clips()?;
        let expected = AnimationSetAsset::expected_raw_keys(&clips)?;
        let keys = self.read_keys(expected)?;
        let trailing = self.read_trailing()?;

        let animation = AnimationSetAsset::new(bones, clips, keys, trailing)?;
        info!(
            "Loaded animation set: {} bones ({} unmatched), {} clips, {} keys",
            animation.bones().len(),
            animation.not_found().len(),
            animation.clips().len(),
            animation.keys().len()
        );
        Ok(animation)
    }
}

/// Read an animation set, resolving its bone table with `lookup`.
///
/// Fails with [`ImportError::NoMatchingBones`] before any key is read when no
/// bone name resolves.
pub fn load_psa<R: Read + Seek, L: BoneLookup + ?Sized>(
    reader: &mut R,
    lookup: &L,
) -> Result<AnimationSetAsset, ImportError> {
    PsaLoader::new(reader, lookup).load()
}

pub fn load_psa_from_buffer<L: BoneLookup + ?Sized>(
    buffer: &[u8],
    lookup: &L,
) -> Result<AnimationSetAsset, ImportError> {
    load_psa(&mut Cursor::new(buffer), lookup)
}

pub fn load_psa_from_path<P: AsRef<Path>, L: BoneLookup + ?Sized>(
    path: P,
    lookup: &L,
) -> Result<AnimationSetAsset, ImportError> {
    let path = path.as_ref();
    info!("Importing animation set {}", path.display());
    let mut reader = BufReader::new(File::open(path)?);
    load_psa(&mut reader, lookup)
}
