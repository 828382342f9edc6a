use binrw::prelude::*;

use crate::{
    chunk::{ChunkRecord, ChunkTag},
    text::decode_name,
};

pub use crate::loader::psk::format::PskBone as PsaBone;

pub const PSA_MAGIC: ChunkTag = ChunkTag::new("ANIMHEAD");
pub const BONES_TAG: ChunkTag = ChunkTag::new("BONENAMES");
pub const INFO_TAG: ChunkTag = ChunkTag::new("ANIMINFO");
pub const KEYS_TAG: ChunkTag = ChunkTag::new("ANIMKEYS");

#[derive(Debug, Clone, BinRead)]
pub struct PsaAnimInfo {
    #[br(map = |raw: [u8; 64]| decode_name(&raw))]
    pub name: String,
    #[br(map = |raw: [u8; 64]| decode_name(&raw))]
    pub group: String,
    pub total_bones: i32,
    pub root_include: i32,
    pub key_compression_style: i32,
    pub key_quotum: i32,
    pub key_reduction: f32,
    pub track_time: f32,
    pub anim_rate: f32,
    pub start_bone: i32,
    pub first_raw_frame: i32,
    pub num_raw_frames: i32,
}

impl ChunkRecord for PsaAnimInfo {
    const SIZE: usize = 168;
}

#[derive(Debug, Clone, Copy, BinRead)]
pub struct PsaRawKey {
    pub position: [f32; 3],
    /// Stored as x, y, z, w.
    pub rotation: [f32; 4],
    pub time: f32,
}

impl ChunkRecord for PsaRawKey {
    const SIZE: usize = 32;
}
