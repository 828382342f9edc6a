#![allow(clippy::new_without_default)]

use binrw::prelude::*;
use modular_bitfield::prelude::*;

use crate::{
    chunk::{ChunkRecord, ChunkTag},
    text::decode_name,
};

pub const PSK_MAGIC: ChunkTag = ChunkTag::new("ACTRHEAD");
pub const POINTS_TAG: ChunkTag = ChunkTag::new("PNTS0000");
pub const WEDGES_TAG: ChunkTag = ChunkTag::new("VTXW0000");
pub const FACES_TAG: ChunkTag = ChunkTag::new("FACE0000");
pub const MATERIALS_TAG: ChunkTag = ChunkTag::new("MATT0000");
pub const BONES_TAG: ChunkTag = ChunkTag::new("REFSKELT");
pub const WEIGHTS_TAG: ChunkTag = ChunkTag::new("RAWWEIGHTS");

#[derive(Debug, Clone, Copy, BinRead)]
pub struct PskPoint {
    pub position: [f32; 3],
}

impl ChunkRecord for PskPoint {
    const SIZE: usize = 12;
}

#[derive(Debug, Clone, Copy, BinRead)]
pub struct PskWedge {
    pub point_index: u32,
    pub u: f32,
    pub v: f32,
    #[br(pad_after = 3)]
    pub material_index: u8,
}

impl ChunkRecord for PskWedge {
    const SIZE: usize = 16;
}

#[derive(Debug, Clone, Copy, BinRead)]
pub struct PskFace {
    pub wedges: [i16; 3],
    pub material_index: i8,
    pub aux_material_index: i8,
    pub smoothing_group: i32,
}

impl ChunkRecord for PskFace {
    const SIZE: usize = 12;
}

#[bitfield]
#[derive(Debug, Clone, BinRead)]
#[br(map = Self::from_bytes)]
pub struct PskPolyFlags {
    pub invisible: bool,
    pub masked: bool,
    pub translucent: bool,
    pub not_solid: bool,
    pub environment: bool,
    pub semisolid: bool,
    pub modulated: bool,
    pub fake_backdrop: bool,
    pub two_sided: bool,
    pub auto_u_pan: bool,
    pub auto_v_pan: bool,
    pub no_smooth: bool,
    #[skip]
    __: B20,
}

impl PskPolyFlags {
    pub fn bits(&self) -> u32 {
        u32::from_le_bytes(self.clone().into_bytes())
    }
}

#[derive(Debug, Clone, BinRead)]
pub struct PskMaterial {
    #[br(map = |raw: [u8; 64]| decode_name(&raw))]
    pub name: String,
    pub texture_index: i32,
    pub poly_flags: PskPolyFlags,
    pub aux_material: i32,
    pub aux_flags: i32,
    pub lod_bias: i32,
    pub lod_style: i32,
}

impl ChunkRecord for PskMaterial {
    const SIZE: usize = 88;
}

/// Bone record, shared by the reference skeleton and the animation bone table.
#[derive(Debug, Clone, BinRead)]
pub struct PskBone {
    #[br(map = |raw: [u8; 64]| decode_name(&raw))]
    pub name: String,
    pub flags: i32,
    pub child_count: i32,
    pub parent_index: i32,
    /// Stored as x, y, z, w.
    pub rotation: [f32; 4],
    pub position: [f32; 3],
    pub length: f32,
    pub size: [f32; 3],
}

impl ChunkRecord for PskBone {
    const SIZE: usize = 120;
}

#[derive(Debug, Clone, Copy, BinRead)]
pub struct PskRawWeight {
    pub weight: f32,
    pub point_index: i32,
    pub bone_index: i32,
}

impl ChunkRecord for PskRawWeight {
    const SIZE: usize = 12;
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use binrw::BinRead;

    use super::{PskBone, PskFace, PskMaterial, PskWedge};

    #[test]
    fn test_wedge_layout() {
        let mut bytes = 7u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&0.25f32.to_le_bytes());
        bytes.extend_from_slice(&0.75f32.to_le_bytes());
        bytes.extend_from_slice(&[3, 0xAA, 0xBB, 0xCC]);
        let mut cursor = Cursor::new(bytes);
        let wedge = PskWedge::read_le(&mut cursor).unwrap();
        assert_eq!(wedge.point_index, 7);
        assert_eq!((wedge.u, wedge.v), (0.25, 0.75));
        assert_eq!(wedge.material_index, 3);
        assert_eq!(cursor.position(), 16);
    }

    #[test]
    fn test_face_layout() {
        let mut bytes = Vec::new();
        for index in [4i16, 5, -2] {
            bytes.extend_from_slice(&index.to_le_bytes());
        }
        bytes.extend_from_slice(&[1, 0xFF]);
        bytes.extend_from_slice(&9i32.to_le_bytes());
        let face = PskFace::read_le(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(face.wedges, [4, 5, -2]);
        assert_eq!((face.material_index, face.aux_material_index), (1, -1));
        assert_eq!(face.smoothing_group, 9);
    }

    #[test]
    fn test_material_poly_flags() {
        let mut bytes = [0u8; 64].to_vec();
        bytes[..5].copy_from_slice(b"Skin1");
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.extend_from_slice(&0x0000_0106u32.to_le_bytes());
        for value in [0i32, 0, 0, 0] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        let material = PskMaterial::read_le(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(material.name, "Skin1");
        assert_eq!(material.texture_index, 2);
        assert!(material.poly_flags.masked());
        assert!(material.poly_flags.translucent());
        assert!(material.poly_flags.two_sided());
        assert!(!material.poly_flags.invisible());
        assert_eq!(material.poly_flags.bits(), 0x106);
    }

    #[test]
    fn test_bone_layout() {
        let mut bytes = [0u8; 64].to_vec();
        bytes[..4].copy_from_slice(b"Bip1");
        for value in [0i32, 2, 0] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        for value in [0.0f32, 0.0, 0.0, 1.0, 1.0, 2.0, 3.0, 4.0, 1.0, 1.0, 1.0] {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        let mut cursor = Cursor::new(bytes);
        let bone = PskBone::read_le(&mut cursor).unwrap();
        assert_eq!(bone.name, "Bip1");
        assert_eq!(bone.child_count, 2);
        assert_eq!(bone.rotation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(bone.position, [1.0, 2.0, 3.0]);
        assert_eq!(bone.length, 4.0);
        assert_eq!(cursor.position(), 120);
    }
}
