#![allow(dead_code)]

/// Little-endian chunk stream builder for test fixtures.
#[derive(Default)]
pub struct ChunkWriter {
    bytes: Vec<u8>,
}

fn name_bytes<const N: usize>(name: &str) -> [u8; N] {
    let mut raw = [0u8; N];
    raw[..name.len()].copy_from_slice(name.as_bytes());
    raw
}

impl ChunkWriter {
    pub fn chunk(mut self, tag: &str, element_size: i32, records: &[Vec<u8>]) -> Self {
        self.bytes.extend_from_slice(&name_bytes::<20>(tag));
        self.bytes.extend_from_slice(&0x1e83b9i32.to_le_bytes());
        self.bytes.extend_from_slice(&element_size.to_le_bytes());
        self.bytes
            .extend_from_slice(&(records.len() as i32).to_le_bytes());
        for record in records {
            assert_eq!(record.len(), element_size as usize);
            self.bytes.extend_from_slice(record);
        }
        self
    }

    pub fn header_chunk(self, tag: &str) -> Self {
        self.chunk(tag, 0, &[])
    }

    /// Chunk whose header declares `count` records but carries `records`.
    pub fn raw_chunk(
        mut self,
        tag: &str,
        element_size: i32,
        count: i32,
        records: &[Vec<u8>],
    ) -> Self {
        self.bytes.extend_from_slice(&name_bytes::<20>(tag));
        self.bytes.extend_from_slice(&0i32.to_le_bytes());
        self.bytes.extend_from_slice(&element_size.to_le_bytes());
        self.bytes.extend_from_slice(&count.to_le_bytes());
        for record in records {
            self.bytes.extend_from_slice(record);
        }
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

#[derive(Default)]
pub struct Record(Vec<u8>);

impl Record {
    pub fn f32(mut self, value: f32) -> Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn f32s(self, values: &[f32]) -> Self {
        values.iter().fold(self, |record, value| record.f32(*value))
    }

    pub fn i32(mut self, value: i32) -> Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn u32(mut self, value: u32) -> Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn i16(mut self, value: i16) -> Self {
        self.0.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub fn bytes(mut self, values: &[u8]) -> Self {
        self.0.extend_from_slice(values);
        self
    }

    pub fn name(self, name: &str) -> Self {
        self.bytes(&name_bytes::<64>(name))
    }

    pub fn build(self) -> Vec<u8> {
        self.0
    }
}

pub fn point(position: [f32; 3]) -> Vec<u8> {
    Record::default().f32s(&position).build()
}

pub fn wedge(point_index: u32, u: f32, v: f32, material_index: u8) -> Vec<u8> {
    Record::default()
        .u32(point_index)
        .f32(u)
        .f32(v)
        .bytes(&[material_index, 0, 0, 0])
        .build()
}

pub fn face(wedges: [i16; 3], material_index: i8, smoothing_group: i32) -> Vec<u8> {
    Record::default()
        .i16(wedges[0])
        .i16(wedges[1])
        .i16(wedges[2])
        .bytes(&[material_index as u8, 0])
        .i32(smoothing_group)
        .build()
}

pub fn material(name: &str, texture_index: i32, poly_flags: u32) -> Vec<u8> {
    Record::default()
        .name(name)
        .i32(texture_index)
        .u32(poly_flags)
        .i32(0)
        .i32(0)
        .i32(0)
        .i32(0)
        .build()
}

pub fn bone(name: &str, parent_index: i32, rotation: [f32; 4], position: [f32; 3]) -> Vec<u8> {
    Record::default()
        .name(name)
        .i32(0)
        .i32(0)
        .i32(parent_index)
        .f32s(&rotation)
        .f32s(&position)
        .f32(1.0)
        .f32s(&[1.0, 1.0, 1.0])
        .build()
}

pub fn raw_weight(weight: f32, point_index: i32, bone_index: i32) -> Vec<u8> {
    Record::default()
        .f32(weight)
        .i32(point_index)
        .i32(bone_index)
        .build()
}

pub fn clip(name: &str, group: &str, bone_count: i32, frame_count: i32) -> Vec<u8> {
    Record::default()
        .name(name)
        .name(group)
        .i32(bone_count)
        .i32(0)
        .i32(0)
        .i32(bone_count.wrapping_mul(frame_count))
        .f32(1.0)
        .f32(frame_count as f32)
        .f32(30.0)
        .i32(0)
        .i32(0)
        .i32(frame_count)
        .build()
}

pub fn raw_key(position: [f32; 3], rotation: [f32; 4]) -> Vec<u8> {
    Record::default()
        .f32s(&position)
        .f32s(&rotation)
        .f32(1.0)
        .build()
}

pub const IDENTITY: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Three-bone chain `root -> spine -> head` with a single skinned quad.
pub fn sample_psk() -> Vec<u8> {
    ChunkWriter::default()
        .header_chunk("ACTRHEAD")
        .chunk(
            "PNTS0000",
            12,
            &[
                point([0.0, 0.0, 0.0]),
                point([1.0, 0.0, 0.0]),
                point([1.0, 1.0, 0.0]),
                point([0.0, 1.0, 0.0]),
            ],
        )
        .chunk(
            "VTXW0000",
            16,
            &[
                wedge(0, 0.0, 0.0, 0),
                wedge(1, 1.0, 0.0, 0),
                wedge(2, 1.0, 1.0, 0),
                wedge(3, 0.0, 1.0, 1),
            ],
        )
        .chunk("FACE0000", 12, &[face([0, 1, 2], 0, 1), face([0, 2, 3], 1, 2)])
        .chunk(
            "MATT0000",
            88,
            &[material("Skin", 0, 0), material("Cloth", 1, 0x100)],
        )
        .chunk(
            "REFSKELT",
            120,
            &[
                bone("root", 0, IDENTITY, [0.0, 0.0, 0.0]),
                bone("spine", 0, IDENTITY, [0.0, 0.0, 1.0]),
                bone("head", 1, IDENTITY, [0.0, 0.0, 1.0]),
            ],
        )
        .chunk(
            "RAWWEIGHTS",
            12,
            &[
                raw_weight(1.0, 3, 2),
                raw_weight(0.25, 0, 0),
                raw_weight(0.75, 0, 1),
                raw_weight(1.0, 2, 1),
            ],
        )
        .finish()
}

pub fn psa_bones(names: &[&str]) -> Vec<Vec<u8>> {
    names
        .iter()
        .map(|name| bone(name, 0, IDENTITY, [0.0; 3]))
        .collect()
}
