use std::{
    fs::File,
    io::{BufReader, Cursor, Read, Seek},
    path::Path,
};

use glam::{Vec2, Vec3};
use log::{debug, info, warn};

use crate::{
    chunk::{self, Chunk, ChunkTag},
    error::ImportError,
    mesh::{FaceAsset, MaterialAsset, MeshAsset, SkeletalMeshAsset, WedgeAsset},
    skeleton::{BoneAsset, SkeletonAsset},
    weight::{VertexWeight, WeightsAsset},
};

use format::{PskBone, PskFace, PskMaterial, PskPoint, PskRawWeight, PskWedge};

pub mod format;

fn index_error(kind: &'static str, record: usize, index: i64, len: usize) -> ImportError {
    ImportError::InvalidIndex {
        kind,
        record,
        index,
        len,
    }
}

struct PskLoader<'a, R> {
    reader: &'a mut R,
}

impl<'a, R: Read + Seek> PskLoader<'a, R> {
    fn new(reader: &'a mut R) -> Self {
        Self { reader }
    }

    fn next_chunk(&mut self, tag: ChunkTag) -> Result<Chunk, ImportError> {
        let chunk = chunk::read_chunk(self.reader)?;
        chunk.check_id(tag);
        Ok(chunk)
    }

    fn read_points(&mut self) -> Result<Vec<Vec3>, ImportError> {
        let points: Vec<PskPoint> = self.next_chunk(format::POINTS_TAG)?.records()?;
        Ok(points
            .into_iter()
            .map(|point| Vec3::from_array(point.position))
            .collect())
    }

    fn read_wedges(&mut self, point_count: usize) -> Result<Vec<WedgeAsset>, ImportError> {
        let wedges: Vec<PskWedge> = self.next_chunk(format::WEDGES_TAG)?.records()?;
        wedges
            .into_iter()
            .enumerate()
            .map(|(index, wedge)| {
                if wedge.point_index as usize >= point_count {
                    return Err(index_error(
                        "point",
                        index,
                        wedge.point_index as i64,
                        point_count,
                    ));
                }
                Ok(WedgeAsset {
                    point_index: wedge.point_index,
                    uv: Vec2::new(wedge.u, wedge.v),
                    material_index: wedge.material_index,
                })
            })
            .collect()
    }

    fn read_faces(&mut self, wedge_count: usize) -> Result<Vec<FaceAsset>, ImportError> {
        let faces: Vec<PskFace> = self.next_chunk(format::FACES_TAG)?.records()?;
        faces
            .into_iter()
            .enumerate()
            .map(|(index, face)| {
                let resolve = |wedge: i16| {
                    usize::try_from(wedge)
                        .ok()
                        .filter(|wedge| *wedge < wedge_count)
                        .ok_or_else(|| index_error("wedge", index, wedge as i64, wedge_count))
                };
                let [a, b, c] = face.wedges;
                Ok(FaceAsset {
                    wedges: [resolve(c)?, resolve(b)?, resolve(a)?],
                    material_index: face.material_index,
                    aux_material_index: face.aux_material_index,
                    smoothing_group: face.smoothing_group,
                })
            })
            .collect()
    }

    fn read_materials(&mut self) -> Result<Vec<MaterialAsset>, ImportError> {
        let materials: Vec<PskMaterial> = self.next_chunk(format::MATERIALS_TAG)?.records()?;
        Ok(materials
            .into_iter()
            .map(|material| MaterialAsset {
                poly_flags: material.poly_flags.bits(),
                two_sided: material.poly_flags.two_sided(),
                masked: material.poly_flags.masked(),
                translucent: material.poly_flags.translucent(),
                modulated: material.poly_flags.modulated(),
                name: material.name,
                texture_index: material.texture_index,
                aux_material: material.aux_material,
                aux_flags: material.aux_flags,
                lod_bias: material.lod_bias,
                lod_style: material.lod_style,
            })
            .collect())
    }

    fn read_skeleton(&mut self) -> Result<SkeletonAsset, ImportError> {
        let bones: Vec<PskBone> = self.next_chunk(format::BONES_TAG)?.records()?;
        let bones = bones
            .into_iter()
            .enumerate()
            .map(|(index, bone)| {
                let mut asset = BoneAsset::new(
                    bone.name,
                    index,
                    bone.parent_index,
                    bone.rotation,
                    bone.position,
                );
                asset.flags = bone.flags;
                asset.child_count = bone.child_count;
                asset.local_scale = Vec3::from_array(bone.size);
                asset.length = bone.length;
                asset
            })
            .collect();
        SkeletonAsset::new(bones)
    }

    fn read_weights(&mut self, point_count: usize) -> Result<WeightsAsset, ImportError> {
        if chunk::at_end(self.reader)? {
            warn!("File has no weight chunk, mesh is not skinned");
            return Ok(WeightsAsset::default());
        }
        let weights: Vec<PskRawWeight> = self.next_chunk(format::WEIGHTS_TAG)?.records()?;
        let weights = weights
            .into_iter()
            .enumerate()
            .map(|(index, weight)| {
                let point_index = u32::try_from(weight.point_index)
                    .ok()
                    .filter(|point| (*point as usize) < point_count)
                    .ok_or_else(|| {
                        index_error("point", index, weight.point_index as i64, point_count)
                    })?;
                Ok(VertexWeight {
                    point_index,
                    bone_index: weight.bone_index,
                    weight: weight.weight,
                })
            })
            .collect::<Result<Vec<_>, ImportError>>()?;
        Ok(WeightsAsset::new(weights))
    }

    fn skip_trailing(&mut self) -> Result<(), ImportError> {
        while !chunk::at_end(self.reader)? {
            match chunk::skip_chunk(self.reader) {
                Ok(header) => debug!("Ignored trailing chunk {}", header),
                Err(err) => {
                    warn!("Stopped reading trailing chunks: {}", err);
                    break;
                }
            }
        }
        Ok(())
    }

    fn load(mut self) -> Result<SkeletalMeshAsset, ImportError> {
        chunk::read_file_header(self.reader, format::PSK_MAGIC)?;

        let points = self.read_points()?;
        let wedges = self.read_wedges(points.len())?;
        let faces = self.read_faces(wedges.len())?;
        let materials = self.read_materials()?;
        let mesh = MeshAsset {
            points,
            wedges,
            faces,
            materials,
        };
        for (material, faces) in mesh.material_groups() {
            debug!("Material #{}: {} faces", material, faces.len());
        }

        let skeleton = self.read_skeleton()?;
        let weights = self.read_weights(mesh.points.len())?;
        self.skip_trailing()?;

        info!(
            "Loaded skeletal mesh: {} points, {} wedges, {} faces, {} materials, {} bones, {} weights",
            mesh.points.len(),
            mesh.wedges.len(),
            mesh.faces.len(),
            mesh.materials.len(),
            skeleton.len(),
            weights.len()
        );
        Ok(SkeletalMeshAsset {
            mesh,
            skeleton,
            weights,
        })
    }
}

pub fn load_psk<R: Read + Seek>(reader: &mut R) -> Result<SkeletalMeshAsset, ImportError> {
    PskLoader::new(reader).load()
}

pub fn load_psk_from_buffer(buffer: &[u8]) -> Result<SkeletalMeshAsset, ImportError> {
    load_psk(&mut Cursor::new(buffer))
}

pub fn load_psk_from_path<P: AsRef<Path>>(path: P) -> Result<SkeletalMeshAsset, ImportError> {
    let path = path.as_ref();
    info!("Importing skeletal mesh {}", path.display());
    let mut reader = BufReader::new(File::open(path)?);
    load_psk(&mut reader)
}
