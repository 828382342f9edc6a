use std::path::Path;

/// PSA animation set loader.
pub mod psa;

/// PSK skeletal mesh loader.
pub mod psk;

/// How imported clips are laid out for the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TrackLayout {
    /// Every clip becomes its own reusable track, the first one active.
    #[default]
    Separate,
    /// All clips are placed back to back on a single track.
    Timeline,
}

pub const MIN_BONE_LENGTH: f32 = 0.01;
pub const MAX_BONE_LENGTH: f32 = 10.0;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ImportParams {
    pub import_mesh: bool,
    pub import_bones: bool,
    /// One UV layer per material instead of a single shared layer.
    pub multi_uv_layers: bool,
    /// Distance between edit bone head and tail.
    pub bone_length: f32,
    pub filename_as_prefix: bool,
    pub track_layout: TrackLayout,
}

impl Default for ImportParams {
    fn default() -> Self {
        Self {
            import_mesh: true,
            import_bones: true,
            multi_uv_layers: false,
            bone_length: 0.5,
            filename_as_prefix: false,
            track_layout: TrackLayout::Separate,
        }
    }
}

impl ImportParams {
    pub(crate) fn clamped_bone_length(&self) -> f32 {
        self.bone_length.clamp(MIN_BONE_LENGTH, MAX_BONE_LENGTH)
    }
}

/// File name without directories and without a 2 to 5 character extension.
pub fn file_stem_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.rfind('.') {
        Some(dot) if dot > 0 && (2..=5).contains(&(name.len() - dot - 1)) => {
            name[..dot].to_string()
        }
        _ => name,
    }
}
