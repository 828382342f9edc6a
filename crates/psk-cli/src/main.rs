//! psk-cli - inspect Unreal PSK meshes and PSA animation sets
//!
//! Decodes the files the way a host importer would and prints what the host
//! would receive. Set `RUST_LOG=debug` for a per-chunk trace.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::warn;
use psk_asset::{
    animation::PoseReconstructor,
    loader::{file_stem_name, psa::load_psa_from_path, psk::load_psk_from_path},
    mesh::SkeletalMeshAsset,
    sink::{emit_skeletal_mesh, SceneCollector},
    ImportParams, TrackLayout,
};

#[derive(Parser)]
#[command(name = "psk-cli")]
#[command(about = "Unreal PSK/PSA import inspector")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a skeletal mesh and print a summary
    Mesh {
        /// Input .psk file
        input: PathBuf,

        #[command(flatten)]
        options: ImportOptions,
    },

    /// Import an animation set against a skeletal mesh
    Anim {
        /// Skeletal mesh (.psk) providing the target skeleton
        mesh: PathBuf,

        /// Animation set (.psa)
        animation: PathBuf,

        #[command(flatten)]
        options: ImportOptions,
    },
}

#[derive(Args)]
struct ImportOptions {
    /// JSON file with import parameters, flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Place all clips back to back on a single track
    #[arg(long)]
    timeline: bool,

    /// Prefix clip names with the animation file name
    #[arg(long)]
    prefix: bool,

    /// Distance between bone head and tail
    #[arg(long)]
    bone_length: Option<f32>,

    /// One UV layer per material
    #[arg(long)]
    multi_uv: bool,
}

impl ImportOptions {
    fn params(&self) -> Result<ImportParams> {
        let mut params = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Invalid config {}", path.display()))?
            }
            None => ImportParams::default(),
        };
        if self.timeline {
            params.track_layout = TrackLayout::Timeline;
        }
        if self.prefix {
            params.filename_as_prefix = true;
        }
        if let Some(bone_length) = self.bone_length {
            params.bone_length = bone_length;
        }
        if self.multi_uv {
            params.multi_uv_layers = true;
        }
        Ok(params)
    }
}

fn load_mesh(path: &Path) -> Result<SkeletalMeshAsset> {
    load_psk_from_path(path).with_context(|| format!("Failed to import {}", path.display()))
}

fn print_mesh(asset: &SkeletalMeshAsset, name: &str, params: &ImportParams) {
    let mut scene = SceneCollector::default();
    if !emit_skeletal_mesh(asset, name, params, &mut scene) {
        return;
    }
    if let Some(mesh) = &scene.mesh {
        println!(
            "Mesh {}: {} vertices, {} faces",
            mesh.name,
            mesh.points.len(),
            mesh.faces.len()
        );
    }
    for material in &scene.materials {
        println!(
            "  material {:?} texture {} flags {:#x}",
            material.name, material.texture_index, material.poly_flags
        );
    }
    for layer in &scene.uv_layers {
        println!("  uv layer {}", layer.name);
    }
    if let Some((name, bones)) = &scene.armature {
        println!("Armature {}: {} bones", name, bones.len());
        for bone in bones {
            println!(
                "  {:<24} parent {:<24} head {:?} roll {:.3}",
                bone.name,
                bone.parent.as_deref().unwrap_or("-"),
                bone.head.to_array(),
                bone.roll
            );
        }
    }
    let weighted = scene
        .vertex_groups
        .iter()
        .filter(|(_, weights)| !weights.is_empty())
        .count();
    if !scene.vertex_groups.is_empty() {
        println!(
            "{} vertex groups, {} with weights",
            scene.vertex_groups.len(),
            weighted
        );
    }
}

fn run_mesh(input: &Path, options: &ImportOptions) -> Result<()> {
    let params = options.params()?;
    let asset = load_mesh(input)?;
    print_mesh(&asset, &file_stem_name(input), &params);
    Ok(())
}

fn run_anim(mesh: &Path, animation: &Path, options: &ImportOptions) -> Result<()> {
    let params = options.params()?;
    let asset = load_mesh(mesh)?;

    let animation_set = match load_psa_from_path(animation, &asset.skeleton) {
        Ok(animation_set) => animation_set,
        Err(err) if err.is_recoverable() => {
            warn!("Skipped {}: {}", animation.display(), err);
            return Ok(());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to import {}", animation.display()))
        }
    };

    let mut scene = SceneCollector::default();
    let source_name = file_stem_name(animation);
    let summary = PoseReconstructor::new(&asset.skeleton, &animation_set).run(
        &params,
        &source_name,
        &mut scene,
    );
    for track in &scene.tracks {
        println!(
            "{:<32} track {:<24} start {:>5} frames {:>5} poses {:>7}{}",
            track.info.name,
            track.info.track,
            track.info.start_frame,
            track.info.frame_count,
            track.poses.len(),
            if track.info.active { " (active)" } else { "" }
        );
    }
    println!(
        "{} tracks, {} keys consumed, {} poses",
        summary.tracks, summary.consumed_keys, summary.emitted_poses
    );
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Mesh { input, options } => run_mesh(input, options),
        Commands::Anim {
            mesh,
            animation,
            options,
        } => run_anim(mesh, animation, options),
    }
}
