use anyhow::{ensure, Context, Result};
use clap::Parser;
use image::{ImageBuffer, Rgb};
use raymarcher::marcher::Camera;
use raymarcher::math::{add, mul, v, V3};
use raymarcher::{Frame, FrameInput, FrameSettings, Orchestrator, PixelResult, SceneDescription};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Hit shading loses this much brightness per step taken.
const OCCLUSION_PER_STEP: f64 = 0.01;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON scene file. The built-in scene is used when omitted.
    #[arg(short, long)]
    scene: Option<PathBuf>,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    #[arg(short, long, default_value_t = 0.5)]
    res_scale: f64,

    #[arg(short, long, default_value_t = 1)]
    frames: u32,

    /// Look input applied every frame, horizontal.
    #[arg(long, default_value_t = 0., allow_hyphen_values = true)]
    yaw: f64,

    /// Look input applied every frame, vertical.
    #[arg(long, default_value_t = 0., allow_hyphen_values = true)]
    pitch: f64,

    /// Movement input applied every frame, as x,y,z.
    #[arg(long, value_delimiter = ',', default_value = "0,0,0", allow_hyphen_values = true)]
    movement: Vec<f64>,

    /// Overrides the scene's blend sharpness.
    #[arg(short, long)]
    k: Option<f64>,

    #[arg(long, default_value_t = 1000)]
    max_steps: u32,

    #[arg(long, default_value_t = 0.01)]
    glow_intensity: f64,

    #[arg(short, long, default_value = "out.png")]
    out: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    ensure!(
        args.movement.len() == 3,
        "--movement takes exactly three values, got {}",
        args.movement.len()
    );

    let mut description = match &args.scene {
        Some(path) => SceneDescription::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SceneDescription::default(),
    };
    if let Some(k) = args.k {
        description.set_k(k);
    }

    let settings = FrameSettings {
        width: args.width,
        height: args.height,
        res_scale: args.res_scale,
        max_steps: args.max_steps,
    };
    let mut orchestrator = Orchestrator::new(Camera::default(), description, settings)?;
    let input = FrameInput {
        movement: v(args.movement[0], args.movement[1], args.movement[2]),
        look: (args.yaw, args.pitch),
    };

    for i in 0..args.frames {
        let start = Instant::now();
        let frame = orchestrator.frame(&input)?;
        let colors: Vec<V3> = orchestrator
            .description()
            .shapes
            .iter()
            .map(|s| s.color)
            .collect();
        let img = present(&frame, &colors, args.glow_intensity);
        let path = frame_path(&args.out, i, args.frames);
        img.save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(
            frame = frame.index,
            hits = frame.hits(),
            aborted = frame.aborted,
            seconds = start.elapsed().as_secs_f32(),
            path = %path.display(),
            "rendered"
        );
    }
    Ok(())
}

/// Colors a frame from hit flags and step counts alone: hits take their
/// shape's color darkened by step count, misses glow with the steps they took.
fn present(frame: &Frame, colors: &[V3], glow_intensity: f64) -> ImageBuffer<Rgb<u8>, Vec<u8>> {
    let background = v(0.1, 0.1, 0.2);
    let glow = v(1., 1., 1.);
    ImageBuffer::from_fn(frame.width, frame.height, |x, y| {
        let color = match frame.pixel(x, y) {
            Some(PixelResult {
                hit: true,
                steps,
                shape,
            }) => {
                let base = shape
                    .and_then(|i| colors.get(i).copied())
                    .unwrap_or(glow);
                mul(1. / (1. + f64::from(*steps) * OCCLUSION_PER_STEP), &base)
            }
            Some(PixelResult { steps, .. }) => add(
                &background,
                &mul(f64::from(*steps) * glow_intensity, &glow),
            ),
            None => background,
        };
        to_rgb(color)
    })
}

fn to_rgb(c: V3) -> Rgb<u8> {
    let channel = |x: f64| (x.clamp(0., 1.) * 255.) as u8;
    Rgb([channel(c.x), channel(c.y), channel(c.z)])
}

/// `out.png` for a single frame, `out_0003.png` and so on for several.
fn frame_path(out: &Path, index: u32, total: u32) -> PathBuf {
    if total <= 1 {
        return out.to_path_buf();
    }
    let stem = out
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "out".to_string());
    let extension = out
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    out.with_file_name(format!("{stem}_{index:04}.{extension}"))
}
