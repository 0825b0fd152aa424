//! Marches a single pixel of the default camera and dumps what happened.
use anyhow::{Context, Result};
use clap::Parser;
use raymarcher::marcher::{march, Camera, Scene, DEFAULT_MAX_STEPS};
use raymarcher::SceneDescription;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    scene: Option<PathBuf>,

    #[arg(long, default_value_t = 400)]
    width: u32,

    #[arg(long, default_value_t = 300)]
    height: u32,

    #[arg(short)]
    x: u32,

    #[arg(short)]
    y: u32,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();
    let description = match &args.scene {
        Some(path) => SceneDescription::from_json_file(path)?,
        None => SceneDescription::default(),
    };
    let scene = Scene::try_from(&description)?;
    let camera = Camera::default();

    let mut ray = camera
        .generate_rays(args.width, args.height)
        .into_iter()
        .nth(args.y as usize * args.width as usize + args.x as usize)
        .filter(|_| args.x < args.width)
        .context("pixel outside the viewport")?;
    dbg!(&ray);
    let termination = march(&mut ray, &scene, &camera.march_limits(DEFAULT_MAX_STEPS));
    dbg!(termination, &ray);
    if termination.is_hit() {
        let index = scene.nearest_shape(&ray.origin);
        dbg!(index, &scene.shapes()[index]);
    }
    Ok(())
}
