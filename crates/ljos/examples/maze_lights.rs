//! Maze lights demo.
//!
//! Lamps line the corridors of a small maze while the camera orbits it. Each
//! frame builds the light index and, with the `diagnostics` feature, streams
//! stats to `ljos-telemetry`. Halfway through, the window "resizes" from
//! 1280×720 to 640×360.
//!
//! Prints an ASCII heatmap of per-tile light counts for the first frame at
//! each size. Set `RUST_LOG=debug` to see every build.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use ljos::prelude::*;

const FRAMES: u32 = 300;
const MAZE: [&str; 8] = [
    "########",
    "#..#...#",
    "#.##.#.#",
    "#....#.#",
    "##.###.#",
    "#..#...#",
    "#.#..#.#",
    "########",
];

fn main() -> Result<(), LutError> {
    #[cfg(feature = "diagnostics")]
    ljos::diag::init_logger();
    #[cfg(not(feature = "diagnostics"))]
    env_logger::init();

    let config_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("examples")
        .join("assets")
        .join("lut_config.json");
    let config = LutConfig::from_file(&config_path)?;
    let mut index = TiledLightIndex::new(config)?;
    let lights = scene_lights();
    log::info!("Scene has {} lights", lights.len());

    #[cfg(feature = "diagnostics")]
    let mut sender = ljos::diag::DiagSender::new();

    let start = Instant::now();
    for frame in 0..FRAMES {
        let viewport = if frame < FRAMES / 2 {
            Viewport::new(1280, 720)
        } else {
            Viewport::new(640, 360)
        };

        let angle = frame as f32 * 0.02;
        let eye = Transform::from_xyz(5.15 * angle.cos(), 1.2, 5.15 * angle.sin())
            .looking_at(Vec3::new(0.0, 0.7, 0.0), Vec3::Y);
        let camera = Camera::perspective(&eye, 65.0, 0.1, 100.0, viewport);

        let lut = index.build(&lights, &camera)?;
        if frame == 0 || frame == FRAMES / 2 {
            println!(
                "{}x{}: {} lights, {} tile/light pairs, busiest tile {} ({}us)",
                viewport.width,
                viewport.height,
                lut.stats.lights_stored,
                lut.stats.tile_light_pairs,
                lut.stats.max_tile_lights,
                lut.stats.build_us,
            );
            print_heatmap(&lut);
        }

        #[cfg(feature = "diagnostics")]
        if let Some(sender) = sender.as_mut() {
            sender.send(&index, start.elapsed().as_secs_f32());
        }

        std::thread::sleep(Duration::from_millis(16));
    }

    let counters = index.counters();
    println!(
        "{} builds in {:.1}s, {} overflowing",
        counters.builds,
        start.elapsed().as_secs_f32(),
        counters.overflowed_builds,
    );
    Ok(())
}

/// A dim fill light, the two lamps beside the maze, and one lamp per open
/// corridor cell.
fn scene_lights() -> Vec<Light> {
    let mut lights = vec![
        Light::directional(Vec3::new(-0.3, -1.0, -0.4)).intensity(0.1),
        Light::point(Vec3::new(1.5, 0.7, 0.0), 1.8).intensity(2.0),
        Light::point(Vec3::new(0.8, -0.5, 1.2), 1.0).color(0.0, 1.0, 0.0),
    ];

    for (z, row) in MAZE.iter().enumerate() {
        for (x, cell) in row.chars().enumerate() {
            if cell != '.' || (x + z) % 2 != 0 {
                continue;
            }
            let position = Vec3::new(x as f32 - 3.5, 0.4, z as f32 - 3.5);
            let warm = 0.6 + 0.4 * ((x * 7 + z * 3) % 5) as f32 / 4.0;
            lights.push(
                Light::point(position, 1.2)
                    .color(1.0, warm, warm * 0.6)
                    .intensity(1.5),
            );
        }
    }

    // A spot looking down the long corridor.
    lights.push(
        Light::spot(
            Vec3::new(2.5, 0.8, -2.5),
            Vec3::new(0.0, -0.2, 1.0),
            4.0,
            30f32.to_radians().cos(),
        )
        .shadow(ShadowParams::default()),
    );
    lights
}

fn print_heatmap(lut: &LightLut<'_>) {
    let reader = lut.reader();
    let (w, h) = reader.grid_size();
    for ty in 0..h {
        let row: String = (0..w)
            .map(|tx| {
                let count = reader
                    .cell((ty * w + tx) as usize)
                    .map_or(0, |cell| cell.count);
                match count {
                    0 => ' ',
                    1 => '.',
                    2..=3 => ':',
                    4..=7 => '*',
                    _ => '#',
                }
            })
            .collect();
        println!("|{row}|");
    }
}
