//! End-to-end builds checked through the decoder.

use super::*;
use crate::camera::ClipDepth;
use crate::light::ShadowParams;
use crate::math::{Mat4, Transform, Vec2, Vec3, Viewport};

fn camera(w: u32, h: u32, fov_y: f32) -> Camera {
    let eye = Transform::from_xyz(0.0, 0.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y);
    Camera::perspective(&eye, fov_y, 0.1, 100.0, Viewport::new(w, h))
}

fn index_with(config: LutConfig) -> TiledLightIndex {
    TiledLightIndex::new(config).unwrap()
}

fn raw_cell(buffer: &PackedBuffer, layout: &LutLayout, tile: usize) -> [f32; 2] {
    let slot = layout.cell_slot(tile);
    let t = buffer.texel(slot.col, slot.row).unwrap();
    [t[slot.channel], t[slot.channel + 1]]
}

/// Whether the segment from `a` to `b` passes within `radius` of `center`.
fn segment_hits_sphere(a: Vec3, b: Vec3, center: Vec3, radius: f32) -> bool {
    let ab = b - a;
    let t = ((center - a).dot(ab) / ab.length_squared()).clamp(0.0, 1.0);
    (a + ab * t).distance(center) <= radius
}

#[test]
fn directional_light_reaches_every_tile() {
    let mut index = index_with(LutConfig::default());
    let sun = Light::directional(Vec3::new(0.0, -1.0, -1.0))
        .color(1.0, 0.9, 0.8)
        .intensity(0.7);
    let lut = index.build(&[sun], &camera(128, 128, 60.0)).unwrap();
    let reader = lut.reader();

    assert_eq!(lut.param, LutParam::new(4, 4));
    for tile in 0..16 {
        assert_eq!(reader.cell(tile).unwrap().count, 1, "tile {tile}");
        assert_eq!(reader.tile_lights(tile).collect::<Vec<_>>(), vec![0]);
    }
    let entry = reader.light(0).unwrap();
    assert_eq!(entry.kind, LightKind::Directional);
    assert_eq!(entry.color, [1.0, 0.9, 0.8]);
    assert_eq!(entry.intensity, 0.7);
    assert_eq!(entry.range, 0.0);
    assert!((entry.direction_camera.length() - 1.0).abs() < 1e-5);
    assert_eq!(lut.stats.tile_light_pairs, 16);
}

#[test]
fn point_light_covers_only_the_center() {
    let mut index = index_with(LutConfig::default());
    let cam = camera(320, 240, 90.0);
    let lamp = Light::point(Vec3::ZERO, 5.0);
    let lut = index.build(&[lamp], &cam).unwrap();
    let reader = lut.reader();
    let grid = lut.grid;
    assert_eq!((grid.width, grid.height), (10, 8));

    for (tx, ty) in [(4, 3), (5, 3), (4, 4), (5, 4)] {
        let cell = reader.cell(grid.tile_index(tx, ty)).unwrap();
        assert_eq!(cell.count, 1, "center tile ({tx},{ty})");
    }
    for (tx, ty) in [(0, 0), (9, 0), (0, 7), (9, 7)] {
        let cell = reader.cell(grid.tile_index(tx, ty)).unwrap();
        assert_eq!(cell.count, 0, "corner tile ({tx},{ty})");
    }
    let entry = reader.light(0).unwrap();
    assert!((entry.position_camera - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-4);
    assert_eq!(entry.position_world, Vec3::ZERO);
}

#[test]
fn tile_lists_are_conservative_against_pixel_rays() {
    let mut index = index_with(LutConfig::default());
    let cam = camera(320, 240, 90.0);
    let lights = [
        Light::point(Vec3::ZERO, 5.0),
        Light::point(Vec3::new(-9.0, 4.0, -3.0), 2.5),
        Light::spot(Vec3::new(6.0, -5.0, 2.0), Vec3::NEG_Y, 3.0, 0.8),
        Light::point(Vec3::new(0.0, 0.0, 9.5), 1.0),
    ];
    let lut = index.build(&lights, &cam).unwrap();
    let reader = lut.reader();
    let grid = lut.grid;
    let inverse = cam.projection.inverse();

    for py in 0..240 {
        for px in 0..320 {
            let (x, y) = (px as f32 + 0.5, py as f32 + 0.5);
            let ndc = grid.to_ndc(Vec2::new(x, y));
            let near = inverse.project_point3(ndc.extend(0.0));
            let far = inverse.project_point3(ndc.extend(1.0));
            let listed: Vec<u32> = reader
                .cell_at(x, y)
                .map(|cell| cell.positions().filter_map(|p| reader.light_index(p)).collect())
                .unwrap_or_default();
            for (i, light) in lights.iter().enumerate() {
                let center = cam.view.transform_point3(light.position);
                if segment_hits_sphere(near, far, center, light.range) {
                    assert!(listed.contains(&(i as u32)), "light {i} missing at ({px},{py})");
                }
            }
        }
    }
}

#[test]
fn no_lights_gives_empty_cells() {
    let mut index = index_with(LutConfig::default());
    let lut = index.build(&[], &camera(320, 240, 60.0)).unwrap();
    let reader = lut.reader();
    for tile in 0..lut.stats.tiles {
        assert_eq!(reader.cell(tile), Some(TileCell::default()));
    }
    assert_eq!(reader.light(0), None);
    assert_eq!(lut.stats.tile_light_pairs, 0);
    assert!(lut.buffer.texels().iter().all(|t| *t == [0.0; 4]));
}

#[test]
fn identical_inputs_give_identical_bytes() {
    let mut index = index_with(LutConfig::default());
    let cam = camera(640, 360, 70.0);
    let lights = [
        Light::point(Vec3::new(1.5, 0.7, 0.0), 1.8).intensity(2.0),
        Light::point(Vec3::new(0.8, -0.5, 1.2), 1.0).color(0.0, 1.0, 0.0),
        Light::directional(Vec3::NEG_Y),
    ];
    let first = index.build(&lights, &cam).unwrap().buffer.as_bytes().to_vec();
    let second = index.build(&lights, &cam).unwrap().buffer.as_bytes().to_vec();
    assert_eq!(first, second);
}

#[test]
fn lights_past_capacity_are_dropped_in_order() {
    let config = LutConfig {
        max_lights: 8,
        ..Default::default()
    };
    let mut index = index_with(config);
    let lights: Vec<Light> = (0..9)
        .map(|i| Light::directional(Vec3::NEG_Z).intensity(i as f32))
        .collect();
    let lut = index.build(&lights, &camera(64, 64, 60.0)).unwrap();
    let reader = lut.reader();
    assert_eq!(lut.stats.lights_stored, 8);
    assert_eq!(lut.stats.lights_dropped, 1);
    assert_eq!(reader.light(7).unwrap().intensity, 7.0);
    assert_eq!(reader.cell(0).unwrap().count, 8);
    assert_eq!(
        reader.tile_lights(3).collect::<Vec<_>>(),
        (0..8).collect::<Vec<_>>()
    );

    assert_eq!(index.source_index(7), Some(7));
    assert_eq!(index.source_index(8), None);
    assert_eq!(index.counters().lights_dropped, 1);

    let lut = index.build(&lights[..8], &camera(64, 64, 60.0)).unwrap();
    assert_eq!(lut.stats.lights_dropped, 0);
    assert_eq!(lut.stats.lights_stored, 8);
}

#[test]
fn shrinking_viewport_clears_stale_cells() {
    let mut index = index_with(LutConfig::default());
    let lights = [Light::directional(Vec3::NEG_Z)];
    let layout = *index.layout();

    let big = index.build(&lights, &camera(1280, 720, 60.0)).unwrap();
    assert_eq!(big.stats.tiles, 920);
    assert_eq!(raw_cell(big.buffer, &layout, 919), [919.0, 1.0]);

    for _ in 0..2 {
        let small = index.build(&lights, &camera(640, 360, 60.0)).unwrap();
        assert_eq!(small.param, LutParam::new(20, 12));
        assert_eq!(small.stats.tiles, 240);
        assert_eq!(raw_cell(small.buffer, &layout, 239), [239.0, 1.0]);
        for tile in 240..920 {
            assert_eq!(raw_cell(small.buffer, &layout, tile), [0.0, 0.0], "stale tile {tile}");
        }
        assert_eq!(small.reader().cell(240), None);
    }
    assert_eq!(index.tile_counts().len(), 240);
}

#[test]
fn runs_are_contiguous_and_match_intersections() {
    let mut index = index_with(LutConfig::default());
    let cam = camera(320, 240, 75.0);
    let lights = [
        Light::point(Vec3::new(-3.0, 2.0, 0.0), 2.0),
        Light::point(Vec3::new(3.0, -1.0, 1.0), 4.0),
        Light::spot(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 6.0, 0.5),
        Light::point(Vec3::new(0.0, 40.0, 0.0), 1.0),
    ];
    let grid = TileGrid::new(cam.viewport, TileOrigin::TopLeft).unwrap();
    let mut cache = frustum::FrustumCache::new();
    let frusta = cache.update(&cam, &grid).unwrap().to_vec();

    let lut = index.build(&lights, &cam).unwrap();
    let reader = lut.reader();

    let mut expected_offset = 0;
    let mut appearances = [0usize; 4];
    for tile in 0..grid.tile_count() {
        let cell = reader.cell(tile).unwrap();
        assert_eq!(cell.offset, expected_offset, "tile {tile}");
        expected_offset += cell.count;

        let listed: Vec<u32> = reader.tile_lights(tile).collect();
        assert!(listed.windows(2).all(|w| w[0] < w[1]), "entry order in tile {tile}");
        for i in listed {
            appearances[i as usize] += 1;
        }
    }
    assert_eq!(expected_offset as usize, lut.stats.tile_light_pairs);

    for (i, light) in lights.iter().enumerate() {
        let center = cam.view.transform_point3(light.position);
        let hits = frusta
            .iter()
            .filter(|f| f.intersects_sphere(center, light.range))
            .count();
        assert_eq!(appearances[i], hits, "light {i}");
    }
    assert_eq!(appearances[3], 0, "light far above the view");
}

#[test]
fn invalid_lights_do_not_use_capacity() {
    let config = LutConfig {
        max_lights: 2,
        ..Default::default()
    };
    let mut index = index_with(config);
    let lights = [
        Light::point(Vec3::ZERO, 0.0),
        Light::directional(Vec3::NEG_Y),
        Light::point(Vec3::splat(f32::NAN), 1.0),
        Light::point(Vec3::ZERO, 3.0),
    ];
    let lut = index.build(&lights, &camera(64, 64, 60.0)).unwrap();
    assert_eq!(lut.stats.lights_rejected, 2);
    assert_eq!(lut.stats.lights_stored, 2);
    assert_eq!(lut.stats.lights_dropped, 0);
    assert_eq!(lut.reader().light(0).unwrap().kind, LightKind::Directional);
    assert_eq!(lut.reader().light(1).unwrap().kind, LightKind::Point);
    assert_eq!(index.source_index(0), Some(1));
    assert_eq!(index.source_index(1), Some(3));
}

#[test]
fn bottom_left_origin_mirrors_rows() {
    let lights = [Light::point(Vec3::new(0.0, 6.0, 0.0), 1.0)];
    let cam = camera(320, 256, 90.0);

    let mut top = index_with(LutConfig::default());
    top.build(&lights, &cam).unwrap();
    let mut bottom = index_with(LutConfig {
        origin: TileOrigin::BottomLeft,
        ..Default::default()
    });
    bottom.build(&lights, &cam).unwrap();

    let (w, h) = (10, 8);
    let top_counts = top.tile_counts();
    let bottom_counts = bottom.tile_counts();
    for ty in 0..h {
        for tx in 0..w {
            assert_eq!(
                top_counts[ty * w + tx],
                bottom_counts[(h - 1 - ty) * w + tx],
                "tile ({tx},{ty})"
            );
        }
    }
    let lit_rows: Vec<usize> = (0..h)
        .filter(|ty| (0..w).any(|tx| top_counts[ty * w + tx] > 0))
        .collect();
    assert!(!lit_rows.is_empty());
    assert!(lit_rows.iter().all(|&ty| ty < h / 2), "light above center is in the top rows");
}

#[test]
fn camera_errors_leave_counters_untouched() {
    let mut index = index_with(LutConfig {
        grid_rows: 1,
        ..Default::default()
    });
    let lights = [Light::directional(Vec3::NEG_Z)];

    let err = index.build(&lights, &camera(1280, 1280, 60.0)).unwrap_err();
    assert_eq!(
        err,
        LutError::GridOverflow {
            tiles: 1600,
            capacity: 1280
        }
    );

    let err = index.build(&lights, &camera(0, 100, 60.0)).unwrap_err();
    assert_eq!(err, LutError::InvalidViewport { width: 0, height: 100 });

    let infinite = Camera::new(
        Mat4::IDENTITY,
        Mat4::perspective_infinite_rh(1.0, 1.0, 0.1),
        Viewport::new(64, 64),
    );
    let err = index.build(&lights, &infinite).unwrap_err();
    assert_eq!(err, LutError::DegenerateProjection);

    assert_eq!(index.counters().builds, 0);
    assert!(index.build(&lights, &camera(64, 64, 60.0)).is_ok());
    assert_eq!(index.counters().builds, 1);
}

#[test]
fn distant_far_planes_still_build() {
    let mut index = index_with(LutConfig::default());
    let lights = [Light::point(Vec3::ZERO, 1.0)];
    let eye = Transform::from_xyz(0.0, 0.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y);

    for far in [1_000.0, 80_000.0, 200_000.0, 1_000_000.0] {
        let cam = Camera::perspective(&eye, 90.0, 0.1, far, Viewport::new(1280, 720));
        let lut = index
            .build(&lights, &cam)
            .unwrap_or_else(|e| panic!("far = {far}: {e}"));
        assert_eq!(lut.reader().lights_at(640.5, 360.5).count(), 1, "far = {far}");
    }
    assert_eq!(index.counters().builds, 4);
}

#[test]
fn per_tile_cap_keeps_first_lights() {
    let mut index = index_with(LutConfig {
        max_lights_per_tile: 2,
        ..Default::default()
    });
    let lights = [
        Light::directional(Vec3::NEG_Z),
        Light::directional(Vec3::NEG_Y),
        Light::directional(Vec3::X),
    ];
    let lut = index.build(&lights, &camera(64, 64, 60.0)).unwrap();
    assert_eq!(lut.stats.tile_overflow, 4);
    assert_eq!(lut.stats.max_tile_lights, 2);
    for tile in 0..4 {
        assert_eq!(lut.reader().tile_lights(tile).collect::<Vec<_>>(), vec![0, 1]);
    }
    assert_eq!(index.counters().overflowed_builds, 1);
}

#[test]
fn index_capacity_truncates_later_tiles() {
    let mut index = index_with(LutConfig {
        index_rows: 1,
        ..Default::default()
    });
    let lights = [
        Light::directional(Vec3::NEG_Z),
        Light::directional(Vec3::NEG_Y),
        Light::directional(Vec3::X),
    ];
    let lut = index.build(&lights, &camera(1280, 720, 60.0)).unwrap();
    let reader = lut.reader();
    assert_eq!(lut.stats.tile_light_pairs, 2560);
    assert_eq!(lut.stats.index_overflow, 920 * 3 - 2560);
    assert_eq!(reader.cell(852), Some(TileCell { offset: 2556, count: 3 }));
    assert_eq!(reader.cell(853), Some(TileCell { offset: 2559, count: 1 }));
    assert_eq!(reader.cell(854), Some(TileCell { offset: 2560, count: 0 }));
    for tile in 0..920 {
        let cell = reader.cell(tile).unwrap();
        assert!(cell.positions().end <= 2560);
    }
}

#[test]
fn gl_depth_camera_finds_the_center_light() {
    let eye = Transform::from_xyz(0.0, 0.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y);
    let cam = Camera::new(
        eye.view_matrix(),
        Mat4::perspective_rh_gl(60f32.to_radians(), 1.0, 0.1, 100.0),
        Viewport::new(128, 128),
    )
    .with_clip_depth(ClipDepth::NegOneToOne);
    let mut index = index_with(LutConfig {
        origin: TileOrigin::BottomLeft,
        ..Default::default()
    });
    let lut = index.build(&[Light::point(Vec3::ZERO, 1.0)], &cam).unwrap();
    assert_eq!(lut.reader().lights_at(64.0, 64.0).count(), 1);
    assert_eq!(lut.reader().lights_at(1.0, 1.0).count(), 0);
}

#[test]
fn spot_and_shadow_values_survive_the_table() {
    let mut index = index_with(LutConfig::default());
    let spot = Light::spot(Vec3::new(0.0, 2.0, 0.0), Vec3::NEG_Y, 8.0, 0.75)
        .color(0.5, 0.25, 1.0)
        .intensity(4.0)
        .shadow(ShadowParams {
            strength: 0.6,
            bias: 0.005,
        });
    let lut = index.build(&[spot], &camera(128, 128, 60.0)).unwrap();
    let entry = lut.reader().lights_at(64.0, 64.0).next().unwrap();
    assert_eq!(entry.kind, LightKind::Spot);
    assert_eq!(entry.color, [0.5, 0.25, 1.0]);
    assert_eq!(entry.intensity, 4.0);
    assert_eq!(entry.range, 8.0);
    assert_eq!(entry.spot_cutoff, 0.75);
    assert!((entry.direction_camera - Vec3::NEG_Y).length() < 1e-5);
    assert_eq!(
        entry.shadow,
        Some(ShadowParams {
            strength: 0.6,
            bias: 0.005
        })
    );
}

#[test]
fn uniform_matches_layout() {
    let mut index = index_with(LutConfig::default());
    let lut = index.build(&[], &camera(1920, 1080, 60.0)).unwrap();
    assert_eq!(
        lut.uniform(),
        LutUniform {
            grid_size: [60, 34],
            index_base_row: 2,
            grid_base_row: 224,
        }
    );
}

#[test]
fn index_can_move_to_another_thread() {
    fn assert_send<T: Send>() {}
    assert_send::<TiledLightIndex>();
}
