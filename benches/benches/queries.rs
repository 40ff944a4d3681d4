// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use kurbo::{Point, Rect, Shape};
use lamina_imaging_ref::RecordingPainter;
use lamina_scene::{Canvas, Color, Decoration, LayerQuery, PathLayer, SceneDatabase};

#[derive(Clone)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u32(&mut self) -> u32 {
        // Numerical Recipes LCG parameters.
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 32) as u32
    }

    fn gen_f64(&mut self, upper: f64) -> f64 {
        f64::from(self.next_u32()) / f64::from(u32::MAX) * upper
    }
}

fn scene_with_rects(n: u32, seed: u64) -> SceneDatabase<u32> {
    let mut rng = Lcg::new(seed);
    let mut canvas = Canvas::new(2_000.0, 2_000.0);
    for id in 0..n {
        let x = rng.gen_f64(1_900.0);
        let y = rng.gen_f64(1_900.0);
        let layer = PathLayer::new(id, Rect::new(x, y, x + 50.0, y + 50.0).to_path(0.1))
            .with_decoration(Decoration::fill(Color::BLACK));
        canvas = canvas.with_layer(layer);
    }
    let scene = SceneDatabase::new();
    let _ = scene.update(&canvas);
    scene
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("lamina_queries");

    for &n in &[256_u32, 4_096_u32] {
        let scene = scene_with_rects(n, 0x0E41_0000_0000_0001);
        let mut rng = Lcg::new(0x0E41_0000_0000_0002);
        let points: Vec<Point> = (0..128)
            .map(|_| Point::new(rng.gen_f64(2_000.0), rng.gen_f64(2_000.0)))
            .collect();

        group.bench_function(format!("under_location(n={n})"), |b| {
            b.iter(|| {
                let mut hits = 0_usize;
                for &pt in &points {
                    hits += scene.layers(LayerQuery::UnderLocation(pt), |_| true).len();
                }
                black_box(hits);
            });
        });

        group.bench_function(format!("intersecting_bounds(n={n})"), |b| {
            let marquee = Rect::new(500.0, 500.0, 900.0, 900.0);
            b.iter(|| black_box(scene.layers(LayerQuery::IntersectingBounds(marquee), |_| true).len()));
        });

        group.bench_function(format!("draw_rect(n={n})"), |b| {
            let dirty = Rect::new(0.0, 0.0, 512.0, 512.0);
            let mut painter = RecordingPainter::new();
            b.iter(|| {
                painter.clear_events();
                scene.draw_rect(dirty, &mut painter);
                black_box(painter.events().len());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_queries);
criterion_main!(benches);
