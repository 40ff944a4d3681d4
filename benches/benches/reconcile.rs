// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use kurbo::{Rect, Shape};
use lamina_scene::{Canvas, CanvasChange, CanvasIndex, Color, Decoration, PathLayer, SceneDatabase};

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

    fn gen_range_usize(&mut self, upper_exclusive: usize) -> usize {
        if upper_exclusive == 0 {
            return 0;
        }
        (self.next_u32() as usize) % upper_exclusive
    }

    fn gen_f64(&mut self, upper: f64) -> f64 {
        f64::from(self.next_u32()) / f64::from(u32::MAX) * upper
    }
}

fn random_canvas(n: u32, seed: u64) -> Canvas<u32> {
    let mut rng = Lcg::new(seed);
    let mut canvas = Canvas::new(2_000.0, 2_000.0).with_background(Color::WHITE);
    for id in 0..n {
        let x = rng.gen_f64(1_900.0);
        let y = rng.gen_f64(1_900.0);
        let w = 4.0 + rng.gen_f64(96.0);
        let h = 4.0 + rng.gen_f64(96.0);
        let layer = PathLayer::new(id, Rect::new(x, y, x + w, y + h).to_path(0.1))
            .with_decoration(Decoration::fill(Color::from_rgb8(0x20, 0x60, 0xc0)));
        canvas = canvas.with_layer(layer);
    }
    canvas
}

fn loaded_scene(canvas: &Canvas<u32>) -> SceneDatabase<u32> {
    let scene = SceneDatabase::new();
    let _ = scene.update(canvas);
    scene
}

fn bench_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("lamina_reconcile");
    group.sample_size(30);

    for &n in &[256_u32, 4_096_u32] {
        let canvas = random_canvas(n, 0x1A31_0000_0000_0001);

        group.bench_function(format!("initial_update(n={n})"), |b| {
            b.iter_batched(
                SceneDatabase::<u32>::new,
                |scene| {
                    let set = scene.update(&canvas);
                    black_box(set.ok());
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("unchanged_update(n={n})"), |b| {
            let scene = loaded_scene(&canvas);
            b.iter(|| black_box(scene.update(&canvas).ok()));
        });

        group.bench_function(format!("shuffled_update(n={n})"), |b| {
            let mut rng = Lcg::new(0x1A31_0000_0000_0002);
            let mut shuffled = canvas.clone();
            for i in (1..shuffled.layers.len()).rev() {
                let j = rng.gen_range_usize(i + 1);
                shuffled.layers.swap(i, j);
            }
            b.iter_batched(
                || loaded_scene(&canvas),
                |scene| {
                    let set = scene.update(&shuffled);
                    black_box(set.ok());
                },
                BatchSize::LargeInput,
            );
        });

        group.bench_function(format!("perform_reorders(n={n})"), |b| {
            let mut rng = Lcg::new(0x1A31_0000_0000_0003);
            let changes: Vec<CanvasChange<u32>> = (0..64)
                .map(|_| CanvasChange::ReorderLayer {
                    id: rng.gen_range_usize(n as usize) as u32,
                    to: CanvasIndex::At(rng.gen_range_usize(n as usize)),
                })
                .collect();
            b.iter_batched(
                || (loaded_scene(&canvas), changes.clone()),
                |(scene, changes)| {
                    let set = scene.perform(changes);
                    black_box(set.ok());
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_reconcile);
criterion_main!(benches);
