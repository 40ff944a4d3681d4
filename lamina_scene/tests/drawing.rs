// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the paint programs `SceneDatabase::draw_rect` emits.

use kurbo::{Affine, BezPath, Point, Rect};
use lamina_imaging::{DrawOp, Paint, StateOp};
use lamina_imaging_ref::{Event, RecordingPainter};
use lamina_scene::{
    Canvas, Color, Decoration, ImageLayer, LayerQuery, PathLayer, SceneDatabase, SceneOptions, Services,
    StrokeDecoration, TextLayer, TextRun,
};

mod common;

use common::{BoxEngine, PixelDecoder, filled_rect, red, scene};

fn draw(scene: &SceneDatabase<u32>, rect: Rect) -> RecordingPainter {
    let mut painter = RecordingPainter::new();
    scene.draw_rect(rect, &mut painter);
    assert!(painter.is_balanced(), "unbalanced layers: {:?}", painter.events());
    painter
}

fn fill_paths(painter: &RecordingPainter) -> Vec<(Rect, Affine)> {
    painter
        .draws()
        .filter_map(|(op, state)| match op {
            DrawOp::FillPath { path, .. } => Some((kurbo::Shape::bounding_box(path), state.transform)),
            _ => None,
        })
        .collect()
}

#[test]
fn background_then_layers_in_order() {
    let scene = scene();
    let canvas = Canvas::new(100.0, 100.0)
        .with_background(Color::WHITE)
        .with_layer(filled_rect(1, Rect::new(0.0, 0.0, 10.0, 10.0)))
        .with_layer(filled_rect(2, Rect::new(5.0, 5.0, 15.0, 15.0)))
        .with_layer(filled_rect(3, Rect::new(50.0, 50.0, 60.0, 60.0)));
    scene.update(&canvas).unwrap();

    let dirty = Rect::new(0.0, 0.0, 20.0, 20.0);
    let painter = draw(&scene, dirty);
    let draws: Vec<&DrawOp> = painter.draws().map(|(op, _)| op).collect();
    assert_eq!(draws[0], &DrawOp::Clear(dirty));
    assert_eq!(
        draws[1],
        &DrawOp::FillRect {
            rect: dirty,
            paint: Paint::Solid(Color::WHITE),
        }
    );
    // Layer 3 lies outside the dirty rect.
    assert_eq!(
        fill_paths(&painter),
        vec![
            (Rect::new(0.0, 0.0, 10.0, 10.0), Affine::IDENTITY),
            (Rect::new(5.0, 5.0, 15.0, 15.0), Affine::IDENTITY),
        ]
    );

    // Each layer draws inside a layer clipped to the dirty rect.
    let (_, state) = painter
        .draws()
        .find(|(op, _)| matches!(op, DrawOp::FillPath { .. }))
        .unwrap();
    assert_eq!(state.layer_stack_depth, 1);
    let top = state.layer_top.as_ref().unwrap();
    assert_eq!(top.clip, Some(dirty));
    assert_eq!(top.opacity, Some(1.0));
}

#[test]
fn transparent_canvases_get_a_checkerboard() {
    let scene = scene();
    scene.update(&Canvas::new(50.0, 50.0)).unwrap();

    let painter = draw(&scene, Rect::new(0.0, 0.0, 100.0, 100.0));
    let backdrop = painter.draws().find_map(|(op, _)| match op {
        DrawOp::FillRect { rect, paint } => Some((*rect, paint.clone())),
        _ => None,
    });
    let Some((rect, Paint::Pattern { image, .. })) = backdrop else {
        panic!("expected a checkerboard, got {:?}", painter.events());
    };
    assert_eq!(rect, Rect::new(0.0, 0.0, 50.0, 50.0));
    assert_eq!((image.width, image.height), (2, 2));

    let plain = SceneDatabase::<u32>::with_services(
        Services::default(),
        SceneOptions::default().with_checkerboard(None),
    );
    plain.update(&Canvas::new(50.0, 50.0)).unwrap();
    let painter = draw(&plain, Rect::new(0.0, 0.0, 100.0, 100.0));
    assert_eq!(painter.draws().count(), 1, "only the clear is expected");
}

#[test]
fn zoom_and_content_transform_reach_the_painter() {
    let scene = scene();
    let canvas = Canvas::new(100.0, 100.0)
        .with_content_transform(Affine::translate((10.0, 0.0)))
        .with_layer(filled_rect(1, Rect::new(0.0, 0.0, 10.0, 10.0)));
    scene.update(&canvas).unwrap();
    scene.set_zoom(2.0);

    let painter = draw(&scene, Rect::new(0.0, 0.0, 200.0, 200.0));
    assert_eq!(
        fill_paths(&painter),
        vec![(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Affine::scale(2.0) * Affine::translate((10.0, 0.0))
        )]
    );
    // Drawing does not leave a transform behind.
    assert_eq!(painter.current_state().transform, Affine::IDENTITY);
}

#[test]
fn hidden_layers_draw_nothing_but_remember_their_bounds() {
    let scene = scene();
    let mut hidden = filled_rect(1, Rect::new(0.0, 0.0, 10.0, 10.0));
    hidden.visible = false;
    scene
        .update(&Canvas::new(100.0, 100.0).with_layer(hidden.clone()))
        .unwrap();

    let painter = draw(&scene, Rect::new(0.0, 0.0, 100.0, 100.0));
    assert!(fill_paths(&painter).is_empty());

    // Hidden layers still hit test.
    assert_eq!(
        scene
            .layers(LayerQuery::UnderLocation(Point::new(5.0, 5.0)), |_| true)
            .len(),
        1
    );

    // Changes while hidden throughout repaint nothing.
    let mut moved = hidden.clone();
    moved.transform = Affine::translate((20.0, 0.0));
    let set = scene
        .update(&Canvas::new(100.0, 100.0).with_layer(moved.clone()))
        .unwrap();
    assert!(set.is_empty());

    let mut shown = moved;
    shown.visible = true;
    let set = scene
        .update(&Canvas::new(100.0, 100.0).with_layer(shown))
        .unwrap();
    assert_eq!(set.dirty_rect(), Some(Rect::new(0.0, 0.0, 30.0, 10.0)));
}

#[test]
fn layer_opacity_and_blend_scope_the_draw() {
    let scene = scene();
    let mut layer = filled_rect(1, Rect::new(0.0, 0.0, 10.0, 10.0));
    layer.opacity = 0.25;
    layer.blend = peniko::Mix::Multiply.into();
    scene
        .update(&Canvas::new(100.0, 100.0).with_layer(layer))
        .unwrap();

    let painter = draw(&scene, Rect::new(0.0, 0.0, 100.0, 100.0));
    let pushed: Vec<_> = painter
        .events()
        .iter()
        .filter_map(|event| match event {
            Event::State {
                op: StateOp::PushLayer(op),
                ..
            } => Some(op.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].opacity, Some(0.25));
    assert_eq!(pushed[0].blend, Some(peniko::Mix::Multiply.into()));
}

#[test]
fn non_scaling_strokes_keep_their_screen_width() {
    let scene = scene();
    let mut line = BezPath::new();
    line.move_to((0.0, 0.0));
    line.line_to((100.0, 0.0));
    let layer = PathLayer::new(1, line).with_decoration(Decoration::Stroke(
        StrokeDecoration::new(2.0, red()).with_scales_with_zoom(false),
    ));
    scene
        .update(&Canvas::new(100.0, 100.0).with_layer(layer))
        .unwrap();
    scene.set_zoom(4.0);

    let painter = draw(&scene, Rect::new(0.0, 0.0, 400.0, 400.0));
    let width = painter.draws().find_map(|(op, _)| match op {
        DrawOp::StrokePath { style, .. } => Some(style.width),
        _ => None,
    });
    assert_eq!(width, Some(0.5));

    // One view pixel either side of the line is a quarter document unit.
    let hit = |y: f64| !scene.layers(LayerQuery::UnderLocation(Point::new(50.0, y)), |_| true).is_empty();
    assert!(hit(0.2));
    assert!(!hit(0.3));
}

#[test]
fn images_and_text_draw_in_layer_space() {
    let scene = SceneDatabase::<u32>::with_services(
        Services::default()
            .with_decoder(PixelDecoder)
            .with_text_engine(BoxEngine),
        SceneOptions::default().with_checkerboard(None),
    );
    let mut image = ImageLayer::new(1, 40.0, 30.0, vec![1_u8]);
    image.transform = Affine::translate((0.0, 50.0));
    let text = TextLayer::new(2, vec![TextRun::new("ab")]).with_decoration(Decoration::fill(red()));
    scene
        .update(&Canvas::new(100.0, 100.0).with_layer(image).with_layer(text))
        .unwrap();

    let painter = draw(&scene, Rect::new(0.0, 0.0, 100.0, 100.0));
    let image_draw = painter.draws().find_map(|(op, state)| match op {
        DrawOp::DrawImage { image, dst } => Some((image.width, *dst, state.transform)),
        _ => None,
    });
    assert_eq!(
        image_draw,
        Some((
            1,
            Rect::new(0.0, 0.0, 40.0, 30.0),
            Affine::translate((0.0, 50.0))
        ))
    );
    assert_eq!(
        fill_paths(&painter),
        vec![(Rect::new(0.0, 0.0, 20.0, 10.0), Affine::IDENTITY)]
    );

    // Undecodable bytes draw nothing.
    scene
        .update(&Canvas::new(100.0, 100.0).with_layer(ImageLayer::new(1, 40.0, 30.0, Vec::<u8>::new())))
        .unwrap();
    let painter = draw(&scene, Rect::new(0.0, 0.0, 100.0, 100.0));
    assert!(
        painter
            .draws()
            .all(|(op, _)| !matches!(op, DrawOp::DrawImage { .. }))
    );
}
