// Copyright 2025 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for full reconciliation through `SceneDatabase::update`.
//!
//! These cover how a canvas snapshot is turned into drawables: paint order,
//! minimal invalidation, computed layer expansion and cycle rejection.

use kurbo::{Affine, Point, Rect, Shape};
use lamina_scene::{
    Canvas, ComputedLayer, Decoration, ImageLayer, Layer, LayerQuery, SceneError, TextLayer, TextRun,
};

mod common;

use common::{filled_rect, ids, red, scene, shifted_copy};

fn three_squares() -> Vec<Layer<u32>> {
    vec![
        filled_rect(1, Rect::new(0.0, 0.0, 10.0, 10.0)).into(),
        filled_rect(2, Rect::new(20.0, 0.0, 30.0, 10.0)).into(),
        filled_rect(3, Rect::new(40.0, 0.0, 50.0, 10.0)).into(),
    ]
}

fn canvas_of(layers: Vec<Layer<u32>>) -> Canvas<u32> {
    let mut canvas = Canvas::new(100.0, 100.0);
    canvas.layers = layers;
    canvas
}

#[test]
fn repeated_update_is_silent() {
    let scene = scene();
    let canvas = canvas_of(three_squares()).with_layer(ComputedLayer::new(10, 1, shifted_copy(1, 11, 50.0)));

    let first = scene.update(&canvas).unwrap();
    assert!(first.is_whole_canvas());
    assert!(first.is_content_size());

    let second = scene.update(&canvas).unwrap();
    assert!(second.is_empty(), "unchanged canvas produced {second:?}");
}

#[test]
fn queries_return_topmost_first() {
    let scene = scene();
    let mut layers = three_squares();
    layers.swap(0, 2);
    scene.update(&canvas_of(layers)).unwrap();

    assert_eq!(scene.paint_order(), vec![3, 2, 1]);
    assert_eq!(ids(&scene.layers(LayerQuery::All, |_| true)), vec![1, 2, 3]);
    assert_eq!(ids(&scene.layers(LayerQuery::All, |id| id != 2)), vec![1, 3]);
}

#[test]
fn moving_one_layer_invalidates_only_that_layer() {
    let scene = scene();
    scene.update(&canvas_of(three_squares())).unwrap();

    let mut reordered = three_squares();
    reordered.rotate_left(1);
    let set = scene.update(&canvas_of(reordered)).unwrap();

    assert_eq!(scene.paint_order(), vec![2, 3, 1]);
    assert!(set.kinds().is_empty());
    assert_eq!(set.dirty_rect(), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
}

#[test]
fn removed_layers_invalidate_their_bounds() {
    let scene = scene();
    scene.update(&canvas_of(three_squares())).unwrap();

    let mut layers = three_squares();
    layers.remove(1);
    let set = scene.update(&canvas_of(layers)).unwrap();

    assert_eq!(scene.paint_order(), vec![1, 3]);
    assert_eq!(set.dirty_rect(), Some(Rect::new(20.0, 0.0, 30.0, 10.0)));
    assert!(scene.layer(2).is_none());
}

#[test]
fn changed_layers_invalidate_old_and_new_bounds() {
    let scene = scene();
    scene.update(&canvas_of(three_squares())).unwrap();

    let mut layers = three_squares();
    layers[0] = filled_rect(1, Rect::new(0.0, 50.0, 10.0, 60.0)).into();
    let set = scene.update(&canvas_of(layers)).unwrap();

    assert_eq!(set.dirty_rect(), Some(Rect::new(0.0, 0.0, 10.0, 60.0)));
}

#[test]
fn computed_outputs_follow_their_source_in_one_update() {
    let scene = scene();
    let canvas = |source: Rect| {
        Canvas::new(300.0, 100.0)
            .with_layer(filled_rect(1, source))
            .with_layer(ComputedLayer::new(10, 1, shifted_copy(1, 11, 50.0)))
            .with_layer(ComputedLayer::new(20, 11, shifted_copy(2, 21, 100.0)))
    };

    scene.update(&canvas(Rect::new(0.0, 0.0, 10.0, 10.0))).unwrap();
    assert_eq!(scene.paint_order(), vec![1, 11, 21]);
    assert_eq!(scene.generated_layers(10), Some(vec![11]));
    assert_eq!(
        scene.effect_bounds(&[21]),
        Some(Rect::new(150.0, 0.0, 160.0, 10.0))
    );

    let set = scene.update(&canvas(Rect::new(0.0, 0.0, 20.0, 20.0))).unwrap();
    let paths = scene.structure_paths(&[11, 21]);
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0].bounding_box(), Rect::new(50.0, 0.0, 70.0, 20.0));
    assert_eq!(paths[1].bounding_box(), Rect::new(150.0, 0.0, 170.0, 20.0));
    assert_eq!(set.dirty_rect(), Some(Rect::new(0.0, 0.0, 170.0, 20.0)));

    // A computed id stands for its outputs.
    assert_eq!(
        scene.effect_bounds(&[10]),
        Some(Rect::new(50.0, 0.0, 70.0, 20.0))
    );
}

#[test]
fn computed_layer_without_source_contributes_nothing() {
    let scene = scene();
    let canvas = Canvas::new(100.0, 100.0).with_layer(ComputedLayer::new(10, 1, shifted_copy(1, 11, 5.0)));
    scene.update(&canvas).unwrap();

    assert!(scene.is_empty());
    assert_eq!(scene.generated_layers(10), Some(vec![]));
    assert!(matches!(scene.layer(10), Some(Layer::Computed(_))));
}

#[test]
fn dropping_a_computed_layer_removes_its_outputs() {
    let scene = scene();
    let with_computed = canvas_of(three_squares()).with_layer(ComputedLayer::new(10, 1, shifted_copy(1, 11, 70.0)));
    scene.update(&with_computed).unwrap();
    assert_eq!(scene.len(), 4);

    let set = scene.update(&canvas_of(three_squares())).unwrap();
    assert_eq!(scene.paint_order(), vec![1, 2, 3]);
    assert_eq!(scene.generated_layers(10), None);
    assert_eq!(set.dirty_rect(), Some(Rect::new(70.0, 0.0, 80.0, 10.0)));
}

#[test]
fn cyclic_canvases_are_rejected_without_changes() {
    let scene = scene();
    scene.update(&canvas_of(three_squares())).unwrap();

    // The computed layer would regenerate its own source.
    let feedback = canvas_of(three_squares()).with_layer(ComputedLayer::new(10, 1, shifted_copy(1, 1, 5.0)));
    assert_eq!(
        scene.update(&feedback),
        Err(SceneError::CyclicDependency {
            computed: 10,
            based_on: 1
        })
    );

    let self_based = Canvas::new(5.0, 5.0).with_layer(ComputedLayer::new(10, 10, shifted_copy(1, 11, 5.0)));
    assert!(matches!(
        scene.update(&self_based),
        Err(SceneError::CyclicDependency { computed: 10, .. })
    ));

    // Two computed layers based on each other, with neither source present.
    let mutual = canvas_of(three_squares())
        .with_layer(ComputedLayer::new(10, 20, shifted_copy(1, 11, 5.0)))
        .with_layer(ComputedLayer::new(20, 10, shifted_copy(2, 21, 5.0)));
    assert_eq!(
        scene.update(&mutual),
        Err(SceneError::CyclicDependency {
            computed: 10,
            based_on: 20
        })
    );

    assert_eq!(scene.paint_order(), vec![1, 2, 3]);
    assert_eq!(scene.size(), kurbo::Size::new(100.0, 100.0));
    assert_eq!(scene.generated_layers(10), None);
    assert_eq!(scene.generated_layers(20), None);
}

#[test]
fn duplicate_ids_keep_the_first_occurrence() {
    let scene = scene();
    let first = filled_rect(1, Rect::new(0.0, 0.0, 10.0, 10.0));
    let canvas = Canvas::new(100.0, 100.0)
        .with_layer(first.clone())
        .with_layer(filled_rect(1, Rect::new(50.0, 50.0, 60.0, 60.0)));
    scene.update(&canvas).unwrap();

    assert_eq!(scene.len(), 1);
    assert_eq!(scene.layer(1), Some(Layer::Path(first)));
}

#[test]
fn invalidation_is_reported_in_view_space() {
    let scene = scene();
    let canvas = |dx: f64| {
        let mut layer = filled_rect(1, Rect::new(0.0, 0.0, 10.0, 10.0));
        layer.transform = Affine::translate((dx, 0.0));
        Canvas::new(100.0, 100.0)
            .with_content_transform(Affine::scale(2.0))
            .with_layer(layer)
    };
    scene.update(&canvas(0.0)).unwrap();

    let set = scene.update(&canvas(10.0)).unwrap();
    assert_eq!(set.dirty_rect(), Some(Rect::new(0.0, 0.0, 40.0, 20.0)));
    assert_eq!(
        scene.convert_view_to_document(Point::new(20.0, 20.0)),
        Point::new(10.0, 10.0)
    );

    scene.set_zoom(2.0);
    let set = scene.update(&canvas(0.0)).unwrap();
    assert_eq!(set.dirty_rect(), Some(Rect::new(0.0, 0.0, 80.0, 40.0)));
    assert_eq!(
        scene.convert_view_to_document(Point::new(40.0, 40.0)),
        Point::new(10.0, 10.0)
    );
}

#[test]
fn frame_changes_raise_the_right_kinds() {
    let scene = scene();
    scene.update(&Canvas::new(100.0, 100.0)).unwrap();

    let recolored = scene.update(&Canvas::new(100.0, 100.0).with_background(red())).unwrap();
    assert!(recolored.is_whole_canvas());
    assert!(!recolored.is_content_size());

    let resized = scene.update(&Canvas::new(120.0, 100.0).with_background(red())).unwrap();
    assert!(resized.is_whole_canvas());
    assert!(resized.is_content_size());
    assert_eq!(scene.background_color(), Some(red()));
}

#[test]
fn unit_square_hit_testing() {
    let scene = scene();
    let mut square = filled_rect(1, Rect::new(0.0, 0.0, 1.0, 1.0));
    square.transform = Affine::scale(100.0);
    scene.update(&Canvas::new(100.0, 100.0).with_layer(square)).unwrap();

    let under = |pt: Point| ids(&scene.layers(LayerQuery::UnderLocation(pt), |_| true));
    assert_eq!(under(Point::new(50.0, 50.0)), vec![1]);
    assert_eq!(under(Point::new(-1.0, -1.0)), Vec::<u32>::new());
}

#[test]
fn stroke_hits_end_at_half_the_width() {
    let scene = scene();
    let mut line = kurbo::BezPath::new();
    line.move_to((0.0, 0.0));
    line.line_to((100.0, 0.0));
    let layer = lamina_scene::PathLayer::new(1, line).with_decoration(Decoration::stroke(10.0, red()));
    scene.update(&Canvas::new(100.0, 100.0).with_layer(layer)).unwrap();

    let hit = |y: f64| !scene.layers(LayerQuery::UnderLocation(Point::new(50.0, y)), |_| true).is_empty();
    assert!(hit(5.0));
    assert!(!hit(5.0 + 1e-6));
    assert!(hit(-5.0));
}

#[test]
fn under_location_returns_only_the_topmost_hit() {
    let scene = scene();
    let canvas = Canvas::new(100.0, 100.0)
        .with_layer(filled_rect(1, Rect::new(0.0, 0.0, 50.0, 50.0)))
        .with_layer(filled_rect(2, Rect::new(25.0, 25.0, 75.0, 75.0)));
    scene.update(&canvas).unwrap();

    let pt = Point::new(30.0, 30.0);
    assert_eq!(ids(&scene.layers(LayerQuery::UnderLocation(pt), |_| true)), vec![2]);
    // The predicate runs before geometry.
    assert_eq!(ids(&scene.layers(LayerQuery::UnderLocation(pt), |id| id == 1)), vec![1]);
}

#[test]
fn bounds_queries() {
    let scene = scene();
    scene.update(&canvas_of(three_squares())).unwrap();

    let area = Rect::new(5.0, 0.0, 30.0, 10.0);
    assert_eq!(ids(&scene.layers(LayerQuery::IntersectingBounds(area), |_| true)), vec![2, 1]);
    assert_eq!(ids(&scene.layers(LayerQuery::ContainingBounds(area), |_| true)), vec![2]);
    assert_eq!(
        scene.effect_bounds(&[1, 3, 99]),
        Some(Rect::new(0.0, 0.0, 50.0, 10.0))
    );
    assert_eq!(scene.effect_bounds(&[99]), None);
}

#[test]
fn text_and_image_layers_answer_queries() {
    let scene = scene();
    let text = TextLayer::new(5, vec![TextRun::new("abc")]).with_decoration(Decoration::fill(red()));
    let mut image = ImageLayer::new(6, 40.0, 30.0, vec![1_u8, 2, 3]);
    image.transform = Affine::translate((0.0, 50.0));
    scene
        .update(&Canvas::new(100.0, 100.0).with_layer(text).with_layer(image))
        .unwrap();

    assert_eq!(scene.effect_bounds(&[5]), Some(Rect::new(0.0, 0.0, 30.0, 10.0)));
    assert_eq!(scene.effect_bounds(&[6]), Some(Rect::new(0.0, 50.0, 40.0, 80.0)));
    let under = |pt: Point| ids(&scene.layers(LayerQuery::UnderLocation(pt), |_| true));
    assert_eq!(under(Point::new(25.0, 5.0)), vec![5]);
    assert_eq!(under(Point::new(40.0, 80.0)), vec![6]);
    assert_eq!(under(Point::new(35.0, 5.0)), Vec::<u32>::new());
    assert_eq!(
        scene.structure_paths(&[6])[0].bounding_box(),
        Rect::new(0.0, 50.0, 40.0, 80.0)
    );
}
