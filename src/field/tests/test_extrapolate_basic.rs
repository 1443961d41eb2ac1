use crate::field::{BoundaryExtrapolator, InteriorInterpolator, Ray, Resolution};
use crate::geom::{Point3, Triangulation, Vec3};

/// Square `[-1, 1]²` plus its centre, valued `f(x, y) = x + 2y`.
fn square() -> InteriorInterpolator {
    let points = vec![
        Point3::new(-1.0, -1.0, 0.0),
        Point3::new(1.0, -1.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(-1.0, 1.0, 0.0),
        Point3::ORIGIN,
    ];
    let values = points.iter().map(|p| p.x + 2.0 * p.y).collect();
    InteriorInterpolator::new(Triangulation::build(points, 2).unwrap(), values).unwrap()
}

fn ray_towards(x: f64, y: f64) -> Ray {
    Ray {
        origin: Point3::ORIGIN,
        direction: Vec3::new(x, y, 0.0).normalized().unwrap(),
    }
}

#[test]
fn interior_reproduces_linear_field() {
    let interior = square();
    for (x, y) in [(0.3, 0.1), (-0.7, 0.5), (0.99, -0.99), (1.0, 1.0)] {
        let value = interior.evaluate(Point3::new(x, y, 0.0)).unwrap();
        assert!((value - (x + 2.0 * y)).abs() < 1e-12);
    }
    assert!(interior.evaluate(Point3::new(1.5, 0.0, 0.0)).is_none());
}

#[test]
fn first_crossing_is_nearest_positive_plane() {
    let interior = square();
    let faces = interior.triangulation().hull_faces();
    let ray = ray_towards(1.0, 0.25);

    let (face, alpha) =
        BoundaryExtrapolator::first_crossing(faces, 0..faces.len(), &ray).unwrap();
    let hit = ray.at(alpha);
    assert!((hit.x - 1.0).abs() < 1e-12);
    assert!((hit.y - 0.25).abs() < 1e-12);
    assert!(faces[face].normal.x > 0.5);
}

#[test]
fn extrapolation_takes_the_boundary_value() {
    let interior = square();
    let extrapolator = BoundaryExtrapolator::new(-99.0, 64);
    let faces = interior.triangulation().hull_faces().len();

    let evaluation = extrapolator
        .extrapolate(&interior, &ray_towards(4.0, 1.0), 0..faces)
        .unwrap();
    assert!(matches!(evaluation.resolution, Resolution::Crossing { .. }));
    assert!((evaluation.value - 1.5).abs() < 1e-9);
}

#[test]
fn no_candidates_falls_back_to_default() {
    let interior = square();
    let extrapolator = BoundaryExtrapolator::new(-99.0, 64);
    let evaluation = extrapolator
        .extrapolate(&interior, &ray_towards(1.0, 0.0), std::iter::empty())
        .unwrap();
    assert_eq!(evaluation.value, -99.0);
    assert_eq!(evaluation.resolution, Resolution::Missed);
    assert!(evaluation.resolution.used_default());
}

#[test]
fn crossing_outside_its_face_falls_back_to_default() {
    let interior = square();
    let faces = interior.triangulation().hull_faces();
    let top = faces.iter().position(|f| f.normal.y > 0.5).unwrap();
    let extrapolator = BoundaryExtrapolator::new(-99.0, 64);

    let evaluation = extrapolator
        .extrapolate(&interior, &ray_towards(1.0, 0.1), [top])
        .unwrap();
    assert_eq!(evaluation.value, -99.0);
    assert_eq!(evaluation.resolution, Resolution::OutsideFace { face: top });
}

#[test]
fn faces_through_the_ray_origin_are_not_crossings() {
    let interior = square();
    let faces = interior.triangulation().hull_faces();
    let ray = Ray {
        origin: Point3::new(1.0, 0.0, 0.0),
        direction: Vec3::new(-1.0, 0.0, 0.0),
    };
    let (face, alpha) =
        BoundaryExtrapolator::first_crossing(faces, 0..faces.len(), &ray).unwrap();
    assert!(faces[face].normal.x < -0.5);
    assert!((alpha - 2.0).abs() < 1e-12);
}
