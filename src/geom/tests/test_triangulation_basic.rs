use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geom::{Point3, Tolerance, Triangulation, TriangulationError, orient2d, orient3d};

fn cube_with_center() -> Vec<Point3> {
    let mut points = Vec::new();
    for x in [0.0, 1.0] {
        for y in [0.0, 1.0] {
            for z in [0.0, 1.0] {
                points.push(Point3::new(x, y, z));
            }
        }
    }
    points.push(Point3::new(0.5, 0.5, 0.5));
    points
}

fn total_measure(tri: &Triangulation) -> f64 {
    let pts = tri.points();
    (0..tri.simplex_count())
        .map(|s| {
            let v = tri.simplex(s);
            if tri.dim() == 2 {
                orient2d(pts[v[0]], pts[v[1]], pts[v[2]]).abs() / 2.0
            } else {
                orient3d(pts[v[0]], pts[v[1]], pts[v[2]], pts[v[3]]).abs() / 6.0
            }
        })
        .sum()
}

#[test]
fn square_splits_into_two_triangles() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(2.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
    ];
    let tri = Triangulation::build(points, 2).expect("triangulate square");

    assert_eq!(tri.simplex_count(), 2);
    assert_eq!(tri.hull_faces().len(), 4);
    assert!((total_measure(&tri) - 2.0).abs() < 1e-12);
}

#[test]
fn two_dimensional_build_ignores_z() {
    let points = vec![
        Point3::new(0.0, 0.0, 5.0),
        Point3::new(1.0, 0.0, -3.0),
        Point3::new(0.0, 1.0, 2.0),
    ];
    let tri = Triangulation::build(points, 2).expect("triangulate triangle");
    assert!(tri.points().iter().all(|p| p.z == 0.0));
    assert!(tri.locate(Point3::new(0.25, 0.25, 99.0)).is_some());
}

#[test]
fn cube_tetrahedralization_fills_the_cube() {
    let tri = Triangulation::build(cube_with_center(), 3).expect("triangulate cube");

    assert!(tri.simplex_count() >= 12);
    assert!((total_measure(&tri) - 1.0).abs() < 1e-9);
    assert_eq!(tri.hull_faces().len(), 12);
}

#[test]
fn hull_normals_point_away_from_interior() {
    let tri = Triangulation::build(cube_with_center(), 3).expect("triangulate cube");
    let inside = Point3::new(0.5, 0.5, 0.5);
    for face in tri.hull_faces() {
        assert!(face.signed_distance(inside) < 0.0);
        assert!((face.normal.length() - 1.0).abs() < 1e-12);
        for corner in face.corners() {
            assert!(face.signed_distance(*corner).abs() < 1e-12);
        }
    }
}

#[test]
fn locate_returns_weights_that_reconstruct_the_point() {
    let tri = Triangulation::build(cube_with_center(), 3).expect("triangulate cube");
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let p = Point3::new(
            rng.random_range(0.01..0.99),
            rng.random_range(0.01..0.99),
            rng.random_range(0.01..0.99),
        );
        let location = tri.locate(p).expect("interior point locates");
        let vertices = tri.simplex(location.simplex);
        let weights = &location.weights[..4];

        let sum: f64 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(weights.iter().all(|w| *w >= -1e-10));

        let mut rebuilt = Point3::ORIGIN;
        for (w, &v) in weights.iter().zip(vertices) {
            rebuilt = rebuilt + tri.points()[v].to_vec3() * *w;
        }
        assert!(rebuilt.distance_to(p) < 1e-9);
    }
}

#[test]
fn locate_resolves_vertices_and_rejects_outside_points() {
    let points = cube_with_center();
    let tri = Triangulation::build(points.clone(), 3).expect("triangulate cube");

    for p in &points {
        assert!(tri.locate(*p).is_some(), "vertex {p:?} should locate");
    }
    assert!(tri.locate(Point3::new(1.5, 0.5, 0.5)).is_none());
    assert!(tri.locate(Point3::new(f64::NAN, 0.5, 0.5)).is_none());
}

#[test]
fn random_cloud_simplices_are_positive_and_cover_samples() {
    let mut rng = StdRng::seed_from_u64(42);
    let points: Vec<Point3> = (0..300)
        .map(|_| {
            Point3::new(
                rng.random_range(-5.0..5.0),
                rng.random_range(-5.0..5.0),
                rng.random_range(-5.0..5.0),
            )
        })
        .collect();
    let tri = Triangulation::build(points.clone(), 3).expect("triangulate cloud");

    let pts = tri.points();
    for s in 0..tri.simplex_count() {
        let v = tri.simplex(s);
        assert!(orient3d(pts[v[0]], pts[v[1]], pts[v[2]], pts[v[3]]) > 0.0);
    }
    for p in &points {
        assert!(tri.locate(*p).is_some());
    }
}

fn box_cloud(seed: u64, count: usize, extent: [f64; 3]) -> Vec<Point3> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            Point3::new(
                rng.random_range(0.0..extent[0]),
                rng.random_range(0.0..extent[1]),
                rng.random_range(0.0..extent[2]),
            )
        })
        .collect()
}

fn assert_convex_cover(tri: &Triangulation) {
    let tol = Tolerance::DEFAULT.relative_to(tri.extent());
    for (index, face) in tri.hull_faces().iter().enumerate() {
        for p in tri.points() {
            let distance = face.signed_distance(*p);
            assert!(distance <= tol, "{p:?} lies {distance} beyond hull face {index}");
        }
    }
    let pts = tri.points();
    for s in 0..tri.simplex_count() {
        let v = tri.simplex(s);
        assert!(orient3d(pts[v[0]], pts[v[1]], pts[v[2]], pts[v[3]]) > 0.0);
    }
    for p in pts {
        assert!(tri.locate(*p).is_some(), "vertex {p:?} should locate");
    }
}

#[test]
fn thin_slab_hull_is_convex() {
    let points = box_cloud(17, 300, [100.0, 100.0, 0.01]);
    let tri = Triangulation::build(points, 3).expect("triangulate slab");
    assert_convex_cover(&tri);

    let mut rng = StdRng::seed_from_u64(18);
    let pts = tri.points();
    for _ in 0..300 {
        let [a, b, c] = [0; 3].map(|_| pts[rng.random_range(0..pts.len())]);
        let mid = Point3::from((a.to_vec3() + b.to_vec3() + c.to_vec3()) / 3.0);
        assert!(tri.locate(mid).is_some(), "{mid:?} lies inside the slab");
    }
}

#[test]
fn needle_hull_is_convex() {
    let points = box_cloud(19, 300, [1000.0, 1.0, 1.0]);
    let tri = Triangulation::build(points, 3).expect("triangulate needle");
    assert_convex_cover(&tri);
}

#[test]
fn grid_hull_has_two_faces_per_boundary_square() {
    let mut points = Vec::new();
    for x in 0..5 {
        for y in 0..5 {
            for z in 0..5 {
                points.push(Point3::new(f64::from(x), f64::from(y), f64::from(z)));
            }
        }
    }
    let tri = Triangulation::build(points, 3).expect("triangulate grid");
    assert_convex_cover(&tri);
    assert!((total_measure(&tri) - 64.0).abs() < 1e-9);
    assert_eq!(tri.hull_faces().len(), 6 * 16 * 2);
}

#[test]
fn build_rejects_coincident_points() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
    ];
    let err = Triangulation::build(points, 2).unwrap_err();
    assert!(matches!(err, TriangulationError::CoincidentPoints { first: 1, second: 3 }));
}

#[test]
fn build_rejects_degenerate_input() {
    let collinear = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(2.0, 2.0, 0.0),
    ];
    assert!(matches!(
        Triangulation::build(collinear, 2),
        Err(TriangulationError::Degenerate { rank: 1, dim: 2 })
    ));

    let coplanar = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
    ];
    assert!(matches!(
        Triangulation::build(coplanar, 3),
        Err(TriangulationError::Degenerate { rank: 2, dim: 3 })
    ));
}

#[test]
fn build_rejects_bad_counts_and_values() {
    assert!(matches!(
        Triangulation::build(vec![Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)], 2),
        Err(TriangulationError::NotEnoughPoints { min: 3, count: 2 })
    ));
    assert!(matches!(
        Triangulation::build(
            vec![
                Point3::ORIGIN,
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, f64::INFINITY, 0.0),
            ],
            2
        ),
        Err(TriangulationError::NonFinitePoint { index: 2 })
    ));
    assert!(matches!(
        Triangulation::build(vec![Point3::ORIGIN; 5], 4),
        Err(TriangulationError::UnsupportedDimension { dim: 4 })
    ));
}
