use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::field::{
    BoundingCircle, BoundingCone, BoundingVolume, BoundingVolumeIndex, Probe,
};
use crate::geom::{Point3, Triangulation, Vec3};

fn random_cloud(seed: u64, count: usize) -> Vec<Point3> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points: Vec<Point3> = (0..count)
        .map(|_| {
            Point3::new(
                rng.random_range(-3.0..3.0),
                rng.random_range(-2.0..2.0),
                rng.random_range(-1.0..1.0),
            )
        })
        .collect();
    points.push(Point3::ORIGIN);
    points
}

/// Random point of a hull face via random barycentric weights.
fn sample_face(rng: &mut StdRng, corners: &[Point3]) -> Point3 {
    let mut weights: Vec<f64> = corners.iter().map(|_| rng.random_range(0.0..1.0)).collect();
    let total: f64 = weights.iter().sum();
    weights.iter_mut().for_each(|w| *w /= total);
    corners
        .iter()
        .zip(&weights)
        .fold(Point3::ORIGIN, |acc, (p, w)| acc + p.to_vec3() * *w)
}

#[test]
fn cones_contain_every_direction_to_their_face() {
    let tri = Triangulation::build(random_cloud(11, 80), 3).unwrap();
    let center = Point3::ORIGIN;
    let index = BoundingVolumeIndex::cones(tri.hull_faces(), center);
    let mut rng = StdRng::seed_from_u64(12);

    for (face, cone) in tri.hull_faces().iter().zip(index.volumes()) {
        for corner in face.corners() {
            assert!(cone.contains_direction(*corner - center));
        }
        for _ in 0..20 {
            let p = sample_face(&mut rng, face.corners());
            assert!(cone.contains_direction(p - center));
        }
    }
}

#[test]
fn cone_axis_points_towards_the_face() {
    let tri = Triangulation::build(random_cloud(3, 30), 3).unwrap();
    for face in tri.hull_faces() {
        let cone = BoundingCone::for_face(face, Point3::ORIGIN);
        if cone.half_angle < PI {
            assert!(cone.axis.dot(face.centroid().to_vec3()) > 0.0);
            assert!(cone.half_angle < PI / 2.0);
        }
    }
}

#[test]
fn face_through_centre_gets_full_cone() {
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
    ];
    let tri = Triangulation::build(points, 3).unwrap();
    let floor = tri
        .hull_faces()
        .iter()
        .find(|f| f.normal.z < -0.5)
        .unwrap();
    let cone = BoundingCone::for_face(floor, Point3::ORIGIN);
    assert_eq!(cone, BoundingCone::FULL);
    assert!(cone.contains_direction(Vec3::new(0.0, 0.0, -1.0)));
}

#[test]
fn batch_probe_is_a_superset_of_single_probes() {
    let tri = Triangulation::build(random_cloud(5, 60), 3).unwrap();
    let index = BoundingVolumeIndex::cones(tri.hull_faces(), Point3::ORIGIN);
    let mut rng = StdRng::seed_from_u64(6);

    let base = Vec3::new(1.0, 0.3, -0.2);
    let keys: Vec<Vec3> = (0..16)
        .filter_map(|_| {
            let jitter = Vec3::new(
                rng.random_range(-0.3..0.3),
                rng.random_range(-0.3..0.3),
                rng.random_range(-0.3..0.3),
            );
            (base + jitter).normalized()
        })
        .collect();

    let shared = index.candidates_for(&keys);
    for key in &keys {
        for face in index.candidates(&Probe::single(*key)) {
            assert!(shared.contains(&face), "face {face} lost by batching");
        }
    }
    assert!(index.candidates_for(&[]).is_empty());
}

#[test]
fn opposite_directions_summarize_to_everything() {
    let probe = BoundingCone::summarize(&[Vec3::X, -Vec3::X]).unwrap();
    assert_eq!(probe.spread, PI);
    let cone = BoundingCone {
        axis: Vec3::new(0.0, 1.0, 0.0),
        half_angle: 0.01,
    };
    assert!(cone.admits(&probe));
}

#[test]
fn circles_enclose_the_angular_footprint() {
    let points = vec![
        Point3::new(0.0, -10.0, -5.0),
        Point3::new(0.0, 10.0, -5.0),
        Point3::new(0.0, 0.0, 5.0),
        Point3::new(10.0, -10.0, -5.0),
        Point3::new(10.0, 10.0, -5.0),
        Point3::new(10.0, 0.0, 5.0),
        Point3::new(4.0, 0.0, 0.0),
    ];
    let tri = Triangulation::build(points, 3).unwrap();
    let index = BoundingVolumeIndex::circles(tri.hull_faces());
    let mut rng = StdRng::seed_from_u64(9);

    for (face, circle) in tri.hull_faces().iter().zip(index.volumes()) {
        for _ in 0..20 {
            let p = sample_face(&mut rng, face.corners());
            assert!(circle.admits(&Probe::single((p.y, p.z))));
        }
    }

    let far = BoundingCircle::for_face(&tri.hull_faces()[0]);
    assert!(!far.admits(&Probe::single((500.0, 500.0))));
    assert!(far.admits(&Probe {
        center: (500.0, 500.0),
        spread: 1000.0,
    }));
}

#[test]
fn circle_summary_covers_every_key() {
    let keys = [(0.0, 0.0), (4.0, 0.0), (2.0, 3.0)];
    let probe = BoundingCircle::summarize(&keys).unwrap();
    for (a, b) in keys {
        let d = (a - probe.center.0).hypot(b - probe.center.1);
        assert!(d <= probe.spread + 1e-12);
    }
}

#[test]
fn circle_sort_key_bands_the_second_angle() {
    let key = |a: f64, b: f64| <BoundingCircle as BoundingVolume>::sort_key(&(a, b));

    assert_eq!(key(10.0, 0.5).0, key(-120.0, 4.5).0);
    assert_eq!(key(10.0, 4.5).0 + 1, key(10.0, 5.5).0);
    assert_eq!(key(0.0, -0.5).0, -1);
    assert_eq!(key(-35.0, 2.0).1, -35.0);
}
