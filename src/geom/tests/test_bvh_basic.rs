use crate::geom::bvh::Bvh;
use crate::geom::{BBox, Point3};

fn unit_box_at(x: f64, y: f64, z: f64) -> BBox {
    BBox::new(Point3::new(x, y, z), Point3::new(x + 1.0, y + 1.0, z + 1.0))
}

#[test]
fn bvh_query_bbox_returns_intersecting_primitives() {
    let bboxes = vec![
        BBox::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0)),
        BBox::new(Point3::new(2.0, 2.0, 2.0), Point3::new(3.0, 3.0, 3.0)),
        BBox::new(Point3::new(0.5, 0.5, 0.5), Point3::new(2.5, 2.5, 2.5)),
    ];

    let bvh = Bvh::build_with_leaf_size(&bboxes, 1).expect("bvh build");
    let query = BBox::new(Point3::new(0.75, 0.75, 0.75), Point3::new(0.8, 0.8, 0.8));

    let mut hits = Vec::new();
    bvh.query_bbox(query, |idx| {
        hits.push(idx);
        true
    });
    hits.sort_unstable();
    hits.dedup();

    assert_eq!(hits, vec![0, 2]);
}

#[test]
fn bvh_query_point_matches_brute_force_on_grid() {
    let mut bboxes = Vec::new();
    for i in 0..6 {
        for j in 0..6 {
            bboxes.push(unit_box_at(f64::from(i) * 0.75, f64::from(j) * 0.75, 0.0));
        }
    }
    let bvh = Bvh::build(&bboxes).expect("bvh build");

    for probe in [
        Point3::new(0.1, 0.1, 0.5),
        Point3::new(2.2, 1.6, 0.5),
        Point3::new(4.4, 4.4, 1.0),
        Point3::new(9.0, 9.0, 0.5),
    ] {
        let mut hits = Vec::new();
        bvh.query_point(probe, |idx| {
            hits.push(idx);
            true
        });
        hits.sort_unstable();

        let expected: Vec<usize> = bboxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.contains_point(probe))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(hits, expected, "probe {probe:?}");
    }
}

#[test]
fn bvh_visitor_can_stop_early() {
    let bboxes: Vec<BBox> = (0..20).map(|_| unit_box_at(0.0, 0.0, 0.0)).collect();
    let bvh = Bvh::build_with_leaf_size(&bboxes, 2).expect("bvh build");

    let mut visited = 0;
    bvh.query_point(Point3::new(0.5, 0.5, 0.5), |_| {
        visited += 1;
        visited < 3
    });
    assert_eq!(visited, 3);
}

#[test]
fn bvh_build_rejects_empty_input() {
    assert!(Bvh::build(&[]).is_none());
}
