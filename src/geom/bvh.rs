use super::{BBox, Point3};

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bbox: BBox,
    left: u32,
    right: u32,
    start: u32,
    count: u32,
}

impl BvhNode {
    const fn leaf(bbox: BBox, start: u32, count: u32) -> Self {
        Self {
            bbox,
            left: u32::MAX,
            right: u32::MAX,
            start,
            count,
        }
    }

    const fn inner(bbox: BBox, left: u32, right: u32) -> Self {
        Self {
            bbox,
            left,
            right,
            start: 0,
            count: 0,
        }
    }

    const fn is_leaf(self) -> bool {
        self.count != 0
    }
}

/// Median-split bounding volume hierarchy over primitive boxes.
///
/// Used by the triangulation to find the simplices whose boxes contain a
/// query point without scanning the whole mesh.
#[derive(Debug, Clone)]
pub(crate) struct Bvh {
    nodes: Vec<BvhNode>,
    prim_indices: Vec<u32>,
}

impl Bvh {
    const DEFAULT_LEAF_SIZE: usize = 8;

    #[must_use]
    pub(crate) fn build(bboxes: &[BBox]) -> Option<Self> {
        Self::build_with_leaf_size(bboxes, Self::DEFAULT_LEAF_SIZE)
    }

    #[must_use]
    pub(crate) fn build_with_leaf_size(bboxes: &[BBox], leaf_size: usize) -> Option<Self> {
        if bboxes.is_empty() {
            return None;
        }

        let leaf_size = leaf_size.clamp(1, 256);
        let prim_indices: Vec<u32> = (0..bboxes.len()).map(|i| i as u32).collect();
        let nodes = Vec::with_capacity(bboxes.len().saturating_mul(2));

        let mut bvh = Self { nodes, prim_indices };
        bvh.build_node(bboxes, 0, bboxes.len(), leaf_size);
        Some(bvh)
    }

    fn build_node(&mut self, bboxes: &[BBox], start: usize, end: usize, leaf_size: usize) -> u32 {
        let node_index = self.nodes.len() as u32;
        let bbox = self.range_bbox(bboxes, start, end);
        self.nodes.push(BvhNode::leaf(bbox, 0, 0));

        let count = end - start;
        if count <= leaf_size {
            self.nodes[node_index as usize] = BvhNode::leaf(bbox, start as u32, count as u32);
            return node_index;
        }

        let axis = Self::widest_centroid_axis(bboxes, &self.prim_indices[start..end]);
        let mid = start + count / 2;
        self.prim_indices[start..end].select_nth_unstable_by(mid - start, |a, b| {
            let ca = bboxes[*a as usize].center().component(axis);
            let cb = bboxes[*b as usize].center().component(axis);
            ca.total_cmp(&cb)
        });

        let left = self.build_node(bboxes, start, mid, leaf_size);
        let right = self.build_node(bboxes, mid, end, leaf_size);
        self.nodes[node_index as usize] = BvhNode::inner(bbox, left, right);
        node_index
    }

    fn range_bbox(&self, bboxes: &[BBox], start: usize, end: usize) -> BBox {
        let mut bbox = bboxes[self.prim_indices[start] as usize];
        for &idx in &self.prim_indices[(start + 1)..end] {
            bbox = bbox.union(bboxes[idx as usize]);
        }
        bbox
    }

    fn widest_centroid_axis(bboxes: &[BBox], prims: &[u32]) -> usize {
        let centers: Vec<Point3> = prims.iter().map(|&i| bboxes[i as usize].center()).collect();
        let Some(spread) = BBox::from_points(&centers) else {
            return 0;
        };
        let e = spread.extent();
        if e.x >= e.y && e.x >= e.z {
            0
        } else if e.y >= e.z {
            1
        } else {
            2
        }
    }

    /// Visit every primitive whose box intersects `query`.
    /// The visitor returns `false` to stop the traversal early.
    pub(crate) fn query_bbox<F>(&self, query: BBox, mut visit: F)
    where
        F: FnMut(usize) -> bool,
    {
        if self.nodes.is_empty() {
            return;
        }

        let mut stack = Vec::with_capacity(32);
        stack.push(0u32);

        while let Some(node_idx) = stack.pop() {
            let node = self.nodes[node_idx as usize];
            if !node.bbox.intersects(query) {
                continue;
            }

            if node.is_leaf() {
                let start = node.start as usize;
                let end = start + node.count as usize;
                for &prim in &self.prim_indices[start..end] {
                    if !visit(prim as usize) {
                        return;
                    }
                }
                continue;
            }

            stack.push(node.left);
            stack.push(node.right);
        }
    }

    pub(crate) fn query_point<F>(&self, point: Point3, visit: F)
    where
        F: FnMut(usize) -> bool,
    {
        self.query_bbox(BBox::from_point(point), visit);
    }
}
