use std::fmt::Write as _;

use glam::{DAffine2, DVec2};

use crate::{
    geometry::{Geometry, GeometryCache},
    types::{Direction, NodeId},
};

/// One recursion step of the fractal.
///
/// A node is a square of side `width` whose top edge is the base of the
/// right triangle spanned by its two children. `pos` is the node's origin
/// in its parent's frame; the trunk's `pos` is in surface space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangleNode {
    pub width: f64,
    pub pos: DVec2,
    pub height_factor: f64,
    pub lean: f64,
    pub direction: Option<Direction>,
    pub level: u32,
    pub max_level: u32,
}

/// A rotation by `degrees` around `pivot`, in the node's own frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation {
    pub degrees: f64,
    pub pivot: DVec2,
}

impl Rotation {
    pub fn to_affine(&self) -> DAffine2 {
        DAffine2::from_translation(self.pivot)
            * DAffine2::from_angle(self.degrees.to_radians())
            * DAffine2::from_translation(-self.pivot)
    }
}

/// Result of [`expand`]: either slot may be empty.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Children {
    pub left: Option<TriangleNode>,
    pub right: Option<TriangleNode>,
}

impl TriangleNode {
    pub fn trunk(width: f64, pos: DVec2, height_factor: f64, lean: f64, max_level: u32) -> Self {
        Self {
            width,
            pos,
            height_factor,
            lean,
            direction: None,
            level: 0,
            max_level,
        }
    }

    /// Builds the child for `direction`, or `None` when the branch stops.
    ///
    /// A branch stops when the child would reach `max_level` or when its
    /// width is below `min_width`. NaN and infinite widths count as below.
    pub fn child(&self, direction: Direction, width: f64, min_width: f64) -> Option<Self> {
        let level = self.level + 1;
        if !(width.is_finite() && width >= min_width) || level >= self.max_level {
            return None;
        }

        let pos = match direction {
            Direction::Left => DVec2::new(0.0, -width),
            Direction::Right => DVec2::new(self.width - width, -width),
        };

        Some(Self {
            width,
            pos,
            direction: Some(direction),
            level,
            ..*self
        })
    }

    /// Rotation applied after translating to `pos`; the trunk has none.
    ///
    /// `geom` must be this node's own geometry.
    pub fn rotation(&self, geom: &Geometry) -> Option<Rotation> {
        let w = self.width;
        match self.direction? {
            Direction::Left => Some(Rotation {
                degrees: -geom.angle_a,
                pivot: DVec2::new(0.0, w),
            }),
            Direction::Right => Some(Rotation {
                degrees: geom.angle_b,
                pivot: DVec2::new(w, w),
            }),
        }
    }

    /// `translate(pos) * rotation`, mapping this node's frame into its parent's.
    pub fn local_transform(&self, geom: &Geometry) -> DAffine2 {
        let translate = DAffine2::from_translation(self.pos);
        match self.rotation(geom) {
            Some(rot) => translate * rot.to_affine(),
            None => translate,
        }
    }

    /// The same transform in SVG attribute syntax.
    pub fn transform_attr(&self, geom: &Geometry) -> String {
        let mut out = format!("translate({} {})", self.pos.x, self.pos.y);
        if let Some(rot) = self.rotation(geom) {
            let _ = write!(
                out,
                " rotate({} {} {})",
                rot.degrees, rot.pivot.x, rot.pivot.y
            );
        }
        out
    }

    /// Top of the right triangle above this node, in the node's frame.
    pub fn apex(&self) -> DVec2 {
        DVec2::new(
            self.width * (0.5 - self.lean),
            -self.height_factor * self.width,
        )
    }
}

/// Expands one node into its (possibly absent) children.
pub fn expand(node: &TriangleNode, cache: &mut GeometryCache, min_width: f64) -> Children {
    let geom = cache.get(node.width, node.height_factor, node.lean);
    Children {
        left: node.child(Direction::Left, geom.next_left, min_width),
        right: node.child(Direction::Right, geom.next_right, min_width),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    pub triangle: TriangleNode,
    pub geometry: Geometry,
    /// Node frame to surface space, composed over all ancestors.
    pub world: DAffine2,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// `false` when degenerate geometry left a non-finite transform.
    pub fn is_drawable(&self) -> bool {
        self.world.is_finite() && self.triangle.width.is_finite()
    }

    /// Corners of the node's square in surface space, starting top-left.
    pub fn outline(&self) -> [DVec2; 4] {
        let w = self.triangle.width;
        [
            DVec2::new(0.0, 0.0),
            DVec2::new(w, 0.0),
            DVec2::new(w, w),
            DVec2::new(0.0, w),
        ]
        .map(|p| self.world.transform_point2(p))
    }

    /// The right triangle standing on the node's top edge, in surface space.
    pub fn apex_triangle(&self) -> [DVec2; 3] {
        let w = self.triangle.width;
        [DVec2::ZERO, self.triangle.apex(), DVec2::new(w, 0.0)]
            .map(|p| self.world.transform_point2(p))
    }
}

/// A fully materialized fractal, nodes stored in pre-order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Recursively expands `root` until every branch stops.
    pub fn generate(root: TriangleNode, cache: &mut GeometryCache, min_width: f64) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow(root, None, DAffine2::IDENTITY, cache, min_width);

        log::debug!(
            "generated tree: nodes={} depth={} height_factor={} lean={} max_level={}",
            tree.nodes.len(),
            tree.depth(),
            root.height_factor,
            root.lean,
            root.max_level
        );
        tree
    }

    fn grow(
        &mut self,
        node: TriangleNode,
        parent: Option<NodeId>,
        parent_world: DAffine2,
        cache: &mut GeometryCache,
        min_width: f64,
    ) -> NodeId {
        let geometry = cache.get(node.width, node.height_factor, node.lean);
        let world = parent_world * node.local_transform(&geometry);

        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            triangle: node,
            geometry,
            world,
            parent,
            children: Vec::with_capacity(2),
        });
        if let Some(p) = parent {
            self.nodes[p].children.push(id);
        }

        let Children { left, right } = expand(&node, cache, min_width);
        for child in [left, right].into_iter().flatten() {
            self.grow(child, Some(id), world, cache, min_width);
        }
        id
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.nodes.first()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn leaves(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.is_leaf().then_some(i))
    }

    /// Deepest level present, `0` for an empty or trunk-only tree.
    pub fn depth(&self) -> u32 {
        self.nodes
            .iter()
            .map(|n| n.triangle.level)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    const EPS: f64 = 1e-9;

    fn scenario_root() -> TriangleNode {
        TriangleNode::trunk(80.0, DVec2::ZERO, 0.5, 0.0, 2)
    }

    fn close(a: DVec2, b: DVec2) -> bool {
        (a - b).length() < 1e-6
    }

    #[test]
    fn scenario_two_levels() {
        let mut cache = GeometryCache::new();
        let root = scenario_root();

        let children = expand(&root, &mut cache, 1.0);
        let left = children.left.expect("left child");
        let right = children.right.expect("right child");

        let w = (40.0f64 * 40.0 + 40.0 * 40.0).sqrt();
        assert_eq!(left.level, 1);
        assert_eq!(right.level, 1);
        assert!((left.width - w).abs() < EPS);
        assert!((right.width - w).abs() < EPS);
        assert_eq!(left.direction, Some(Direction::Left));
        assert_eq!(right.direction, Some(Direction::Right));

        let grandchildren = expand(&left, &mut cache, 1.0);
        assert_eq!(grandchildren.left, None);
        assert_eq!(grandchildren.right, None);

        let tree = Tree::generate(root, &mut cache, 1.0);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.nodes[0].children, vec![1, 2]);
        assert_eq!(tree.depth(), 1);
    }

    #[test]
    fn child_positions_follow_widths() {
        let root = TriangleNode::trunk(100.0, DVec2::new(5.0, 5.0), 0.3, 0.2, 5);
        let g = Geometry::compute(100.0, 0.3, 0.2);

        let left = root.child(Direction::Left, g.next_left, 1.0).unwrap();
        let right = root.child(Direction::Right, g.next_right, 1.0).unwrap();

        assert_eq!(left.pos, DVec2::new(0.0, -g.next_left));
        assert_eq!(right.pos, DVec2::new(100.0 - g.next_right, -g.next_right));
        assert_eq!(left.height_factor, 0.3);
        assert_eq!(right.lean, 0.2);
        assert_eq!(right.max_level, 5);
    }

    #[test]
    fn zero_max_level_is_trunk_only() {
        let mut cache = GeometryCache::new();
        let root = TriangleNode::trunk(80.0, DVec2::ZERO, 0.5, 0.0, 0);

        let tree = Tree::generate(root, &mut cache, 1.0);

        assert_eq!(tree.len(), 1);
        assert!(tree.nodes[0].is_leaf());
        assert_eq!(tree.nodes[0].triangle.direction, None);
    }

    #[test]
    fn flat_trunk_still_expands() {
        let mut cache = GeometryCache::new();
        let root = TriangleNode::trunk(80.0, DVec2::ZERO, 0.0, 0.25, 3);

        let children = expand(&root, &mut cache, 1.0);

        assert!((children.left.unwrap().width - 20.0).abs() < EPS);
        assert!((children.right.unwrap().width - 60.0).abs() < EPS);
    }

    #[test]
    fn non_finite_width_stops_branch() {
        let root = TriangleNode::trunk(80.0, DVec2::ZERO, 0.5, 0.0, 5);

        assert_eq!(root.child(Direction::Left, f64::NAN, 1.0), None);
        assert_eq!(root.child(Direction::Right, f64::INFINITY, 1.0), None);
        assert_eq!(root.child(Direction::Right, -3.0, 1.0), None);
        assert_eq!(root.child(Direction::Right, 0.99, 1.0), None);
        assert!(root.child(Direction::Right, 1.0, 1.0).is_some());
    }

    #[test]
    fn depth_bound_and_leaf_rule_hold() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..40 {
            let hf = rng.random_range(0.0..0.8);
            let lean = rng.random_range(-0.45..0.45);
            let max_level = rng.random_range(0..9);
            let mut cache = GeometryCache::new();
            let root = TriangleNode::trunk(80.0, DVec2::ZERO, hf, lean, max_level);

            let tree = Tree::generate(root, &mut cache, 1.0);

            for node in &tree.nodes {
                assert!(node.triangle.level <= max_level);
                if node.parent.is_some() {
                    assert!(node.triangle.level < max_level);
                }
            }
            for id in tree.leaves() {
                let t = tree.nodes[id].triangle;
                let g = Geometry::compute(t.width, t.height_factor, t.lean);
                assert!(
                    t.level + 1 >= max_level || (g.next_left < 1.0 && g.next_right < 1.0),
                    "leaf {id} at level {} could have grown",
                    t.level
                );
            }
        }
    }

    #[test]
    fn generation_is_deterministic() {
        let root = TriangleNode::trunk(80.0, DVec2::new(600.0, 520.0), 0.37, -0.12, 9);

        let a = Tree::generate(root, &mut GeometryCache::new(), 1.0);
        let mut shared = GeometryCache::new();
        let b = Tree::generate(root, &mut shared, 1.0);
        let c = Tree::generate(root, &mut shared, 1.0);

        assert_eq!(a, b);
        assert_eq!(b, c);
        assert!(shared.hits() > 0);
    }

    #[test]
    fn children_meet_at_parent_apex() {
        let mut cache = GeometryCache::new();
        let root = TriangleNode::trunk(80.0, DVec2::new(600.0, 520.0), 0.4, 0.15, 2);
        let tree = Tree::generate(root, &mut cache, 1.0);

        let trunk = &tree.nodes[0];
        let apex = trunk.apex_triangle()[1];
        let left = &tree.nodes[trunk.children[0]];
        let right = &tree.nodes[trunk.children[1]];

        // Left child's bottom-right and right child's bottom-left corners.
        assert!(close(left.outline()[2], apex));
        assert!(close(right.outline()[3], apex));
        // Their outer bottom corners sit on the trunk's top corners.
        assert!(close(left.outline()[3], trunk.outline()[0]));
        assert!(close(right.outline()[2], trunk.outline()[1]));
    }

    #[test]
    fn trunk_transform_is_translation_only() {
        let root = TriangleNode::trunk(80.0, DVec2::new(600.0, 520.0), 0.5, 0.0, 1);
        let g = Geometry::compute(80.0, 0.5, 0.0);

        assert_eq!(root.rotation(&g), None);
        assert_eq!(root.transform_attr(&g), "translate(600 520)");

        let left = root.child(Direction::Left, g.next_left, 1.0);
        assert_eq!(left, None, "max level 1 allows no children");
    }

    #[test]
    fn child_transform_attr_includes_rotation() {
        let root = TriangleNode::trunk(80.0, DVec2::ZERO, 0.0, 0.0, 3);
        let g = Geometry::compute(80.0, 0.0, 0.0);
        let left = root.child(Direction::Left, g.next_left, 1.0).unwrap();
        let own = Geometry::compute(left.width, 0.0, 0.0);

        let attr = left.transform_attr(&own);
        assert!(attr.starts_with("translate(0 -40) rotate("), "got {attr}");
        assert!(attr.ends_with(" 0 40)"), "got {attr}");
    }

    #[test]
    fn lean_at_edge_prunes_collapsed_side() {
        let mut cache = GeometryCache::new();
        let root = TriangleNode::trunk(80.0, DVec2::ZERO, 0.0, 0.5, 4);

        let tree = Tree::generate(root, &mut cache, 1.0);

        assert_eq!(tree.len(), 4);
        assert!(
            tree.nodes
                .iter()
                .skip(1)
                .all(|n| n.triangle.direction == Some(Direction::Right))
        );
        assert!(tree.nodes.iter().all(TreeNode::is_drawable));
    }

    #[test]
    fn non_finite_origin_is_not_drawable() {
        let mut cache = GeometryCache::new();
        let root = TriangleNode::trunk(80.0, DVec2::new(f64::NAN, 0.0), 0.5, 0.0, 3);

        let tree = Tree::generate(root, &mut cache, 1.0);

        assert_eq!(tree.len(), 7);
        assert!(tree.nodes.iter().all(|n| !n.is_drawable()));
    }
}
