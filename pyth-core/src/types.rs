/// Identifier for a node in a [`crate::tree::Tree`].
///
/// This is an index into `Tree::nodes`, and is only meaningful within
/// the lifetime of a given `Tree` instance.
pub type NodeId = usize;

/// Which child slot a node occupies under its parent.
///
/// The trunk has no slot, so nodes store an `Option<Direction>` and only
/// the root carries `None`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

