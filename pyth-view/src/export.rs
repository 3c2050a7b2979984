//! SVG export of a generated tree.
//!
//! Each node becomes a `<g>` carrying its own `translate(..) rotate(..)`
//! transform with the node's square inside it, and children nested in
//! their parent's group, so the SVG renderer composes the transforms.

use std::path::Path;

use anyhow::{Context, Result};
use pyth_core::{config::Config, palette, tree::Tree, types::NodeId};
use svg::Document;
use svg::node::element::{Group, Rectangle};

fn hex([r, g, b, _]: [u8; 4]) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

fn node_group(tree: &Tree, id: NodeId) -> Group {
    let node = &tree.nodes[id];
    let t = &node.triangle;

    let square = Rectangle::new()
        .set("x", 0)
        .set("y", 0)
        .set("width", t.width)
        .set("height", t.width)
        .set("fill", hex(palette::level_fill(t.level, t.max_level)));

    let mut group = Group::new()
        .set("transform", t.transform_attr(&node.geometry))
        .add(square);

    for &child in &node.children {
        if tree.nodes[child].is_drawable() {
            group = group.add(node_group(tree, child));
        }
    }
    group
}

/// Builds an SVG document of the whole tree on a surface-sized canvas.
pub fn render(tree: &Tree, cfg: &Config) -> Document {
    let (w, h) = (cfg.surface.x, cfg.surface.y);
    let mut doc = Document::new()
        .set("viewBox", format!("0 0 {w} {h}"))
        .set("width", w)
        .set("height", h);

    if let Some(root) = tree.root()
        && root.is_drawable()
    {
        doc = doc.add(node_group(tree, 0));
    }
    doc
}

/// Renders `tree` and writes it to `path`.
pub fn save(tree: &Tree, cfg: &Config, path: &Path) -> Result<()> {
    let doc = render(tree, cfg);
    svg::save(path, &doc).with_context(|| format!("failed to write SVG to {}", path.display()))?;
    log::info!("exported {} nodes to {}", tree.len(), path.display());
    Ok(())
}
