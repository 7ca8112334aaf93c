//! SVG rendering of a laid-out flavor graph

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::GraphResult;
use crate::layout::Layout;

/// Node circle radius
pub const NODE_RADIUS: f64 = 25.0;

const EDGE_COLOR: &str = "gray";
const BACKGROUND: &str = "white";

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Render `layout` as a standalone SVG document.
///
/// Edges are drawn first, then nodes filled with their color and outlined
/// in black, then a label on each node.
pub fn render_svg(layout: &Layout, title: &str) -> String {
    let (w, h) = (layout.width, layout.height);
    let mut s = String::new();

    s.push_str(&format!(
        "<svg width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\" \
         xmlns=\"http://www.w3.org/2000/svg\">\n",
        w, h, w, h
    ));
    s.push_str(&format!(
        "<rect width=\"100%\" height=\"100%\" fill=\"{}\"/>\n",
        BACKGROUND
    ));
    s.push_str(&format!(
        "<text x=\"{:.1}\" y=\"40\" text-anchor=\"middle\" \
         font-family=\"sans-serif\" font-size=\"24\">{}</text>\n",
        w / 2.0,
        xml_escape(title)
    ));

    s.push_str(&format!("<g stroke=\"{}\" stroke-width=\"1\">\n", EDGE_COLOR));
    for &(a, b) in &layout.edges {
        let (from, to) = (&layout.nodes[a], &layout.nodes[b]);
        s.push_str(&format!(
            "<line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\"/>\n",
            from.x, from.y, to.x, to.y
        ));
    }
    s.push_str("</g>\n");

    s.push_str("<g stroke=\"black\" stroke-width=\"1\">\n");
    for node in &layout.nodes {
        s.push_str(&format!(
            "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{}\" fill=\"{}\"><title>{}</title></circle>\n",
            node.x,
            node.y,
            NODE_RADIUS,
            xml_escape(&node.color),
            xml_escape(&node.name)
        ));
    }
    s.push_str("</g>\n");

    s.push_str(
        "<g font-family=\"sans-serif\" font-size=\"9\" text-anchor=\"middle\" \
         dominant-baseline=\"central\">\n",
    );
    for node in &layout.nodes {
        s.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\">{}</text>\n",
            node.x,
            node.y,
            xml_escape(&node.name)
        ));
    }
    s.push_str("</g>\n");

    s.push_str("</svg>\n");
    s
}

/// Write an SVG document to `path`, creating its directory if needed
pub fn write_svg(path: &Path, svg: &str) -> GraphResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, svg)?;
    info!("Rendered flavor graph → {}", path.display());
    Ok(())
}
