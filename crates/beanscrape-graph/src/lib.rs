//! Flavor co-occurrence graph for the Jelly Belly catalogue.
//!
//! Reads the CSVs written by `beanscrape-fetch`: `beans.csv` supplies the
//! known flavors and their colors, `combinations.csv` the flavor blends.
//! Every pair of known flavors that appears in the same combination becomes
//! an edge. The graph is laid out and rendered to SVG.

pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod lookup;
pub mod render;
pub mod tags;

use std::path::PathBuf;

use tracing::{debug, instrument};

pub use config::{GraphConfig, DEFAULT_COLOR};
pub use error::{GraphError, GraphResult};
pub use graph::{
    build_from_reader, build_from_rows, build_graph, BuildOutcome, CombinationRow, ComboEdge,
    FlavorGraph, FlavorNode, GraphBuilder,
};
pub use layout::{force_layout, Layout, LayoutParams, PlacedNode};
pub use lookup::BeanLookup;
pub use render::{render_svg, write_svg};
pub use tags::{
    flavor_tokens, JsonArrayParser, LiteralListParser, TagFormat, TagParseError, TagParser,
};

/// What a full graph run produced
#[derive(Debug, Clone)]
pub struct GraphReport {
    /// Beans in the lookup
    pub beans: usize,
    /// Flavors in the graph
    pub nodes: usize,
    /// Flavor pairs in the graph
    pub edges: usize,
    /// Combination rows skipped
    pub rows_skipped: usize,
    /// Rendered SVG
    pub svg_path: PathBuf,
}

/// Load the lookup, build the graph, lay it out and render it
#[instrument(skip(config), fields(data_dir = %config.data_dir.display()))]
pub fn run(config: &GraphConfig) -> GraphResult<GraphReport> {
    let lookup = BeanLookup::load(&config.beans_path(), &config.default_color)?;
    for flavor in lookup.flavors() {
        debug!("{}", flavor);
    }

    let parser = config.tag_format.parser();
    let outcome = build_graph(&config.combinations_path(), &lookup, parser.as_ref())?;

    let params = LayoutParams {
        iterations: config.layout_iterations,
        ..LayoutParams::default()
    };
    let layout = force_layout(&outcome.graph, &params);

    let svg_path = config.svg_path();
    write_svg(&svg_path, &render_svg(&layout, &config.title))?;

    Ok(GraphReport {
        beans: lookup.len(),
        nodes: outcome.graph.node_count(),
        edges: outcome.graph.edge_count(),
        rows_skipped: outcome.rows_skipped,
        svg_path,
    })
}
