//! Flavor co-occurrence graph and its construction from combinations.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{GraphError, GraphResult};
use crate::lookup::BeanLookup;
use crate::tags::{flavor_tokens, TagParser};

const REQUIRED_COLUMNS: [&str; 3] = ["combinationId", "name", "tag"];

/// A flavor in the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlavorNode {
    /// Lowercased flavor name
    pub name: String,
    /// Display color from the bean lookup
    pub color: String,
}

/// Co-occurrence of two flavors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComboEdge {
    /// Name of the most recent combination containing both flavors
    pub combo: String,
    /// Every combination that contributed this pair, in row order
    pub contributors: Vec<String>,
}

/// One row of the combinations CSV
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CombinationRow {
    /// Combination identifier
    #[serde(rename = "combinationId")]
    pub combination_id: String,
    /// Display name
    pub name: String,
    /// Textual list of flavor tags
    pub tag: String,
}

impl CombinationRow {
    /// Create a new row
    pub fn new(id: impl Into<String>, name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            combination_id: id.into(),
            name: name.into(),
            tag: tag.into(),
        }
    }
}

/// Undirected flavor graph.
///
/// Nodes are unique by name and edges unique by unordered pair; there are no
/// self-loops.
#[derive(Debug, Clone, Default)]
pub struct FlavorGraph {
    inner: UnGraph<FlavorNode, ComboEdge>,
    index: HashMap<String, NodeIndex>,
}

impl FlavorGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of flavors
    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    /// Number of flavor pairs
    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    /// Whether `name` is a node
    pub fn contains_node(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Node for `name`, if present
    pub fn node(&self, name: &str) -> Option<&FlavorNode> {
        self.index.get(name).map(|&idx| &self.inner[idx])
    }

    /// Add `name` unless it is already present; an existing node keeps its color
    pub fn ensure_node(&mut self, name: &str, color: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.inner.add_node(FlavorNode {
            name: name.to_string(),
            color: color.to_string(),
        });
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Record that `a` and `b` appeared together in `combo`.
    ///
    /// Both nodes must exist. Returns `false` for a self-pair, which is never
    /// stored.
    pub fn connect(&mut self, a: NodeIndex, b: NodeIndex, combo: &str) -> bool {
        if a == b {
            return false;
        }
        match self.inner.find_edge(a, b) {
            Some(edge) => {
                let weight = &mut self.inner[edge];
                weight.combo = combo.to_string();
                weight.contributors.push(combo.to_string());
            }
            None => {
                self.inner.add_edge(
                    a,
                    b,
                    ComboEdge {
                        combo: combo.to_string(),
                        contributors: vec![combo.to_string()],
                    },
                );
            }
        }
        true
    }

    /// Edge between two flavors, in either order
    pub fn edge(&self, a: &str, b: &str) -> Option<&ComboEdge> {
        let (&a, &b) = (self.index.get(a)?, self.index.get(b)?);
        self.inner.find_edge(a, b).map(|edge| &self.inner[edge])
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &FlavorNode> {
        self.inner.node_weights()
    }

    /// Edges in insertion order as `(node position, node position, edge)`.
    ///
    /// Positions index into [`FlavorGraph::nodes`].
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, &ComboEdge)> {
        self.inner
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), e.weight()))
    }

    /// Neighbors of `name`, sorted
    pub fn neighbors(&self, name: &str) -> Vec<&str> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<_> = self
            .inner
            .neighbors(idx)
            .map(|n| self.inner[n].name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

/// Incrementally turns combination rows into a [`FlavorGraph`]
pub struct GraphBuilder<'a> {
    lookup: &'a BeanLookup,
    parser: &'a dyn TagParser,
    graph: FlavorGraph,
    rows_read: usize,
    rows_skipped: usize,
}

/// Built graph plus row accounting
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// The graph
    pub graph: FlavorGraph,
    /// Rows seen, including skipped ones
    pub rows_read: usize,
    /// Rows whose tags or CSV record could not be parsed
    pub rows_skipped: usize,
}

impl<'a> GraphBuilder<'a> {
    /// Create a builder restricted to the flavors in `lookup`
    pub fn new(lookup: &'a BeanLookup, parser: &'a dyn TagParser) -> Self {
        Self {
            lookup,
            parser,
            graph: FlavorGraph::new(),
            rows_read: 0,
            rows_skipped: 0,
        }
    }

    /// Add one combination. Returns `false` if its tags could not be parsed.
    pub fn add_row(&mut self, row: &CombinationRow) -> bool {
        self.rows_read += 1;

        let flavors = match flavor_tokens(self.parser, &row.tag) {
            Ok(flavors) => flavors,
            Err(e) => {
                warn!(
                    "Could not parse tags for combo {}: {} ({})",
                    row.combination_id, row.tag, e
                );
                self.rows_skipped += 1;
                return false;
            }
        };

        for i in 0..flavors.len() {
            for j in (i + 1)..flavors.len() {
                let (a, b) = (&flavors[i], &flavors[j]);
                let (Some(color_a), Some(color_b)) = (self.lookup.color(a), self.lookup.color(b))
                else {
                    continue;
                };

                let idx_a = self.graph.ensure_node(a, color_a);
                let idx_b = self.graph.ensure_node(b, color_b);
                if self.graph.connect(idx_a, idx_b, &row.name) {
                    debug!(combo = %row.name, "{} -- {}", a, b);
                }
            }
        }

        true
    }

    /// Count a row that never reached tag parsing
    pub fn skip_row(&mut self) {
        self.rows_read += 1;
        self.rows_skipped += 1;
    }

    /// Finish building
    pub fn finish(self) -> BuildOutcome {
        BuildOutcome {
            graph: self.graph,
            rows_read: self.rows_read,
            rows_skipped: self.rows_skipped,
        }
    }
}

/// Build a graph from in-memory rows
pub fn build_from_rows<'r, I>(
    rows: I,
    lookup: &BeanLookup,
    parser: &dyn TagParser,
) -> BuildOutcome
where
    I: IntoIterator<Item = &'r CombinationRow>,
{
    let mut builder = GraphBuilder::new(lookup, parser);
    for row in rows {
        builder.add_row(row);
    }
    builder.finish()
}

/// Build a graph from CSV data; `source` names the data in errors
pub fn build_from_reader<R: Read>(
    reader: R,
    source: &Path,
    lookup: &BeanLookup,
    parser: &dyn TagParser,
) -> GraphResult<BuildOutcome> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(GraphError::MissingColumn {
                file: source.to_path_buf(),
                column: column.to_string(),
            });
        }
    }

    let mut builder = GraphBuilder::new(lookup, parser);
    for (line, record) in reader.deserialize::<CombinationRow>().enumerate() {
        match record {
            Ok(row) => {
                builder.add_row(&row);
            }
            Err(e) => {
                warn!("Skipping malformed combination row {}: {}", line + 1, e);
                builder.skip_row();
            }
        }
    }

    Ok(builder.finish())
}

/// Build a graph from the combinations CSV at `path`
pub fn build_graph(
    path: &Path,
    lookup: &BeanLookup,
    parser: &dyn TagParser,
) -> GraphResult<BuildOutcome> {
    let file = File::open(path)?;
    let outcome = build_from_reader(file, path, lookup, parser)?;
    info!(
        "Graph built with {} flavors and {} edges.",
        outcome.graph.node_count(),
        outcome.graph.edge_count()
    );
    if outcome.rows_skipped > 0 {
        warn!(
            "Skipped {} of {} combination rows",
            outcome.rows_skipped, outcome.rows_read
        );
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{JsonArrayParser, LiteralListParser};
    use pretty_assertions::assert_eq;

    fn lookup() -> BeanLookup {
        [("choc", "#000"), ("mint", "#fff"), ("lime", "#0f0")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_last_writer_wins_on_repeated_pair() {
        let rows = [
            CombinationRow::new("1", "A", "['choc','mint']"),
            CombinationRow::new("2", "B", "['choc','mint']"),
        ];
        let outcome = build_from_rows(&rows, &lookup(), &LiteralListParser);
        let graph = outcome.graph;

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        let edge = graph.edge("mint", "choc").unwrap();
        assert_eq!(edge.combo, "B");
        assert_eq!(edge.contributors, vec!["A", "B"]);
    }

    #[test]
    fn test_malformed_row_is_skipped() {
        let rows = [
            CombinationRow::new("1", "Broken", "['choc', 'mint'"),
            CombinationRow::new("2", "Fresh", "['Mint', '+', 'Lime']"),
        ];
        let outcome = build_from_rows(&rows, &lookup(), &LiteralListParser);

        assert_eq!(outcome.rows_read, 2);
        assert_eq!(outcome.rows_skipped, 1);
        assert_eq!(outcome.graph.node_count(), 2);
        assert!(!outcome.graph.contains_node("choc"));
        assert_eq!(outcome.graph.edge("mint", "lime").unwrap().combo, "Fresh");
    }

    #[test]
    fn test_unknown_flavors_never_get_edges() {
        let rows = [CombinationRow::new("1", "Mystery", "['choc', 'durian', 'mint']")];
        let graph = build_from_rows(&rows, &lookup(), &LiteralListParser).graph;

        assert!(!graph.contains_node("durian"));
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.edge("choc", "durian").is_none());
    }

    #[test]
    fn test_repeated_token_adds_node_but_no_self_loop() {
        let rows = [CombinationRow::new("1", "Double", "['choc', 'choc']")];
        let graph = build_from_rows(&rows, &lookup(), &LiteralListParser).graph;

        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.edge("choc", "choc").is_none());
    }

    #[test]
    fn test_nodes_keep_lookup_color_and_insertion_order() {
        let rows = [
            CombinationRow::new("1", "X", "['lime', 'choc']"),
            CombinationRow::new("2", "Y", "['mint', 'choc', 'lime']"),
        ];
        let graph = build_from_rows(&rows, &lookup(), &LiteralListParser).graph;

        let nodes: Vec<_> = graph.nodes().map(|n| (n.name.as_str(), n.color.as_str())).collect();
        assert_eq!(nodes, vec![("lime", "#0f0"), ("choc", "#000"), ("mint", "#fff")]);
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.neighbors("choc"), vec!["lime", "mint"]);
    }

    #[test]
    fn test_parser_is_swappable() {
        let rows = [
            CombinationRow::new("1", "Json", r#"["choc","mint"]"#),
            CombinationRow::new("2", "Literal", "['choc','lime']"),
        ];
        let outcome = build_from_rows(&rows, &lookup(), &JsonArrayParser);

        assert_eq!(outcome.rows_skipped, 1);
        assert_eq!(outcome.graph.edge_count(), 1);
    }

    fn from_csv(csv: &str) -> GraphResult<BuildOutcome> {
        build_from_reader(
            csv.as_bytes(),
            Path::new("combinations.csv"),
            &lookup(),
            &LiteralListParser,
        )
    }

    #[test]
    fn test_csv_missing_tag_column() {
        let err = from_csv("combinationId,name\n1,A\n").unwrap_err();
        assert!(matches!(err, GraphError::MissingColumn { ref column, .. } if column == "tag"));
    }

    #[test]
    fn test_csv_rows_with_extra_columns() {
        let csv = "bookmark,combinationId,name,tag\n\
                   x,1,A,\"['Choc', '+', 'Mint']\"\n\
                   y,2,B,\"[\"\"lime\"\",\"\"mint\"\"]\"\n";
        let outcome = from_csv(csv).unwrap();

        assert_eq!(outcome.rows_read, 2);
        assert_eq!(outcome.rows_skipped, 0);
        assert_eq!(outcome.graph.edge_count(), 2);
    }

    #[test]
    fn test_csv_row_with_wrong_field_count_is_skipped() {
        let csv = "combinationId,name,tag\n\
                   1,A,\"['choc', 'mint']\"\n\
                   2,Short\n\
                   3,C,\"['mint', 'lime']\"\n";
        let outcome = from_csv(csv).unwrap();

        assert_eq!(outcome.rows_read, 3);
        assert_eq!(outcome.rows_skipped, 1);
        assert_eq!(outcome.graph.edge("choc", "mint").unwrap().combo, "A");
        assert_eq!(outcome.graph.edge("mint", "lime").unwrap().combo, "C");
        assert_eq!(outcome.graph.edge_count(), 2);
    }

    #[test]
    fn test_bean_and_tag_names_match_with_whitespace_kept() {
        let beans = "flavorName,backgroundColor\nVery Cherry ,#D2001C\nLemon,#FDFF00\n Lime,#0f0\n";
        let lookup = BeanLookup::from_reader(beans.as_bytes(), Path::new("beans.csv"), "#CCCCCC")
            .unwrap();
        let rows = [
            CombinationRow::new("1", "Cherry Lemon", "['Very Cherry ', '+', 'Lemon']"),
            CombinationRow::new("2", "Lemon Lime", "['Lemon', '+', 'Lime']"),
        ];
        let graph = build_from_rows(&rows, &lookup, &LiteralListParser).graph;

        assert_eq!(graph.edge("very cherry ", "lemon").unwrap().combo, "Cherry Lemon");
        assert!(!graph.contains_node("lime"));
        assert_eq!(graph.edge_count(), 1);
    }
}
