//! Graph export for dependency visualization.
//!
//! Turns a container's entries and dependency edges into a [`GraphExport`]
//! and renders it as JSON, YAML, Graphviz DOT or Mermaid. JSON and YAML need
//! the `graph-export` feature; DOT and Mermaid are always available.

use std::collections::HashMap;

#[cfg(feature = "graph-export")]
use serde::Serialize;

use crate::container::Container;
use crate::descriptors::EntryDescriptor;
use crate::error::{DiError, DiResult};
use crate::graph::Node;
use crate::lifecycle::{Kind, Relation, ServiceState};

/// Version stamped into every export.
pub const EXPORT_VERSION: &str = "1.0";

const ROOT_ID: &str = "root";

/// One node: a stored entry, a referenced-but-missing address, or the root.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "graph-export", derive(Serialize))]
pub struct GraphNode {
    /// Identifier safe for DOT and Mermaid
    pub id: String,
    /// Dependency address, `ROOT` for the root node
    pub label: String,
    /// `None` when nothing is stored at the address
    pub kind: Option<Kind>,
    pub relation: Option<Relation>,
    pub service: Option<ServiceState>,
    /// Value type name or constructor signature
    pub type_name: Option<String>,
}

impl GraphNode {
    /// Whether the address is referenced but unregistered.
    pub fn is_missing(&self) -> bool {
        self.kind.is_none() && self.label != Node::Root.to_string()
    }
}

/// A "must exist before" edge between two node ids.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "graph-export", derive(Serialize))]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

/// Counts and provenance of an export.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "graph-export", derive(Serialize))]
pub struct GraphMetadata {
    /// Name of the exported container
    pub container: String,
    pub entry_count: usize,
    pub edge_count: usize,
    pub service_count: usize,
    pub constructor_count: usize,
    pub has_cycle: bool,
    /// RFC 3339 timestamp with `graph-export`, empty otherwise
    pub exported_at: String,
    pub version: String,
}

/// Serializable snapshot of a container's dependency graph.
///
/// `order` holds the start order of every address, empty when the graph has
/// a cycle.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "graph-export", derive(Serialize))]
pub struct GraphExport {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub order: Vec<String>,
    pub metadata: GraphMetadata,
}

/// Output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
    /// Graphviz
    Dot,
    Mermaid,
}

impl GraphExport {
    /// Snapshots `container`. Works whether or not it is running.
    pub fn from_container(container: &Container) -> DiResult<Self> {
        let descriptors = container.descriptors();
        let graph = container.graph()?;

        let by_address: HashMap<String, &EntryDescriptor> = descriptors
            .iter()
            .map(|d| (d.address.to_string(), d))
            .collect();

        let mut ids: HashMap<String, String> = HashMap::new();
        let mut nodes = Vec::new();
        for node in graph.nodes() {
            let label = node.to_string();
            let id = match node {
                Node::Root => ROOT_ID.to_string(),
                Node::Key(_) => format!("n{}", nodes.len()),
            };
            let entry = node.address().and_then(|a| by_address.get(a.as_str()));
            nodes.push(GraphNode {
                id: id.clone(),
                label: label.clone(),
                kind: entry.map(|d| d.kind),
                relation: entry.map(|d| d.relation),
                service: entry.map(|d| d.service),
                type_name: entry.map(|d| d.type_name.clone()),
            });
            ids.insert(label, id);
        }

        let edges = graph
            .edges()
            .filter_map(|(from, to)| {
                Some(GraphEdge {
                    from: ids.get(&from.to_string())?.clone(),
                    to: ids.get(&to.to_string())?.clone(),
                })
            })
            .collect();

        let (order, has_cycle) = match graph.order() {
            Ok(order) => (order.iter().map(ToString::to_string).collect(), false),
            Err(DiError::Cycle { .. }) => (Vec::new(), true),
            Err(err) => return Err(err),
        };

        let metadata = GraphMetadata {
            container: container.config().name.clone(),
            entry_count: descriptors.len(),
            edge_count: graph.edge_count(),
            service_count: descriptors.iter().filter(|d| d.is_service()).count(),
            constructor_count: descriptors.iter().filter(|d| d.is_constructor()).count(),
            has_cycle,
            exported_at: exported_at(),
            version: EXPORT_VERSION.to_string(),
        };

        Ok(Self {
            nodes,
            edges,
            order,
            metadata,
        })
    }

    pub fn render(&self, format: ExportFormat) -> DiResult<String> {
        DefaultGraphExporter.export(self, format)
    }
}

#[cfg(feature = "graph-export")]
fn exported_at() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(not(feature = "graph-export"))]
fn exported_at() -> String {
    String::new()
}

/// Renders a [`GraphExport`] into a textual format.
pub trait GraphExporter: Send + Sync {
    fn export(&self, graph: &GraphExport, format: ExportFormat) -> DiResult<String>;
}

/// Exporter for the built-in formats.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultGraphExporter;

impl GraphExporter for DefaultGraphExporter {
    fn export(&self, graph: &GraphExport, format: ExportFormat) -> DiResult<String> {
        match format {
            ExportFormat::Json => self.export_json(graph),
            ExportFormat::Yaml => self.export_yaml(graph),
            ExportFormat::Dot => Ok(self.export_dot(graph)),
            ExportFormat::Mermaid => Ok(self.export_mermaid(graph)),
        }
    }
}

impl DefaultGraphExporter {
    #[cfg(feature = "graph-export")]
    fn export_json(&self, graph: &GraphExport) -> DiResult<String> {
        serde_json::to_string_pretty(graph).map_err(|err| DiError::Export(err.to_string()))
    }

    #[cfg(not(feature = "graph-export"))]
    fn export_json(&self, _graph: &GraphExport) -> DiResult<String> {
        Err(DiError::Export(
            "JSON export requires the graph-export feature".to_string(),
        ))
    }

    #[cfg(feature = "graph-export")]
    fn export_yaml(&self, graph: &GraphExport) -> DiResult<String> {
        serde_yaml::to_string(graph).map_err(|err| DiError::Export(err.to_string()))
    }

    #[cfg(not(feature = "graph-export"))]
    fn export_yaml(&self, _graph: &GraphExport) -> DiResult<String> {
        Err(DiError::Export(
            "YAML export requires the graph-export feature".to_string(),
        ))
    }

    fn export_dot(&self, graph: &GraphExport) -> String {
        let mut output = String::from("digraph dependencies {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [fontname=\"Helvetica\"];\n\n");

        for node in &graph.nodes {
            let shape = match node.kind {
                Some(Kind::Callable) => "box",
                Some(Kind::Composite) => "component",
                Some(Kind::Other) => "ellipse",
                None if node.id == ROOT_ID => "point",
                None => "ellipse",
            };
            let color = match (node.service, node.kind) {
                (Some(ServiceState::RunningUp), _) => "palegreen",
                (Some(ServiceState::PendingUp), _) => "lightyellow",
                (_, None) if node.id != ROOT_ID => "mistyrose",
                _ => "white",
            };
            output.push_str(&format!(
                "  \"{}\" [label=\"{}\", shape={}, fillcolor={}, style=filled];\n",
                node.id,
                escape(&node.label),
                shape,
                color
            ));
        }

        output.push('\n');
        for edge in &graph.edges {
            output.push_str(&format!("  \"{}\" -> \"{}\";\n", edge.from, edge.to));
        }
        output.push_str("}\n");
        output
    }

    fn export_mermaid(&self, graph: &GraphExport) -> String {
        let mut output = String::from("graph TD\n");

        for node in &graph.nodes {
            let label = escape(&node.label);
            let line = match node.kind {
                Some(Kind::Callable) => format!("  {}[\"{}\"]\n", node.id, label),
                Some(Kind::Composite) => format!("  {}[[\"{}\"]]\n", node.id, label),
                _ if node.id == ROOT_ID => format!("  {}((\"{}\"))\n", node.id, label),
                _ => format!("  {}(\"{}\")\n", node.id, label),
            };
            output.push_str(&line);
        }

        for edge in &graph.edges {
            output.push_str(&format!("  {} --> {}\n", edge.from, edge.to));
        }

        output.push_str("\n  classDef service fill:#e8f5e8\n");
        output.push_str("  classDef missing fill:#ffe4e1\n");
        for node in &graph.nodes {
            if node.service.is_some_and(|s| s != ServiceState::NotAService) {
                output.push_str(&format!("  class {} service\n", node.id));
            } else if node.is_missing() {
                output.push_str(&format!("  class {} missing\n", node.id));
            }
        }
        output
    }
}

fn escape(label: &str) -> String {
    label.replace('"', "\\\"")
}

impl Container {
    /// Renders the current dependency graph.
    ///
    /// ```
    /// use bootkit::{constructor, value, Container, ExportFormat};
    /// use std::sync::Arc;
    ///
    /// struct Settings;
    /// struct Repository;
    /// bootkit::injectable!(Settings, Repository);
    ///
    /// let container = Container::new();
    /// container
    ///     .register([value(Settings), constructor(|_: Arc<Settings>| Repository)])
    ///     .unwrap();
    ///
    /// let dot = container.export_graph(ExportFormat::Dot).unwrap();
    /// assert!(dot.starts_with("digraph dependencies"));
    /// assert!(dot.contains("Repository"));
    /// ```
    pub fn export_graph(&self, format: ExportFormat) -> DiResult<String> {
        GraphExport::from_container(self)?.render(format)
    }
}
