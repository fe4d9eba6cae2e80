//! Dependency graph over addresses, plus the synthetic root node.
//!
//! Edges read "must exist before": a constructor's parameters point at the
//! constructor, the constructor points at each of its outputs, and plain
//! values hang off [`Node::Root`].

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use crate::error::{DiError, DiResult};
use crate::key::{derive_address, Address, TypeDescriptor};
use crate::lifecycle::Kind;
use crate::storage::{ObjectStorage, Payload};

/// A graph node: the synthetic root or a dependency address.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Node {
    /// No further prerequisites
    Root,
    /// A dependency slot
    Key(Address),
}

impl Node {
    pub fn address(&self) -> Option<&Address> {
        match self {
            Node::Root => None,
            Node::Key(address) => Some(address),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Root => f.write_str("ROOT"),
            Node::Key(address) => fmt::Display::fmt(address, f),
        }
    }
}

/// Directed dependency graph built from the current storage contents.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    adjacency: BTreeMap<Node, BTreeSet<Node>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `from -> to`, creating both nodes.
    pub fn add_edge(&mut self, from: Node, to: Node) {
        self.adjacency.entry(to.clone()).or_default();
        self.adjacency.entry(from).or_default().insert(to);
    }

    /// Emits the edges for every stored entry.
    pub(crate) fn build(storage: &ObjectStorage) -> DiResult<Self> {
        let mut graph = Self::new();
        storage.each(|entry| {
            let node = Node::Key(entry.address.clone());
            match (&entry.kind, &entry.payload) {
                (Kind::Callable, Payload::Constructor(handle)) => {
                    if handle.params().is_empty() {
                        graph.add_edge(Node::Root, node.clone());
                    }
                    for param in handle.params() {
                        graph.add_edge(key_of(param), node.clone());
                    }
                    for output in handle.outputs() {
                        graph.add_edge(node.clone(), key_of(output));
                    }
                }
                (Kind::Composite, Payload::Template(handle)) => {
                    if handle.fields().is_empty() {
                        graph.add_edge(Node::Root, node);
                    } else {
                        for field in handle.fields() {
                            graph.add_edge(key_of(field.descriptor()), node.clone());
                        }
                    }
                }
                _ => graph.add_edge(Node::Root, node),
            }
            Ok(())
        })?;
        Ok(graph)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.adjacency.keys()
    }

    pub fn edges(&self) -> impl Iterator<Item = (&Node, &Node)> {
        self.adjacency
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (from, to)))
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeSet::len).sum()
    }

    /// Topological order of the addresses, root excluded.
    ///
    /// Fails with [`DiError::Cycle`] naming the cycle when one exists.
    ///
    /// ```
    /// use bootkit::{Address, DependencyGraph, Node};
    ///
    /// let mut graph = DependencyGraph::new();
    /// let a = Node::Key(Address::new("app.A"));
    /// let b = Node::Key(Address::new("app.B"));
    /// graph.add_edge(Node::Root, a.clone());
    /// graph.add_edge(a, b);
    ///
    /// let order = graph.order().unwrap();
    /// assert_eq!(order, vec![Address::new("app.A"), Address::new("app.B")]);
    /// ```
    pub fn order(&self) -> DiResult<Vec<Address>> {
        if let Some(path) = self.find_cycle() {
            return Err(DiError::Cycle { path });
        }

        let mut indeg: BTreeMap<&Node, usize> = self.adjacency.keys().map(|n| (n, 0)).collect();
        for targets in self.adjacency.values() {
            for target in targets {
                if let Some(degree) = indeg.get_mut(target) {
                    *degree += 1;
                }
            }
        }

        let mut queue: VecDeque<&Node> = indeg
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(node, _)| *node)
            .collect();

        let mut order = Vec::with_capacity(self.adjacency.len());
        while let Some(node) = queue.pop_front() {
            order.push(node);
            for target in self.adjacency.get(node).into_iter().flatten() {
                if let Some(degree) = indeg.get_mut(target) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(target);
                    }
                }
            }
        }

        if order.len() != self.adjacency.len() {
            return Err(DiError::GraphCalculation(format!(
                "ordered {} of {} nodes",
                order.len(),
                self.adjacency.len()
            )));
        }

        Ok(order
            .into_iter()
            .filter_map(|node| node.address().cloned())
            .collect())
    }

    /// DFS with path tracking; returns the closed cycle path if one exists.
    fn find_cycle(&self) -> Option<Vec<String>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        fn dfs<'a>(
            node: &'a Node,
            adjacency: &'a BTreeMap<Node, BTreeSet<Node>>,
            colors: &mut BTreeMap<&'a Node, Color>,
            path: &mut Vec<&'a Node>,
        ) -> Option<Vec<String>> {
            colors.insert(node, Color::Gray);
            path.push(node);

            for next in adjacency.get(node).into_iter().flatten() {
                match colors.get(next).copied().unwrap_or(Color::White) {
                    Color::Gray => {
                        if let Some(start) = path.iter().position(|n| *n == next) {
                            let mut cycle: Vec<String> =
                                path[start..].iter().map(|n| n.to_string()).collect();
                            cycle.push(next.to_string());
                            return Some(cycle);
                        }
                    }
                    Color::White => {
                        if let Some(cycle) = dfs(next, adjacency, colors, path) {
                            return Some(cycle);
                        }
                    }
                    Color::Black => {}
                }
            }

            path.pop();
            colors.insert(node, Color::Black);
            None
        }

        let mut colors = BTreeMap::new();
        let mut path = Vec::new();
        for node in self.adjacency.keys() {
            if colors.get(node).copied().unwrap_or(Color::White) == Color::White {
                if let Some(cycle) = dfs(node, &self.adjacency, &mut colors, &mut path) {
                    return Some(cycle);
                }
            }
        }
        None
    }
}

fn key_of(descriptor: &TypeDescriptor) -> Node {
    Node::Key(derive_address(descriptor, None).0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{constructor, template, value};
    use crate::provider::{field, Composite, Field, FieldValues};
    use crate::traits::Injectable;
    use std::sync::Arc;

    struct A;
    struct B;
    struct C;
    crate::injectable!(A, B, C);

    struct Pair {
        _a: Arc<A>,
        _b: Arc<B>,
    }
    impl Injectable for Pair {}
    impl Composite for Pair {
        fn fields() -> Vec<Field> {
            vec![field::<A>("a"), field::<B>("b")]
        }
        fn assemble(values: &mut FieldValues) -> DiResult<Self> {
            Ok(Pair {
                _a: values.take("a")?,
                _b: values.take("b")?,
            })
        }
    }

    fn position(order: &[Address], suffix: &str) -> usize {
        order
            .iter()
            .position(|a| a.as_str().ends_with(suffix))
            .unwrap_or_else(|| panic!("{} missing from {:?}", suffix, order))
    }

    #[test]
    fn constructor_edges_follow_params_and_outputs() {
        let storage = ObjectStorage::new();
        storage.add(value(A)).unwrap();
        let ctor = storage.add(constructor(|_: Arc<A>| B)).unwrap().unwrap();
        storage.add(template::<Pair>()).unwrap();

        let graph = DependencyGraph::build(&storage).unwrap();
        let order = graph.order().unwrap();

        let ctor_at = order.iter().position(|a| *a == ctor).unwrap();
        assert!(position(&order, ".A") < ctor_at);
        assert!(ctor_at < position(&order, ".B"));
        assert!(position(&order, ".B") < position(&order, ".Pair"));
        assert!(graph.nodes().any(|n| *n == Node::Root));
    }

    #[test]
    fn zero_argument_constructors_hang_off_root() {
        let storage = ObjectStorage::new();
        let ctor = storage.add(constructor(|| C)).unwrap().unwrap();
        let graph = DependencyGraph::build(&storage).unwrap();
        assert!(graph
            .edges()
            .any(|(from, to)| *from == Node::Root && *to == Node::Key(ctor.clone())));
    }

    #[test]
    fn cycles_are_reported_with_their_path() {
        let storage = ObjectStorage::new();
        storage.add(constructor(|_: Arc<A>| B)).unwrap();
        storage.add(constructor(|_: Arc<B>| A)).unwrap();

        let graph = DependencyGraph::build(&storage).unwrap();
        match graph.order() {
            Err(DiError::Cycle { path }) => {
                assert_eq!(path.first(), path.last());
                assert!(path.len() >= 5);
            }
            other => panic!("expected a cycle, got {:?}", other),
        }
    }

    #[test]
    fn unregistered_parameters_still_get_ordered() {
        let storage = ObjectStorage::new();
        storage.add(constructor(|_: Arc<C>| B)).unwrap();
        let order = DependencyGraph::build(&storage).unwrap().order().unwrap();
        assert!(position(&order, ".C") < position(&order, ".B"));
    }
}
