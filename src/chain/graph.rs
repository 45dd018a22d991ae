use std::collections::{HashMap, VecDeque};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Chain {
    #[default]
    Bitcoin,
    Ethereum,
}

impl Chain {
    pub const ALL: [Chain; 2] = [Chain::Bitcoin, Chain::Ethereum];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bitcoin => "bitcoin",
            Self::Ethereum => "ethereum",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Bitcoin => "Bitcoin",
            Self::Ethereum => "Ethereum",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Self::Bitcoin => "BTC",
            Self::Ethereum => "ETH",
        }
    }
}

/// Base type of a node as reported by the backend.
///
/// Focus and hover are never stored here; they are derived from interaction state
/// at draw time so the base type survives every interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Source,
    Target,
    Other(String),
}

impl NodeKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "source" => Self::Source,
            "target" => Self::Target,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
            Self::Other(raw) => raw,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_source(&self) -> bool {
        self.kind == NodeKind::Source
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Link {
    pub id: String,
    pub source: String,
    pub target: String,
    pub value: f64,
}

/// Normalized address network. Immutable once built; replaced wholesale.
#[derive(Clone, Debug, Default)]
pub struct NetworkGraph {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    index_by_id: HashMap<String, usize>,
}

impl NetworkGraph {
    /// Builds a graph from already-validated parts. Links must reference existing ids.
    pub(super) fn from_parts(nodes: Vec<Node>, links: Vec<Link>) -> Self {
        let index_by_id = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id.clone(), index))
            .collect();
        Self {
            nodes,
            links,
            index_by_id,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index(id).map(|index| &self.nodes[index])
    }

    pub fn source_index(&self) -> Option<usize> {
        self.nodes.iter().position(Node::is_source)
    }

    pub fn source(&self) -> Option<&Node> {
        self.source_index().map(|index| &self.nodes[index])
    }

    /// `(link index, source node, target node)` for every link whose endpoints resolve.
    pub fn indexed_link_endpoints(&self) -> Vec<(usize, usize, usize)> {
        self.links
            .iter()
            .enumerate()
            .filter_map(|(index, link)| {
                Some((
                    index,
                    self.node_index(&link.source)?,
                    self.node_index(&link.target)?,
                ))
            })
            .collect()
    }

    /// Link endpoints as node indices, in link order.
    pub fn link_endpoints(&self) -> Vec<(usize, usize)> {
        self.indexed_link_endpoints()
            .into_iter()
            .map(|(_, from, to)| (from, to))
            .collect()
    }

    /// Undirected adjacency in link order, without duplicates or self loops.
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut adjacency = vec![Vec::new(); self.nodes.len()];
        for (from, to) in self.link_endpoints() {
            if from == to {
                continue;
            }
            if !adjacency[from].contains(&to) {
                adjacency[from].push(to);
            }
            if !adjacency[to].contains(&from) {
                adjacency[to].push(from);
            }
        }
        adjacency
    }

    /// Hop count from `start` to every node over undirected links, plus the discovery order.
    pub fn bfs_levels(&self, start: usize) -> (Vec<Option<usize>>, Vec<usize>) {
        let mut levels = vec![None; self.nodes.len()];
        let mut order = Vec::with_capacity(self.nodes.len());
        if start >= self.nodes.len() {
            return (levels, order);
        }

        let adjacency = self.adjacency();
        let mut queue = VecDeque::from([start]);
        levels[start] = Some(0);

        while let Some(current) = queue.pop_front() {
            order.push(current);
            let next_level = levels[current].map_or(0, |level| level + 1);
            for &next in &adjacency[current] {
                if levels[next].is_none() {
                    levels[next] = Some(next_level);
                    queue.push_back(next);
                }
            }
        }

        (levels, order)
    }

    pub fn total_value(&self) -> f64 {
        self.links.iter().map(|link| link.value).sum()
    }
}
