use std::fmt;

use petgraph::{algo::tarjan_scc, graph::DiGraph, graph::NodeIndex};

/// A directed graph over the nodes `0..nnodes()`, stored as adjacency lists. Edges are kept in
/// insertion order and duplicates are allowed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    edges: Vec<Vec<usize>>,
}

impl Graph {
    /// Create a graph of `nnodes` nodes and no edges.
    pub fn new(nnodes: usize) -> Self {
        Graph {
            edges: vec![Vec::new(); nnodes],
        }
    }

    pub fn nnodes(&self) -> usize {
        self.edges.len()
    }

    /// How many edges does this graph have?
    pub fn nedges(&self) -> usize {
        self.edges.iter().map(|x| x.len()).sum()
    }

    /// Add a node with no edges, returning its index.
    pub fn add_node(&mut self) -> usize {
        self.edges.push(Vec::new());
        self.edges.len() - 1
    }

    /// Add an edge `from -> to`. Panics if either node doesn't exist.
    pub fn add_edge(&mut self, from: usize, to: usize) {
        assert!(to < self.nnodes());
        self.edges[from].push(to);
    }

    /// Return the successors of `node`. Panics if `node` doesn't exist.
    pub fn edges(&self, node: usize) -> &[usize] {
        &self.edges[node]
    }

    /// Return a graph with every edge of this graph reversed. The successors of each node in the
    /// result are in ascending order.
    pub fn transpose(&self) -> Graph {
        let mut g = Graph::new(self.nnodes());
        for (from, tos) in self.edges.iter().enumerate() {
            for &to in tos {
                g.add_edge(to, from);
            }
        }
        g
    }

    /// Return the strongly connected components of this graph in topological order: if there is
    /// an edge from a node in component `i` to a node in component `j` then `i <= j`.
    pub fn sccs(&self) -> Vec<Vec<usize>> {
        let mut g = DiGraph::<(), ()>::with_capacity(self.nnodes(), self.nedges());
        for _ in 0..self.nnodes() {
            g.add_node(());
        }
        for (from, tos) in self.edges.iter().enumerate() {
            for &to in tos {
                g.add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
            }
        }
        // tarjan_scc produces components in reverse topological order.
        tarjan_scc(&g)
            .into_iter()
            .rev()
            .map(|scc| scc.into_iter().map(|n| n.index()).collect())
            .collect()
    }
}

/// Dumps one line per node: the node index, a colon, then each successor preceded by a space.
impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (from, tos) in self.edges.iter().enumerate() {
            write!(f, "{from}:")?;
            for to in tos {
                write!(f, " {to}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::Graph;

    fn diamond() -> Graph {
        let mut g = Graph::new(4);
        g.add_edge(0, 1);
        g.add_edge(0, 2);
        g.add_edge(1, 3);
        g.add_edge(2, 3);
        g
    }

    #[test]
    fn test_display() {
        let mut g = diamond();
        g.add_node();
        assert_eq!(g.to_string(), "0: 1 2\n1: 3\n2: 3\n3:\n4:\n");
    }

    #[test]
    fn test_transpose() {
        let g = diamond();
        let t = g.transpose();
        assert_eq!(t.nnodes(), 4);
        assert_eq!(t.nedges(), 4);
        assert_eq!(t.edges(0), &[] as &[usize]);
        assert_eq!(t.edges(3), &[1, 2]);
        assert_eq!(t.to_string(), "0:\n1: 0\n2: 0\n3: 1 2\n");
        assert_eq!(t.transpose(), g);
    }

    #[test]
    fn test_sccs() {
        // 0 -> 1 <-> 2 -> 3, 3 -> 3
        let mut g = Graph::new(5);
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        g.add_edge(2, 1);
        g.add_edge(2, 3);
        g.add_edge(3, 3);
        let sccs = g
            .sccs()
            .into_iter()
            .map(|mut x| {
                x.sort();
                x
            })
            .collect::<Vec<_>>();
        assert_eq!(sccs.len(), 4);
        let pos = |n: usize| sccs.iter().position(|scc| scc.contains(&n)).unwrap();
        assert_eq!(sccs[pos(1)], vec![1, 2]);
        assert!(pos(0) < pos(1));
        assert!(pos(1) < pos(3));
        assert_eq!(sccs[pos(4)], vec![4]);
    }
}
