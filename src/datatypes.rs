use std::cmp::Ordering;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
}

impl Vertex {
    pub fn new(x: f64, y: f64) -> Vertex {
        Vertex { x, y }
    }

    pub fn distance_to(&self, other: &Vertex) -> f64 {
        f64::sqrt(f64::powi(self.x - other.x, 2) + f64::powi(self.y - other.y, 2))
    }
}

/// A mesh node. The label is its identity; nodes are never mutated once read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    pub label: u64,
    pub vertex: Vertex,
}

impl Node {
    pub fn new(label: u64, x: f64, y: f64) -> Node {
        Node {
            label,
            vertex: Vertex { x, y },
        }
    }
}

/// The four boundary edges of the rectangular cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeRole {
    Up,
    Down,
    Left,
    Right,
}

impl EdgeRole {
    pub const ALL: [EdgeRole; 4] = [EdgeRole::Up, EdgeRole::Down, EdgeRole::Left, EdgeRole::Right];

    /// Prefix used when naming single-node sets on this edge
    pub fn set_prefix(&self) -> &'static str {
        match self {
            EdgeRole::Up => "UpNode",
            EdgeRole::Down => "DownNode",
            EdgeRole::Left => "LeftNode",
            EdgeRole::Right => "RightNode",
        }
    }
}

impl Display for EdgeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EdgeRole::Up => "up",
            EdgeRole::Down => "down",
            EdgeRole::Left => "left",
            EdgeRole::Right => "right",
        };
        write!(f, "{name}")
    }
}

/// A pair of opposite edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairFamily {
    LeftRight,
    UpDown,
}

impl PairFamily {
    /// The (first, second) edge roles of the family
    pub fn roles(&self) -> (EdgeRole, EdgeRole) {
        match self {
            PairFamily::LeftRight => (EdgeRole::Left, EdgeRole::Right),
            PairFamily::UpDown => (EdgeRole::Up, EdgeRole::Down),
        }
    }

    /// Coordinate shared by opposite nodes. Left/Right nodes line up in y,
    /// Up/Down nodes in x.
    pub fn alignment(&self, coord: &SortedCoordinate) -> f64 {
        match self {
            PairFamily::LeftRight => coord.y,
            PairFamily::UpDown => coord.x,
        }
    }
}

impl Display for PairFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PairFamily::LeftRight => write!(f, "left/right"),
            PairFamily::UpDown => write!(f, "up/down"),
        }
    }
}

/// A node projected to `(x, y, label)`
///
/// Edges order these by the coordinate running along the edge, then the one
/// across it, then the label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SortedCoordinate {
    pub x: f64,
    pub y: f64,
    pub label: u64,
}

impl SortedCoordinate {
    /// Position along the edge: y on Left/Right, x on Up/Down
    pub fn along(&self, role: EdgeRole) -> f64 {
        match role {
            EdgeRole::Left | EdgeRole::Right => self.y,
            EdgeRole::Up | EdgeRole::Down => self.x,
        }
    }

    /// Offset across the edge, constant up to floating noise
    pub fn across(&self, role: EdgeRole) -> f64 {
        match role {
            EdgeRole::Left | EdgeRole::Right => self.x,
            EdgeRole::Up | EdgeRole::Down => self.y,
        }
    }

    pub fn cmp_on(&self, other: &SortedCoordinate, role: EdgeRole) -> Ordering {
        self.along(role)
            .total_cmp(&other.along(role))
            .then(self.across(role).total_cmp(&other.across(role)))
            .then(self.label.cmp(&other.label))
    }
}

impl From<&Node> for SortedCoordinate {
    fn from(node: &Node) -> Self {
        SortedCoordinate {
            x: node.vertex.x,
            y: node.vertex.y,
            label: node.label,
        }
    }
}

/// Matched nodes at one position of two opposite edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePair {
    pub index: usize,
    pub first: SortedCoordinate,
    pub second: SortedCoordinate,
}

/// Ordered matches of one edge family
#[derive(Debug, Clone, PartialEq)]
pub struct PairList {
    pub family: PairFamily,
    pub pairs: Vec<NodePair>,
    /// Common length of both edges
    pub len: usize,
    /// Indices dropped by a tolerance mismatch
    pub skipped: Vec<usize>,
}

impl PairList {
    pub fn corner(&self) -> Option<&NodePair> {
        self.pairs.first().filter(|p| p.index == 0)
    }

    pub fn far_corner(&self) -> Option<&NodePair> {
        self.pairs
            .last()
            .filter(|p| self.len > 0 && p.index == self.len - 1)
    }

    /// Pairs subject to the generic periodicity rule, corners excluded
    pub fn interior(&self) -> impl Iterator<Item = &NodePair> {
        let last = self.len.saturating_sub(1);
        self.pairs
            .iter()
            .filter(move |p| p.index != 0 && p.index != last)
    }
}

/// In-plane displacement degree of freedom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dof {
    U1 = 1,
    U2 = 2,
}

impl Dof {
    pub fn number(&self) -> u8 {
        *self as u8
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintTerm {
    pub coefficient: f64,
    pub node_set: String,
    pub label: u64,
    pub dof: Dof,
}

/// A linear relation whose weighted sum of terms is zero
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintEquation {
    pub name: String,
    pub terms: Vec<ConstraintTerm>,
}

/// A set holding exactly one node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSet {
    pub name: String,
    pub label: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryKind {
    /// All displacement degrees of freedom held at zero
    Encastre,
    /// `None` leaves the degree of freedom free
    Displacement { u1: Option<f64>, u2: Option<f64> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CornerBoundaryCondition {
    pub name: String,
    pub set_name: String,
    pub step: String,
    pub node: Node,
    pub kind: BoundaryKind,
}

/// What to do when opposite nodes are further apart than the node tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchPolicy {
    Fail,
    Skip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelMetadata {
    /// Cell extent along x (LRVE)
    pub rve_length: f64,
    /// Cell extent along y (BRVE)
    pub rve_breadth: f64,
    /// Largest distance along the shared axis for two opposite nodes to pair
    pub node_tolerance: f64,
    /// Left edge x values below this magnitude are snapped to zero
    pub snap_threshold: f64,
    /// Search radius for corner vertices
    pub lookup_tolerance: f64,
    /// Distance from a boundary line within which mesh nodes belong to it;
    /// never below `snap_threshold`
    pub edge_tolerance: f64,
    /// Prescribed u1 on the bottom-right roller; stands in for the load case
    pub roller_displacement: f64,
    pub instance_name: String,
    pub step_name: String,
    pub on_tolerance_mismatch: MismatchPolicy,
}

/// Everything produced by one generation pass
#[derive(Debug, Clone, PartialEq)]
pub struct PbcModel {
    pub node_sets: Vec<NodeSet>,
    pub equations: Vec<ConstraintEquation>,
    pub boundary_conditions: Vec<CornerBoundaryCondition>,
    pub skipped: Vec<(PairFamily, usize)>,
}
