use std::collections::HashMap;

use tracing::{debug, info};

use crate::{
    datatypes::{EdgeRole, Node, Vertex},
    error::PbcError,
};

/// Access to the meshed cell: boundary node lists and corner lookup
pub trait BoundaryGeometry {
    /// Returns the nodes lying on one boundary edge of the cell
    fn edge_nodes(&self, role: EdgeRole) -> Result<Vec<Node>, PbcError>;

    /// Resolves the node closest to `point`, failing when none lies within
    /// `tolerance`
    fn find_vertex_near(&self, point: &Vertex, tolerance: f64) -> Result<Node, PbcError>;
}

/// Picks the closest node to `point` within `tolerance`
fn closest_within<'a>(
    nodes: impl Iterator<Item = &'a Node>,
    point: &Vertex,
    tolerance: f64,
) -> Result<Node, PbcError> {
    let mut best: Option<(f64, &Node)> = None;
    for node in nodes {
        let distance = node.vertex.distance_to(point);
        if distance > tolerance {
            continue;
        }
        match best {
            Some((d, b)) if d < distance || (d == distance && b.label <= node.label) => {}
            _ => best = Some((distance, node)),
        }
    }

    match best {
        Some((_, node)) => Ok(*node),
        None => Err(PbcError::GeometryLookup {
            point: *point,
            tolerance,
        }),
    }
}

/// Boundary node lists handed over directly, one per edge
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeNodeSets {
    edges: HashMap<EdgeRole, Vec<Node>>,
}

impl EdgeNodeSets {
    pub fn new(up: Vec<Node>, down: Vec<Node>, left: Vec<Node>, right: Vec<Node>) -> Self {
        let mut sets = EdgeNodeSets::default();
        sets.insert(EdgeRole::Up, up);
        sets.insert(EdgeRole::Down, down);
        sets.insert(EdgeRole::Left, left);
        sets.insert(EdgeRole::Right, right);
        sets
    }

    pub fn insert(&mut self, role: EdgeRole, nodes: Vec<Node>) {
        self.edges.insert(role, nodes);
    }

    pub fn get(&self, role: EdgeRole) -> &[Node] {
        self.edges.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl BoundaryGeometry for EdgeNodeSets {
    fn edge_nodes(&self, role: EdgeRole) -> Result<Vec<Node>, PbcError> {
        Ok(self.get(role).to_vec())
    }

    fn find_vertex_near(&self, point: &Vertex, tolerance: f64) -> Result<Node, PbcError> {
        closest_within(
            EdgeRole::ALL.iter().flat_map(|role| self.get(*role).iter()),
            point,
            tolerance,
        )
    }
}

/// Nodes of a meshed rectangular cell spanning `[0, length] x [0, breadth]`
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    pub nodes: Vec<Node>,
    pub length: f64,
    pub breadth: f64,
    /// Distance from a boundary line within which a node belongs to it
    pub edge_tolerance: f64,
}

impl Mesh {
    pub fn new(nodes: Vec<Node>, length: f64, breadth: f64, edge_tolerance: f64) -> Mesh {
        Mesh {
            nodes,
            length,
            breadth,
            edge_tolerance,
        }
    }

    fn on_edge(&self, role: EdgeRole, vertex: &Vertex) -> bool {
        let distance = match role {
            EdgeRole::Up => (vertex.y - self.breadth).abs(),
            EdgeRole::Down => vertex.y.abs(),
            EdgeRole::Left => vertex.x.abs(),
            EdgeRole::Right => (vertex.x - self.length).abs(),
        };
        distance <= self.edge_tolerance
    }
}

impl BoundaryGeometry for Mesh {
    fn edge_nodes(&self, role: EdgeRole) -> Result<Vec<Node>, PbcError> {
        let nodes: Vec<Node> = self
            .nodes
            .iter()
            .filter(|n| self.on_edge(role, &n.vertex))
            .copied()
            .collect();
        debug!("selected {} nodes on {} edge", nodes.len(), role);
        Ok(nodes)
    }

    fn find_vertex_near(&self, point: &Vertex, tolerance: f64) -> Result<Node, PbcError> {
        closest_within(self.nodes.iter(), point, tolerance)
    }
}

enum MeshParseState {
    Format,
    Nodes,
    Limbo,
}

fn parse_field<T: std::str::FromStr>(value: &str, what: &str) -> Result<T, PbcError> {
    value
        .parse()
        .map_err(|_| PbcError::Mesher(format!("Unexpected {what} '{value}' in mesh data")))
}

/// Parses the contents of a gmsh ASCII v4 .msh file into Nodes
///
/// Only the `$MeshFormat` and `$Nodes` sections are read; node tags become
/// node labels and the z coordinate is dropped.
///
/// # Arguments
/// * `contents` - The mesh file contents
///
/// # Returns
/// The parsed nodes, in file order
pub fn parse_mesh(contents: &str) -> Result<Vec<Node>, PbcError> {
    let mut parser_state = MeshParseState::Limbo;
    let mut parsed_section_metadata = false;
    let mut seen_format = false;
    let mut lines = contents.lines().map(str::trim);

    let mut nodes: Vec<Node> = Vec::new();

    while let Some(line) = lines.next() {
        if line.is_empty() {
            continue;
        }

        if line.starts_with("$End") {
            parser_state = MeshParseState::Limbo;
            continue;
        }

        match parser_state {
            MeshParseState::Limbo => {
                parsed_section_metadata = false;

                if line.starts_with("$MeshFormat") {
                    parser_state = MeshParseState::Format;
                } else if line.starts_with("$Nodes") {
                    parser_state = MeshParseState::Nodes;
                }
            }
            MeshParseState::Format => {
                let version = line.split_whitespace().next().unwrap_or("");
                if !version.starts_with('4') {
                    return Err(PbcError::Mesher(format!(
                        "Unsupported mesh format version {version}, expected 4.x ASCII"
                    )));
                }
                if line.split_whitespace().nth(1) != Some("0") {
                    return Err(PbcError::Mesher(
                        "Binary mesh files are not supported".to_owned(),
                    ));
                }
                seen_format = true;
            }
            MeshParseState::Nodes => {
                if !parsed_section_metadata {
                    parsed_section_metadata = true;
                    continue;
                }

                // entityDim entityTag parametric numNodesInBlock
                let block: Vec<usize> = line
                    .split_whitespace()
                    .map(|i| parse_field(i, "block header value"))
                    .collect::<Result<_, _>>()?;
                if block.len() != 4 {
                    return Err(PbcError::Mesher(format!(
                        "Malformed node block header '{line}'"
                    )));
                }
                let num_nodes_local = block[3];

                let mut node_tags: Vec<u64> = Vec::with_capacity(num_nodes_local);
                for _ in 0..num_nodes_local {
                    let tag = match lines.next() {
                        Some(tag) => parse_field(tag, "node tag")?,
                        None => {
                            return Err(PbcError::Mesher(
                                "Mesh ended inside a node block".to_owned(),
                            ))
                        }
                    };
                    node_tags.push(tag);
                }

                for tag in node_tags {
                    let node_coords: Vec<f64> = match lines.next() {
                        Some(coords) => coords
                            .split_whitespace()
                            .map(|c| parse_field(c, "coordinate"))
                            .collect::<Result<_, _>>()?,
                        None => {
                            return Err(PbcError::Mesher(
                                "Mesh ended inside a node block".to_owned(),
                            ))
                        }
                    };
                    if node_coords.len() < 2 {
                        return Err(PbcError::Mesher(format!(
                            "Node {tag} has fewer than two coordinates"
                        )));
                    }

                    nodes.push(Node::new(tag, node_coords[0], node_coords[1]));
                }
            }
        }
    }

    if !seen_format {
        return Err(PbcError::Mesher("Missing $MeshFormat section".to_owned()));
    }

    Ok(nodes)
}

/// Reads a gmsh mesh file and wraps its nodes in a Mesh
///
/// # Arguments
/// * `mesh_file` - The path to the .msh file
/// * `length` - Cell extent along x
/// * `breadth` - Cell extent along y
/// * `edge_tolerance` - Boundary selection distance
pub fn load_mesh(
    mesh_file: &str,
    length: f64,
    breadth: f64,
    edge_tolerance: f64,
) -> Result<Mesh, PbcError> {
    let contents = match std::fs::read_to_string(mesh_file) {
        Ok(c) => c,
        Err(err) => {
            return Err(PbcError::Mesher(format!(
                "Unable to open mesh file {mesh_file}: {err}"
            )))
        }
    };

    let nodes = parse_mesh(&contents)?;
    info!("loaded {} nodes from {}", nodes.len(), mesh_file);

    Ok(Mesh::new(nodes, length, breadth, edge_tolerance))
}
