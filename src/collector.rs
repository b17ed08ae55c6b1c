use std::collections::HashSet;

use tracing::debug;

use crate::datatypes::{EdgeRole, Node, SortedCoordinate};

/// Projects an edge's nodes onto coordinates sorted along the edge
///
/// Nodes repeated across edge partitions are kept once. On the left edge any
/// x with magnitude below `snap_threshold` becomes exactly zero. The sort
/// leads with the along-edge axis, so noise across the edge cannot move a
/// node out of its slot.
///
/// # Arguments
/// * `role` - The edge the nodes belong to
/// * `nodes` - The edge nodes, in any order
/// * `snap_threshold` - Left edge snapping threshold
///
/// # Returns
/// The edge coordinates, corner first
pub fn collect(role: EdgeRole, nodes: &[Node], snap_threshold: f64) -> Vec<SortedCoordinate> {
    let mut seen: HashSet<u64> = HashSet::with_capacity(nodes.len());
    let mut coords: Vec<SortedCoordinate> = Vec::with_capacity(nodes.len());

    for node in nodes {
        if !seen.insert(node.label) {
            continue;
        }

        let mut coord = SortedCoordinate::from(node);
        if role == EdgeRole::Left && coord.x.abs() < snap_threshold {
            coord.x = 0.0;
        }
        coords.push(coord);
    }

    let duplicates = nodes.len() - coords.len();
    if duplicates > 0 {
        debug!("dropped {duplicates} repeated nodes on {role} edge");
    }

    sort_coordinates(role, &mut coords);
    coords
}

/// Sorts by position along the edge, then across it, then by label
pub fn sort_coordinates(role: EdgeRole, coords: &mut [SortedCoordinate]) {
    coords.sort_by(|a, b| a.cmp_on(b, role));
}
