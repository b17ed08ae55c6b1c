use tracing::{debug, warn};

use crate::{
    datatypes::{MismatchPolicy, NodePair, PairFamily, PairList, SortedCoordinate},
    error::PbcError,
};

/// Pairs the nodes of two opposite edges by sorted position
///
/// The i-th nodes of both edges pair when they agree on the family's
/// alignment axis within `tolerance`. Index 0 and the last index are the
/// corners; they stay in the list but must always match.
///
/// # Arguments
/// * `family` - Which opposite edges are being paired
/// * `first` - Sorted coordinates of the first edge (left or up)
/// * `second` - Sorted coordinates of the second edge (right or down)
/// * `tolerance` - Largest accepted distance along the alignment axis
/// * `policy` - Whether an interior mismatch fails or is skipped
///
/// # Returns
/// The ordered pair list
pub fn match_edges(
    family: PairFamily,
    first: &[SortedCoordinate],
    second: &[SortedCoordinate],
    tolerance: f64,
    policy: MismatchPolicy,
) -> Result<PairList, PbcError> {
    if first.len() != second.len() {
        return Err(PbcError::NodeCountMismatch {
            family,
            first: first.len(),
            second: second.len(),
        });
    }

    let len = first.len();
    if len < 2 {
        return Err(PbcError::DegenerateEdge {
            role: family.roles().0,
            count: len,
        });
    }

    let mut pairs: Vec<NodePair> = Vec::with_capacity(len);
    let mut skipped: Vec<usize> = Vec::new();

    for (index, (a, b)) in first.iter().zip(second).enumerate() {
        let (align_a, align_b) = (family.alignment(a), family.alignment(b));

        if (align_a - align_b).abs() < tolerance {
            pairs.push(NodePair {
                index,
                first: *a,
                second: *b,
            });
            continue;
        }

        let is_corner = index == 0 || index == len - 1;
        if policy == MismatchPolicy::Fail || is_corner {
            return Err(PbcError::ToleranceMismatch {
                family,
                index,
                first: align_a,
                second: align_b,
                tolerance,
            });
        }

        warn!(
            "skipping {} pair at index {}: nodes {} ({}, {}) and {} ({}, {}) differ by more than {}",
            family, index, a.label, a.x, a.y, b.label, b.x, b.y, tolerance
        );
        skipped.push(index);
    }

    debug!(
        "matched {} of {} {} pairs",
        pairs.len(),
        len,
        family
    );

    Ok(PairList {
        family,
        pairs,
        len,
        skipped,
    })
}
