use indicatif::ProgressBar;
use tracing::info;

use crate::{
    datatypes::{ConstraintEquation, ConstraintTerm, Dof, EdgeRole, NodePair, PairList},
    error::PbcError,
    generator::BuildContext,
};

fn set_name(role: EdgeRole, index: usize) -> String {
    format!("{}-{}", role.set_prefix(), index)
}

fn term(coefficient: f64, role: EdgeRole, pair: &NodePair, dof: Dof) -> ConstraintTerm {
    // left and up are the first edge of their family
    let label = match role {
        EdgeRole::Left | EdgeRole::Up => pair.first.label,
        EdgeRole::Right | EdgeRole::Down => pair.second.label,
    };

    ConstraintTerm {
        coefficient,
        node_set: set_name(role, pair.index),
        label,
        dof,
    }
}

/// The pair at a corner index; lists built by the matcher always carry both
fn corner_pair(pairs: &PairList, far: bool) -> Result<&NodePair, PbcError> {
    let pair = if far {
        pairs.far_corner()
    } else {
        pairs.corner()
    };

    pair.ok_or(PbcError::DegenerateEdge {
        role: pairs.family.roles().0,
        count: pairs.len,
    })
}

/// Registers one single-node set per matched node
///
/// # Arguments
/// * `ctx` - The build context collecting this pass
/// * `pairs` - The matched pairs of one edge family
pub fn emit_node_sets(ctx: &mut BuildContext, pairs: &PairList) -> Result<(), PbcError> {
    let (first_role, second_role) = pairs.family.roles();

    for pair in &pairs.pairs {
        ctx.add_node_set(set_name(first_role, pair.index), pair.first.label)?;
        ctx.add_node_set(set_name(second_role, pair.index), pair.second.label)?;
    }

    Ok(())
}

/// Emits the periodicity equations for both edge families and the far corner
///
/// Each interior pair ties its relative displacement to the reference
/// corners: the bottom-right corner (`RightNode-0`) along x for left/right,
/// the top-left corner (`UpNode-0`) along y for up/down. The top-right corner
/// is tied to the bottom-right corner in x and to the top-left corner in y.
///
/// # Arguments
/// * `ctx` - The build context collecting this pass
/// * `left_right` - Matched left/right pairs
/// * `up_down` - Matched up/down pairs
pub fn emit_periodic_equations(
    ctx: &mut BuildContext,
    left_right: &PairList,
    up_down: &PairList,
) -> Result<(), PbcError> {
    let lr_reference = corner_pair(left_right, false)?;
    let ud_reference = corner_pair(up_down, false)?;
    let far_corner = corner_pair(up_down, true)?;

    let lr_interior: Vec<&NodePair> = left_right.interior().collect();
    let ud_interior: Vec<&NodePair> = up_down.interior().collect();

    let bar = ProgressBar::new(2 * (lr_interior.len() + ud_interior.len()) as u64 + 2);

    for pair in &lr_interior {
        ctx.add_equation(ConstraintEquation {
            name: format!("Eqn-LR-X-{}", pair.index),
            terms: vec![
                term(-1.0, EdgeRole::Left, pair, Dof::U1),
                term(1.0, EdgeRole::Right, pair, Dof::U1),
                term(-1.0, EdgeRole::Right, lr_reference, Dof::U1),
            ],
        })?;
        bar.inc(1);
    }
    for pair in &lr_interior {
        ctx.add_equation(ConstraintEquation {
            name: format!("Eqn-LR-Y-{}", pair.index),
            terms: vec![
                term(1.0, EdgeRole::Left, pair, Dof::U2),
                term(-1.0, EdgeRole::Right, pair, Dof::U2),
            ],
        })?;
        bar.inc(1);
    }

    for pair in &ud_interior {
        ctx.add_equation(ConstraintEquation {
            name: format!("Eqn-UD-Y-{}", pair.index),
            terms: vec![
                term(-1.0, EdgeRole::Down, pair, Dof::U2),
                term(1.0, EdgeRole::Up, pair, Dof::U2),
                term(-1.0, EdgeRole::Up, ud_reference, Dof::U2),
            ],
        })?;
        bar.inc(1);
    }
    for pair in &ud_interior {
        ctx.add_equation(ConstraintEquation {
            name: format!("Eqn-UD-X-{}", pair.index),
            terms: vec![
                term(1.0, EdgeRole::Down, pair, Dof::U1),
                term(-1.0, EdgeRole::Up, pair, Dof::U1),
            ],
        })?;
        bar.inc(1);
    }

    ctx.add_equation(ConstraintEquation {
        name: "Eqn-TR-X".to_owned(),
        terms: vec![
            term(1.0, EdgeRole::Up, far_corner, Dof::U1),
            term(-1.0, EdgeRole::Down, far_corner, Dof::U1),
        ],
    })?;
    ctx.add_equation(ConstraintEquation {
        name: "Eqn-TR-Y".to_owned(),
        terms: vec![
            term(1.0, EdgeRole::Up, far_corner, Dof::U2),
            term(-1.0, EdgeRole::Up, ud_reference, Dof::U2),
        ],
    })?;
    bar.inc(2);
    bar.finish_and_clear();

    info!(
        "emitted {} equations for {} left/right and {} up/down interior pairs",
        2 * (lr_interior.len() + ud_interior.len()) + 2,
        lr_interior.len(),
        ud_interior.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{MismatchPolicy, PairFamily, SortedCoordinate};
    use crate::matcher::match_edges;
    use pretty_assertions::assert_eq;

    fn coords(points: &[(f64, f64, u64)]) -> Vec<SortedCoordinate> {
        points
            .iter()
            .map(|&(x, y, label)| SortedCoordinate { x, y, label })
            .collect()
    }

    fn square_pairs() -> (PairList, PairList) {
        let left = coords(&[(0.0, 0.0, 1), (0.0, 5.0, 8), (0.0, 10.0, 7)]);
        let right = coords(&[(10.0, 0.0, 3), (10.0, 5.0, 4), (10.0, 10.0, 5)]);
        let up = coords(&[(0.0, 10.0, 7), (5.0, 10.0, 6), (10.0, 10.0, 5)]);
        let down = coords(&[(0.0, 0.0, 1), (5.0, 0.0, 2), (10.0, 0.0, 3)]);

        (
            match_edges(PairFamily::LeftRight, &left, &right, 0.1, MismatchPolicy::Fail).unwrap(),
            match_edges(PairFamily::UpDown, &up, &down, 0.1, MismatchPolicy::Fail).unwrap(),
        )
    }

    fn t(coefficient: f64, node_set: &str, label: u64, dof: Dof) -> ConstraintTerm {
        ConstraintTerm {
            coefficient,
            node_set: node_set.to_owned(),
            label,
            dof,
        }
    }

    #[test]
    fn emits_generic_and_far_corner_equations() {
        let (left_right, up_down) = square_pairs();
        let mut ctx = BuildContext::new();
        emit_node_sets(&mut ctx, &left_right).unwrap();
        emit_node_sets(&mut ctx, &up_down).unwrap();
        emit_periodic_equations(&mut ctx, &left_right, &up_down).unwrap();

        let model = ctx.finish();
        assert_eq!(model.node_sets.len(), 12);

        let names: Vec<&str> = model.equations.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Eqn-LR-X-1", "Eqn-LR-Y-1", "Eqn-UD-Y-1", "Eqn-UD-X-1", "Eqn-TR-X", "Eqn-TR-Y"]
        );

        assert_eq!(
            model.equations[0].terms,
            vec![
                t(-1.0, "LeftNode-1", 8, Dof::U1),
                t(1.0, "RightNode-1", 4, Dof::U1),
                t(-1.0, "RightNode-0", 3, Dof::U1),
            ]
        );
        assert_eq!(
            model.equations[2].terms,
            vec![
                t(-1.0, "DownNode-1", 2, Dof::U2),
                t(1.0, "UpNode-1", 6, Dof::U2),
                t(-1.0, "UpNode-0", 7, Dof::U2),
            ]
        );
        assert_eq!(
            model.equations[5].terms,
            vec![t(1.0, "UpNode-2", 5, Dof::U2), t(-1.0, "UpNode-0", 7, Dof::U2)]
        );
    }

    #[test]
    fn repeated_emission_collides() {
        let (left_right, up_down) = square_pairs();
        let mut ctx = BuildContext::new();
        emit_node_sets(&mut ctx, &left_right).unwrap();
        assert_eq!(
            emit_node_sets(&mut ctx, &left_right),
            Err(PbcError::DuplicateName {
                kind: "node set",
                name: "LeftNode-0".to_owned()
            })
        );

        emit_periodic_equations(&mut ctx, &left_right, &up_down).unwrap();
        assert!(matches!(
            emit_periodic_equations(&mut ctx, &left_right, &up_down),
            Err(PbcError::DuplicateName { kind: "equation", .. })
        ));
    }
}
