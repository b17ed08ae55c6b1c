use std::collections::HashSet;

use tracing::{info, warn};

use crate::{
    boundary::assign_corner_conditions,
    collector::collect,
    datatypes::{
        ConstraintEquation, CornerBoundaryCondition, EdgeRole, ModelMetadata, NodeSet, PairFamily,
        PbcModel,
    },
    emitter::{emit_node_sets, emit_periodic_equations},
    error::PbcError,
    matcher::match_edges,
    mesher::BoundaryGeometry,
};

/// Accumulates everything one generation pass produces
///
/// Names are unique per kind: node sets, equations and boundary conditions
/// live in separate namespaces, so a set and a condition may share a name.
#[derive(Debug, Default)]
pub struct BuildContext {
    names: HashSet<(&'static str, String)>,
    node_sets: Vec<NodeSet>,
    equations: Vec<ConstraintEquation>,
    boundary_conditions: Vec<CornerBoundaryCondition>,
    skipped: Vec<(PairFamily, usize)>,
}

impl BuildContext {
    pub fn new() -> BuildContext {
        BuildContext::default()
    }

    fn register(&mut self, kind: &'static str, name: &str) -> Result<(), PbcError> {
        if !self.names.insert((kind, name.to_owned())) {
            return Err(PbcError::DuplicateName {
                kind,
                name: name.to_owned(),
            });
        }
        Ok(())
    }

    pub fn add_node_set(&mut self, name: String, label: u64) -> Result<(), PbcError> {
        self.register("node set", &name)?;
        self.node_sets.push(NodeSet { name, label });
        Ok(())
    }

    pub fn add_equation(&mut self, equation: ConstraintEquation) -> Result<(), PbcError> {
        self.register("equation", &equation.name)?;
        self.equations.push(equation);
        Ok(())
    }

    pub fn add_boundary_condition(
        &mut self,
        condition: CornerBoundaryCondition,
    ) -> Result<(), PbcError> {
        self.register("boundary condition", &condition.name)?;
        // the condition's region is written out as a node set of its own
        self.register("node set", &condition.set_name)?;
        self.boundary_conditions.push(condition);
        Ok(())
    }

    pub fn record_skipped(&mut self, family: PairFamily, indices: &[usize]) {
        self.skipped
            .extend(indices.iter().map(|index| (family, *index)));
    }

    pub fn finish(self) -> PbcModel {
        PbcModel {
            node_sets: self.node_sets,
            equations: self.equations,
            boundary_conditions: self.boundary_conditions,
            skipped: self.skipped,
        }
    }
}

/// Runs the generator: collects the boundary nodes, pairs opposite edges,
/// emits the periodicity equations and fixes the corners
///
/// # Arguments
/// * `geometry` - The boundary node source
/// * `metadata` - The model metadata
///
/// # Returns
/// The node sets, equations and boundary conditions of the cell
pub fn run(geometry: &dyn BoundaryGeometry, metadata: &ModelMetadata) -> Result<PbcModel, PbcError> {
    let mut ctx = BuildContext::new();

    info!(
        "generating periodic constraints for {} x {} cell",
        metadata.rve_length, metadata.rve_breadth
    );

    let edge = |role: EdgeRole| -> Result<_, PbcError> {
        let nodes = geometry.edge_nodes(role)?;
        Ok(collect(role, &nodes, metadata.snap_threshold))
    };
    let (up, down, left, right) = (
        edge(EdgeRole::Up)?,
        edge(EdgeRole::Down)?,
        edge(EdgeRole::Left)?,
        edge(EdgeRole::Right)?,
    );
    info!(
        "collected {} up, {} down, {} left and {} right nodes",
        up.len(),
        down.len(),
        left.len(),
        right.len()
    );

    let left_right = match_edges(
        PairFamily::LeftRight,
        &left,
        &right,
        metadata.node_tolerance,
        metadata.on_tolerance_mismatch,
    )?;
    let up_down = match_edges(
        PairFamily::UpDown,
        &up,
        &down,
        metadata.node_tolerance,
        metadata.on_tolerance_mismatch,
    )?;
    ctx.record_skipped(PairFamily::LeftRight, &left_right.skipped);
    ctx.record_skipped(PairFamily::UpDown, &up_down.skipped);

    emit_node_sets(&mut ctx, &left_right)?;
    emit_node_sets(&mut ctx, &up_down)?;
    emit_periodic_equations(&mut ctx, &left_right, &up_down)?;

    assign_corner_conditions(&mut ctx, geometry, metadata)?;

    let model = ctx.finish();
    info!(
        "generated {} node sets, {} equations and {} boundary conditions",
        model.node_sets.len(),
        model.equations.len(),
        model.boundary_conditions.len()
    );
    if !model.skipped.is_empty() {
        warn!(
            "{} pairs skipped for exceeding the node tolerance",
            model.skipped.len()
        );
    }

    Ok(model)
}
