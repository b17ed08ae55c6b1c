use tracing::info;

use crate::{
    datatypes::{BoundaryKind, CornerBoundaryCondition, ModelMetadata, Vertex},
    error::PbcError,
    generator::BuildContext,
    mesher::BoundaryGeometry,
};

/// Step in which the encastre is created
pub const INITIAL_STEP: &str = "Initial";

/// Applies the corner boundary conditions that remove rigid body motion
///
/// The bottom-left corner is fully fixed. The top-left corner is a roller
/// with u1 = 0, and the bottom-right corner carries u2 = 0 plus the
/// prescribed roller displacement in u1.
///
/// # Arguments
/// * `ctx` - The build context collecting this pass
/// * `geometry` - Source of the corner vertices
/// * `metadata` - Cell extents, lookup tolerance and roller settings
pub fn assign_corner_conditions(
    ctx: &mut BuildContext,
    geometry: &dyn BoundaryGeometry,
    metadata: &ModelMetadata,
) -> Result<(), PbcError> {
    let tolerance = metadata.lookup_tolerance;

    let bottom_left = geometry.find_vertex_near(&Vertex::new(0.0, 0.0), tolerance)?;
    let top_left = geometry.find_vertex_near(&Vertex::new(0.0, metadata.rve_breadth), tolerance)?;
    let bottom_right =
        geometry.find_vertex_near(&Vertex::new(metadata.rve_length, 0.0), tolerance)?;

    ctx.add_boundary_condition(CornerBoundaryCondition {
        name: "Fix1".to_owned(),
        set_name: "Set-Fix-1".to_owned(),
        step: INITIAL_STEP.to_owned(),
        node: bottom_left,
        kind: BoundaryKind::Encastre,
    })?;
    ctx.add_boundary_condition(CornerBoundaryCondition {
        name: "Y_roll".to_owned(),
        set_name: "Y_roll".to_owned(),
        step: metadata.step_name.clone(),
        node: top_left,
        kind: BoundaryKind::Displacement {
            u1: Some(0.0),
            u2: None,
        },
    })?;
    ctx.add_boundary_condition(CornerBoundaryCondition {
        name: "X_roll".to_owned(),
        set_name: "X_roll".to_owned(),
        step: metadata.step_name.clone(),
        node: bottom_right,
        kind: BoundaryKind::Displacement {
            u1: Some(metadata.roller_displacement),
            u2: Some(0.0),
        },
    })?;

    info!(
        "fixed corner node {}, rollers on nodes {} and {}",
        bottom_left.label, top_left.label, bottom_right.label
    );

    Ok(())
}
