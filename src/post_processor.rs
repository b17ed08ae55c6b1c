use std::fmt::Write;

use json::JsonValue;
use tracing::info;

use crate::{
    datatypes::{BoundaryKind, ModelMetadata, PairFamily, PbcModel},
    error::PbcError,
};

fn fmt_error(err: std::fmt::Error) -> PbcError {
    PbcError::PostProcessor(format!("Failed to format output: {err}"))
}

/// Renders the model as an Abaqus keyword fragment
///
/// # Arguments
/// * `model` - The generated model
/// * `metadata` - Supplies the instance name for node sets
///
/// # Returns
/// `*Nset`, `*Equation` and `*Boundary` blocks, in that order
pub fn render_inp(model: &PbcModel, metadata: &ModelMetadata) -> Result<String, PbcError> {
    let mut out = String::new();
    let instance = &metadata.instance_name;

    writeln!(out, "** Periodic boundary conditions").map_err(fmt_error)?;
    writeln!(
        out,
        "** {} node sets, {} equations, {} boundary conditions",
        model.node_sets.len(),
        model.equations.len(),
        model.boundary_conditions.len()
    )
    .map_err(fmt_error)?;

    for set in &model.node_sets {
        writeln!(out, "*Nset, nset={}, instance={instance}\n {},", set.name, set.label)
            .map_err(fmt_error)?;
    }
    for bc in &model.boundary_conditions {
        writeln!(
            out,
            "*Nset, nset={}, instance={instance}\n {},",
            bc.set_name, bc.node.label
        )
        .map_err(fmt_error)?;
    }

    for equation in &model.equations {
        writeln!(out, "** Constraint: {}\n*Equation\n{}", equation.name, equation.terms.len())
            .map_err(fmt_error)?;
        for term in &equation.terms {
            writeln!(
                out,
                "{}, {}, {:?}",
                term.node_set,
                term.dof.number(),
                term.coefficient
            )
            .map_err(fmt_error)?;
        }
    }

    for bc in &model.boundary_conditions {
        writeln!(out, "** BC: {}, step: {}\n*Boundary", bc.name, bc.step).map_err(fmt_error)?;
        match bc.kind {
            BoundaryKind::Encastre => {
                writeln!(out, "{}, ENCASTRE", bc.set_name).map_err(fmt_error)?;
            }
            BoundaryKind::Displacement { u1, u2 } => {
                for (dof, value) in [(1, u1), (2, u2)] {
                    if let Some(value) = value {
                        writeln!(out, "{}, {dof}, {dof}, {value:?}", bc.set_name)
                            .map_err(fmt_error)?;
                    }
                }
            }
        }
    }

    Ok(out)
}

fn family_name(family: PairFamily) -> &'static str {
    match family {
        PairFamily::LeftRight => "left_right",
        PairFamily::UpDown => "up_down",
    }
}

fn optional(value: Option<f64>) -> JsonValue {
    match value {
        Some(v) => v.into(),
        None => JsonValue::Null,
    }
}

/// Converts the model into a JsonValue object
pub fn model_json(model: &PbcModel) -> JsonValue {
    let mut root = JsonValue::new_object();

    root["node_sets"] = JsonValue::Array(
        model
            .node_sets
            .iter()
            .map(|set| {
                let mut obj = JsonValue::new_object();
                obj["name"] = set.name.as_str().into();
                obj["label"] = set.label.into();
                obj
            })
            .collect(),
    );

    root["equations"] = JsonValue::Array(
        model
            .equations
            .iter()
            .map(|equation| {
                let mut obj = JsonValue::new_object();
                obj["name"] = equation.name.as_str().into();
                obj["terms"] = JsonValue::Array(
                    equation
                        .terms
                        .iter()
                        .map(|term| {
                            let mut t = JsonValue::new_object();
                            t["coefficient"] = term.coefficient.into();
                            t["node_set"] = term.node_set.as_str().into();
                            t["label"] = term.label.into();
                            t["dof"] = term.dof.number().into();
                            t
                        })
                        .collect(),
                );
                obj
            })
            .collect(),
    );

    root["boundary_conditions"] = JsonValue::Array(
        model
            .boundary_conditions
            .iter()
            .map(|bc| {
                let mut obj = JsonValue::new_object();
                obj["name"] = bc.name.as_str().into();
                obj["set"] = bc.set_name.as_str().into();
                obj["step"] = bc.step.as_str().into();
                obj["label"] = bc.node.label.into();
                match bc.kind {
                    BoundaryKind::Encastre => {
                        obj["type"] = "encastre".into();
                        obj["u1"] = 0.0_f64.into();
                        obj["u2"] = 0.0_f64.into();
                    }
                    BoundaryKind::Displacement { u1, u2 } => {
                        obj["type"] = "displacement".into();
                        obj["u1"] = optional(u1);
                        obj["u2"] = optional(u2);
                    }
                }
                obj
            })
            .collect(),
    );

    root["skipped"] = JsonValue::Array(
        model
            .skipped
            .iter()
            .map(|(family, index)| {
                let mut obj = JsonValue::new_object();
                obj["family"] = family_name(*family).into();
                obj["index"] = (*index).into();
                obj
            })
            .collect(),
    );

    root
}

/// Writes the model to an Abaqus keyword file
///
/// # Arguments
/// * `model` - The generated model
/// * `metadata` - The model metadata
/// * `output` - The output filepath
pub fn inp_output(model: &PbcModel, metadata: &ModelMetadata, output: &str) -> Result<(), PbcError> {
    let contents = render_inp(model, metadata)?;
    write_file(output, &contents)
}

/// Writes the model to a json file
///
/// # Arguments
/// * `model` - The generated model
/// * `output` - The output filepath
pub fn json_output(model: &PbcModel, output: &str) -> Result<(), PbcError> {
    let contents = model_json(model).pretty(2);
    write_file(output, &contents)
}

fn write_file(output: &str, contents: &str) -> Result<(), PbcError> {
    if let Err(err) = std::fs::write(output, contents) {
        return Err(PbcError::PostProcessor(format!(
            "Failed to write {output}: {err}"
        )));
    }

    info!("wrote output to {}", output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::{
        ConstraintEquation, ConstraintTerm, CornerBoundaryCondition, Dof, MismatchPolicy, Node,
        NodeSet,
    };
    use pretty_assertions::assert_eq;

    fn metadata() -> ModelMetadata {
        ModelMetadata {
            rve_length: 1.0,
            rve_breadth: 1.0,
            node_tolerance: 0.1,
            snap_threshold: 1e-5,
            lookup_tolerance: 1e-6,
            edge_tolerance: 1e-5,
            roller_displacement: 1.0,
            instance_name: "Part-1-1".to_owned(),
            step_name: "Step-1".to_owned(),
            on_tolerance_mismatch: MismatchPolicy::Skip,
        }
    }

    fn model() -> PbcModel {
        PbcModel {
            node_sets: vec![
                NodeSet {
                    name: "UpNode-1".to_owned(),
                    label: 6,
                },
                NodeSet {
                    name: "DownNode-1".to_owned(),
                    label: 2,
                },
            ],
            equations: vec![ConstraintEquation {
                name: "Eqn-UD-X-1".to_owned(),
                terms: vec![
                    ConstraintTerm {
                        coefficient: 1.0,
                        node_set: "DownNode-1".to_owned(),
                        label: 2,
                        dof: Dof::U1,
                    },
                    ConstraintTerm {
                        coefficient: -1.0,
                        node_set: "UpNode-1".to_owned(),
                        label: 6,
                        dof: Dof::U1,
                    },
                ],
            }],
            boundary_conditions: vec![
                CornerBoundaryCondition {
                    name: "Fix1".to_owned(),
                    set_name: "Set-Fix-1".to_owned(),
                    step: "Initial".to_owned(),
                    node: Node::new(1, 0.0, 0.0),
                    kind: BoundaryKind::Encastre,
                },
                CornerBoundaryCondition {
                    name: "Y_roll".to_owned(),
                    set_name: "Y_roll".to_owned(),
                    step: "Step-1".to_owned(),
                    node: Node::new(7, 0.0, 1.0),
                    kind: BoundaryKind::Displacement {
                        u1: Some(0.0),
                        u2: None,
                    },
                },
            ],
            skipped: vec![(PairFamily::LeftRight, 3)],
        }
    }

    #[test]
    fn renders_abaqus_keywords() {
        let inp = render_inp(&model(), &metadata()).unwrap();
        assert_eq!(
            inp,
            "** Periodic boundary conditions\n\
             ** 2 node sets, 1 equations, 2 boundary conditions\n\
             *Nset, nset=UpNode-1, instance=Part-1-1\n 6,\n\
             *Nset, nset=DownNode-1, instance=Part-1-1\n 2,\n\
             *Nset, nset=Set-Fix-1, instance=Part-1-1\n 1,\n\
             *Nset, nset=Y_roll, instance=Part-1-1\n 7,\n\
             ** Constraint: Eqn-UD-X-1\n\
             *Equation\n\
             2\n\
             DownNode-1, 1, 1.0\n\
             UpNode-1, 1, -1.0\n\
             ** BC: Fix1, step: Initial\n\
             *Boundary\n\
             Set-Fix-1, ENCASTRE\n\
             ** BC: Y_roll, step: Step-1\n\
             *Boundary\n\
             Y_roll, 1, 1, 0.0\n"
        );
    }

    #[test]
    fn converts_to_json() {
        let value = model_json(&model());

        assert_eq!(value["node_sets"].len(), 2);
        assert_eq!(value["equations"][0]["terms"][1]["coefficient"].as_f64(), Some(-1.0));
        assert_eq!(value["equations"][0]["terms"][1]["dof"].as_u8(), Some(1));
        assert_eq!(value["boundary_conditions"][0]["type"].as_str(), Some("encastre"));
        assert!(value["boundary_conditions"][1]["u2"].is_null());
        assert_eq!(value["skipped"][0]["family"].as_str(), Some("left_right"));
        assert_eq!(value["skipped"][0]["index"].as_usize(), Some(3));
    }

    #[test]
    fn unwritable_path_is_reported() {
        let err = json_output(&model(), "/nonexistent-dir/out.json").unwrap_err();
        assert!(matches!(err, PbcError::PostProcessor(_)));
    }
}
