use json::JsonValue;
use tracing::info;

use crate::{
    datatypes::{EdgeRole, MismatchPolicy, ModelMetadata, Node},
    error::PbcError,
    mesher::EdgeNodeSets,
};

/// Reference pairing tolerance, tied to the expected mesh density
pub const DEFAULT_NODE_TOLERANCE: f64 = 0.05 / 20.0;
/// Drift left on the x = 0 edge by wavy partitions
pub const DEFAULT_SNAP_THRESHOLD: f64 = 1e-5;
pub const DEFAULT_LOOKUP_TOLERANCE: f64 = 1e-6;
pub const DEFAULT_ROLLER_DISPLACEMENT: f64 = 1.0;
pub const DEFAULT_INSTANCE_NAME: &str = "Part-1-1";
pub const DEFAULT_STEP_NAME: &str = "Step-1";

/// Parses the input json into a JsonValue object
///
/// # Arguments
/// * `input_file` - The path to the input file
///
/// # Returns
/// A JsonValue object
pub fn load_input_file(input_file: &str) -> Result<JsonValue, PbcError> {
    let file_string = match std::fs::read_to_string(input_file) {
        Ok(f) => f,
        Err(err) => {
            return Err(PbcError::Input(format!(
                "Unable to open input file {input_file}: {err}"
            )))
        }
    };

    parse_input(&file_string)
}

/// Parses input json text and checks the required sections
pub fn parse_input(contents: &str) -> Result<JsonValue, PbcError> {
    let input_json = match json::parse(contents) {
        Ok(f) => f,
        Err(err) => return Err(PbcError::Input(format!("Error in input file json: {err}"))),
    };

    if !input_json.has_key("metadata") {
        return Err(PbcError::Input(
            "Input json missing metadata field".to_string(),
        ));
    }

    Ok(input_json)
}

/// Reads an optional positive number, falling back to `default`
fn positive_or(section: &JsonValue, key: &str, default: f64) -> Result<f64, PbcError> {
    if !section.has_key(key) {
        return Ok(default);
    }
    match section[key].as_f64() {
        Some(v) if v > 0.0 && v.is_finite() => Ok(v),
        Some(v) => Err(PbcError::Input(format!(
            "Field {key} must be positive, got {v}"
        ))),
        None => Err(PbcError::Input(format!("Bad value for {key}"))),
    }
}

fn string_or(section: &JsonValue, key: &str, default: &str) -> Result<String, PbcError> {
    if !section.has_key(key) {
        return Ok(default.to_owned());
    }
    match section[key].as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_owned()),
        _ => Err(PbcError::Input(format!("Bad value for {key}"))),
    }
}

/// Derives the cell extents from the platelet unit-cell parameters
///
/// # Arguments
/// * `unit_cell` - The `unit_cell` section of the input json
///
/// # Returns
/// The cell length and breadth, in that order
fn unit_cell_extents(unit_cell: &JsonValue) -> Result<(f64, f64), PbcError> {
    let mut values = [0.0; 4];
    let keys = [
        "platelet_length",
        "platelet_width",
        "centre_width",
        "matrix_thickness",
    ];
    for (value, key) in values.iter_mut().zip(keys) {
        *value = match unit_cell[key].as_f64() {
            Some(v) if v > 0.0 => v,
            _ => {
                return Err(PbcError::Input(format!(
                    "Input json unit_cell section missing or bad {key}"
                )))
            }
        };
    }
    let [l, we, wf, t] = values;
    if we < wf {
        return Err(PbcError::Input(format!(
            "Input json unit_cell centre_width ({wf}) exceeds platelet_width ({we})"
        )));
    }

    let x = 0.5 * (we - wf) * (1.0 + t / l);
    Ok((l + t, 2.0 * (wf + x + t)))
}

/// Parses Model Metadata from the input_json
///
/// # Arguments
/// * `input_json`: The input file as a JsonValue object
///
/// # Returns
/// A ModelMetadata instance
pub fn parse_input_metadata(input_json: &JsonValue) -> Result<ModelMetadata, PbcError> {
    let metadata = &input_json["metadata"];

    let (rve_length, rve_breadth) =
        if metadata.has_key("rve_length") || metadata.has_key("rve_breadth") {
            let length = metadata["rve_length"].as_f64();
            let breadth = metadata["rve_breadth"].as_f64();
            match (length, breadth) {
                (Some(l), Some(b)) if l > 0.0 && b > 0.0 => (l, b),
                _ => {
                    return Err(PbcError::Input(
                        "Input json needs positive rve_length and rve_breadth".to_owned(),
                    ))
                }
            }
        } else if input_json.has_key("unit_cell") {
            unit_cell_extents(&input_json["unit_cell"])?
        } else {
            return Err(PbcError::Input(
                "Input json missing rve extents and unit_cell section".to_owned(),
            ));
        };

    let on_tolerance_mismatch = match metadata["on_tolerance_mismatch"].as_str() {
        None if !metadata.has_key("on_tolerance_mismatch") => MismatchPolicy::Fail,
        Some("fail") => MismatchPolicy::Fail,
        Some("skip") => MismatchPolicy::Skip,
        other => {
            return Err(PbcError::Input(format!(
                "Unrecognized on_tolerance_mismatch {other:?}, expected fail or skip"
            )))
        }
    };

    let roller_displacement = match metadata["roller_displacement"].as_f64() {
        Some(v) => v,
        None if !metadata.has_key("roller_displacement") => DEFAULT_ROLLER_DISPLACEMENT,
        None => {
            return Err(PbcError::Input(
                "Bad value for roller_displacement".to_owned(),
            ))
        }
    };

    let snap_threshold = positive_or(metadata, "snap_threshold", DEFAULT_SNAP_THRESHOLD)?;
    let lookup_tolerance = positive_or(metadata, "lookup_tolerance", DEFAULT_LOOKUP_TOLERANCE)?;

    // left edge drift below the snap threshold must still select the node
    let edge_tolerance = positive_or(
        metadata,
        "edge_tolerance",
        snap_threshold.max(lookup_tolerance),
    )?;
    if edge_tolerance < snap_threshold {
        return Err(PbcError::Input(format!(
            "Field edge_tolerance ({edge_tolerance}) must not be below snap_threshold ({snap_threshold})"
        )));
    }

    Ok(ModelMetadata {
        rve_length,
        rve_breadth,
        node_tolerance: positive_or(metadata, "node_tolerance", DEFAULT_NODE_TOLERANCE)?,
        snap_threshold,
        lookup_tolerance,
        edge_tolerance,
        roller_displacement,
        instance_name: string_or(metadata, "instance_name", DEFAULT_INSTANCE_NAME)?,
        step_name: string_or(metadata, "step_name", DEFAULT_STEP_NAME)?,
        on_tolerance_mismatch,
    })
}

fn parse_edge(role: EdgeRole, edge_json: &JsonValue) -> Result<Vec<Node>, PbcError> {
    if !edge_json.is_array() {
        return Err(PbcError::Input(format!("Edge {role} must be a list of nodes")));
    }

    let mut nodes: Vec<Node> = Vec::with_capacity(edge_json.len());
    for (i, node_json) in edge_json.members().enumerate() {
        let label = node_json["label"].as_u64();
        let x = node_json["x"].as_f64();
        let y = node_json["y"].as_f64();

        match (label, x, y) {
            (Some(label), Some(x), Some(y)) => nodes.push(Node::new(label, x, y)),
            _ => {
                return Err(PbcError::Input(format!(
                    "Node {i} on edge {role} needs integer label and numeric x, y"
                )))
            }
        }
    }

    Ok(nodes)
}

/// Parses the inline `edges` section, if present
///
/// # Arguments
/// * `input_json` - The input file as a JsonValue object
///
/// # Returns
/// The four edge node lists, or None when the input carries no edges
pub fn parse_input_edges(input_json: &JsonValue) -> Result<Option<EdgeNodeSets>, PbcError> {
    if !input_json.has_key("edges") {
        return Ok(None);
    }
    let edges_json = &input_json["edges"];

    let mut sets = EdgeNodeSets::default();
    for (role, key) in [
        (EdgeRole::Up, "top"),
        (EdgeRole::Down, "bottom"),
        (EdgeRole::Left, "left"),
        (EdgeRole::Right, "right"),
    ] {
        if !edges_json.has_key(key) {
            return Err(PbcError::Input(format!(
                "Input json edges section missing {key} field"
            )));
        }
        sets.insert(role, parse_edge(role, &edges_json[key])?);
    }

    info!(
        "loaded {} boundary nodes from input file",
        EdgeRole::ALL.iter().map(|r| sets.get(*r).len()).sum::<usize>()
    );

    Ok(Some(sets))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_defaults_are_applied() {
        let input = parse_input(r#"{"metadata": {"rve_length": 2.0, "rve_breadth": 1.0}}"#)
            .unwrap();
        let metadata = parse_input_metadata(&input).unwrap();

        assert_eq!(metadata.rve_length, 2.0);
        assert_eq!(metadata.rve_breadth, 1.0);
        assert!((metadata.node_tolerance - 0.0025).abs() < 1e-15);
        assert_eq!(metadata.snap_threshold, 1e-5);
        assert_eq!(metadata.edge_tolerance, 1e-5);
        assert_eq!(metadata.roller_displacement, 1.0);
        assert_eq!(metadata.instance_name, "Part-1-1");
        assert_eq!(metadata.step_name, "Step-1");
        assert_eq!(metadata.on_tolerance_mismatch, MismatchPolicy::Fail);
    }

    #[test]
    fn extents_derive_from_unit_cell() {
        let input = parse_input(
            r#"{
                "metadata": {"on_tolerance_mismatch": "skip"},
                "unit_cell": {
                    "platelet_length": 5e-3,
                    "platelet_width": 1e-3,
                    "centre_width": 0.6e-3,
                    "matrix_thickness": 0.163e-3
                }
            }"#,
        )
        .unwrap();
        let metadata = parse_input_metadata(&input).unwrap();

        let x = 0.5 * (1e-3 - 0.6e-3) * (1.0 + 0.163e-3 / 5e-3);
        assert!((metadata.rve_length - 5.163e-3).abs() < 1e-12);
        assert!((metadata.rve_breadth - 2.0 * (0.6e-3 + x + 0.163e-3)).abs() < 1e-12);
        assert_eq!(metadata.on_tolerance_mismatch, MismatchPolicy::Skip);
    }

    #[test]
    fn edge_tolerance_covers_the_snap_threshold() {
        let input = parse_input(
            r#"{"metadata": {"rve_length": 1.0, "rve_breadth": 1.0, "lookup_tolerance": 1e-3}}"#,
        )
        .unwrap();
        assert_eq!(parse_input_metadata(&input).unwrap().edge_tolerance, 1e-3);

        let input = parse_input(
            r#"{"metadata": {"rve_length": 1.0, "rve_breadth": 1.0, "edge_tolerance": 2e-5}}"#,
        )
        .unwrap();
        assert_eq!(parse_input_metadata(&input).unwrap().edge_tolerance, 2e-5);
    }

    #[test]
    fn centre_wider_than_platelet_is_rejected() {
        let input = parse_input(
            r#"{
                "metadata": {},
                "unit_cell": {
                    "platelet_length": 5e-3,
                    "platelet_width": 0.6e-3,
                    "centre_width": 1e-3,
                    "matrix_thickness": 0.163e-3
                }
            }"#,
        )
        .unwrap();
        assert!(matches!(
            parse_input_metadata(&input),
            Err(PbcError::Input(_))
        ));
    }

    #[test]
    fn missing_sections_are_rejected() {
        assert!(matches!(parse_input("{}"), Err(PbcError::Input(_))));
        assert!(matches!(parse_input("not json"), Err(PbcError::Input(_))));

        let input = parse_input(r#"{"metadata": {}}"#).unwrap();
        assert!(matches!(
            parse_input_metadata(&input),
            Err(PbcError::Input(_))
        ));
    }

    #[test]
    fn bad_values_are_rejected() {
        for metadata in [
            r#"{"rve_length": 1.0, "rve_breadth": -1.0}"#,
            r#"{"rve_length": 1.0, "rve_breadth": 1.0, "node_tolerance": 0}"#,
            r#"{"rve_length": 1.0, "rve_breadth": 1.0, "on_tolerance_mismatch": "maybe"}"#,
            r#"{"rve_length": 1.0, "rve_breadth": 1.0, "step_name": ""}"#,
            r#"{"rve_length": 1.0, "rve_breadth": 1.0, "edge_tolerance": 1e-6}"#,
        ] {
            let input = parse_input(&format!(r#"{{"metadata": {metadata}}}"#)).unwrap();
            assert!(
                matches!(parse_input_metadata(&input), Err(PbcError::Input(_))),
                "{metadata} should be rejected"
            );
        }
    }

    #[test]
    fn edges_are_parsed_per_role() {
        let input = parse_input(
            r#"{
                "metadata": {"rve_length": 1.0, "rve_breadth": 1.0},
                "edges": {
                    "top": [{"label": 1, "x": 0.0, "y": 1.0}],
                    "bottom": [{"label": 2, "x": 0.0, "y": 0.0}],
                    "left": [],
                    "right": [{"label": 3, "x": 1.0, "y": 0.5}]
                }
            }"#,
        )
        .unwrap();
        let sets = parse_input_edges(&input).unwrap().unwrap();

        assert_eq!(sets.get(EdgeRole::Up), &[Node::new(1, 0.0, 1.0)]);
        assert_eq!(sets.get(EdgeRole::Down), &[Node::new(2, 0.0, 0.0)]);
        assert!(sets.get(EdgeRole::Left).is_empty());
        assert_eq!(sets.get(EdgeRole::Right), &[Node::new(3, 1.0, 0.5)]);
    }

    #[test]
    fn malformed_edge_node_is_rejected() {
        let input = parse_input(
            r#"{
                "metadata": {},
                "edges": {"top": [{"label": 1, "x": 0.0}], "bottom": [], "left": [], "right": []}
            }"#,
        )
        .unwrap();
        assert!(matches!(parse_input_edges(&input), Err(PbcError::Input(_))));

        let input = parse_input(r#"{"metadata": {}}"#).unwrap();
        assert_eq!(parse_input_edges(&input), Ok(None));
    }
}
