use crate::detector::DetectParams;
use crate::octree::OctreeOptions;
use crate::shapes::{ShapeKind, ShapeRegistry};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration of the `detect_shapes` tool.
#[derive(Debug, Deserialize)]
pub struct DetectToolConfig {
    /// `x y z nx ny nz` point cloud.
    pub input: PathBuf,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Shape kinds to look for, tried in this order.
    #[serde(default = "default_shapes")]
    pub shapes: Vec<ShapeKind>,
    #[serde(default)]
    pub params: DetectParams,
    #[serde(default)]
    pub octree: OctreeOptions,
    pub output: DetectOutputConfig,
}

impl DetectToolConfig {
    pub fn registry(&self) -> ShapeRegistry {
        ShapeRegistry::from_kinds(&self.shapes)
    }
}

#[derive(Debug, Deserialize)]
pub struct DetectOutputConfig {
    pub result_json: PathBuf,
    /// Optional dump of the points no shape claimed.
    #[serde(default)]
    pub unassigned_xyzn: Option<PathBuf>,
}

fn default_seed() -> u64 {
    42
}

fn default_shapes() -> Vec<ShapeKind> {
    vec![ShapeKind::Plane, ShapeKind::Sphere, ShapeKind::Cylinder]
}

pub fn load_config(path: &Path) -> Result<DetectToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    parse_config(&data).map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

pub fn parse_config(data: &str) -> Result<DetectToolConfig, serde_json::Error> {
    serde_json::from_str(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = parse_config(
            r#"{ "input": "scan.xyzn", "output": { "result_json": "out/shapes.json" } }"#,
        )
        .expect("valid config");
        assert_eq!(cfg.input, PathBuf::from("scan.xyzn"));
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.shapes, default_shapes());
        assert_eq!(cfg.params, DetectParams::default());
        assert_eq!(cfg.octree, OctreeOptions::default());
        assert!(cfg.output.unassigned_xyzn.is_none());
        assert_eq!(cfg.registry().len(), 3);
    }

    #[test]
    fn full_config_overrides_everything() {
        let cfg = parse_config(
            r#"{
                "input": "scan.xyzn",
                "seed": 7,
                "shapes": ["cylinder", "plane"],
                "params": { "probability": 0.05, "min_points": 200, "epsilon": 0.002 },
                "octree": { "bucket_size": 8 },
                "output": { "result_json": "r.json", "unassigned_xyzn": "rest.xyzn" }
            }"#,
        )
        .expect("valid config");
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.shapes, vec![ShapeKind::Cylinder, ShapeKind::Plane]);
        assert_eq!(cfg.params.min_points, Some(200));
        assert_eq!(cfg.params.epsilon, Some(0.002));
        assert_eq!(cfg.octree.bucket_size, 8);
        assert_eq!(cfg.octree.max_depth, OctreeOptions::default().max_depth);
        assert_eq!(cfg.output.unassigned_xyzn, Some(PathBuf::from("rest.xyzn")));
        let kinds: Vec<ShapeKind> = cfg.registry().iter().map(|f| f.kind).collect();
        assert_eq!(kinds, cfg.shapes);
    }

    #[test]
    fn unknown_shape_kind_is_an_error() {
        let err = parse_config(
            r#"{ "input": "a", "shapes": ["cone"], "output": { "result_json": "b" } }"#,
        );
        assert!(err.is_err());
    }
}
