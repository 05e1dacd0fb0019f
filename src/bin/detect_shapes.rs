use serde::Serialize;
use shape_detector::config::detect;
use shape_detector::io::{load_xyzn, write_json_file, write_xyzn};
use shape_detector::{DetectionReport, PointWithNormal, ShapeDetector, ShapeKind, ShapeParameters};
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = detect::load_config(Path::new(&config_path))?;

    let points = load_xyzn(&config.input)?;
    if points.is_empty() {
        return Err(format!("{} holds no points", config.input.display()));
    }
    let mut detector = ShapeDetector::with_seed(config.seed);
    detector.set_input(points.clone());
    detector.set_octree_options(config.octree);
    detector.set_shape_registry(config.registry());
    if !detector.detect(&config.params) {
        return Err("Detection did not run (no shape kinds configured?)".to_string());
    }
    let report = detector
        .report()
        .cloned()
        .ok_or("Detector produced no report")?;

    let output = DetectShapesOutput {
        input: config.input.display().to_string(),
        seed: config.seed,
        shape_kinds: config.shapes.clone(),
        shapes: detector
            .shapes()
            .iter()
            .map(|s| ShapeOutput {
                kind: s.kind(),
                parameters: s.parameters(),
                indices: s.indices().to_vec(),
            })
            .collect(),
        unassigned: detector.number_of_unassigned_points(),
        report,
    };
    write_json_file(&config.output.result_json, &output)?;

    if let Some(path) = &config.output.unassigned_xyzn {
        write_unassigned(path, &points, &detector)?;
    }

    println!(
        "Detected {} shapes ({} of {} points unassigned) in {:.2} ms; wrote {}",
        output.shapes.len(),
        output.unassigned,
        points.len(),
        output.report.detect_ms,
        config.output.result_json.display()
    );
    Ok(())
}

fn write_unassigned(
    path: &Path,
    points: &[PointWithNormal],
    detector: &ShapeDetector,
) -> Result<(), String> {
    let rest = detector.indices_of_unassigned_points().map(|i| &points[i]);
    write_xyzn(path, rest)
}

fn usage() -> String {
    "Usage: detect_shapes <config.json>".to_string()
}

#[derive(Serialize)]
struct DetectShapesOutput {
    input: String,
    seed: u64,
    shape_kinds: Vec<ShapeKind>,
    shapes: Vec<ShapeOutput>,
    unassigned: usize,
    report: DetectionReport,
}

#[derive(Serialize)]
struct ShapeOutput {
    kind: ShapeKind,
    parameters: ShapeParameters,
    indices: Vec<usize>,
}
