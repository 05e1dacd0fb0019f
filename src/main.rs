use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shape_detector::{DetectParams, PointWithNormal, ShapeDetector, ShapeRegistry};

fn main() {
    env_logger::init();

    // Demo: a 2 x 2 floor patch with a unit sphere resting above it.
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut points = Vec::new();
    for _ in 0..6000 {
        let x = rng.gen_range(-1.0..1.0);
        let y = rng.gen_range(-1.0..1.0);
        points.push(PointWithNormal::from_arrays([x, y, 0.0], [0.0, 0.0, 1.0]));
    }
    for _ in 0..4000 {
        let z: f64 = rng.gen_range(-1.0..1.0);
        let phi = rng.gen_range(0.0..std::f64::consts::TAU);
        let r = (1.0 - z * z).sqrt();
        let n = [r * phi.cos(), r * phi.sin(), z];
        points.push(PointWithNormal::from_arrays([n[0], n[1], n[2] + 1.5], n));
    }

    let mut det = ShapeDetector::with_seed(7);
    det.set_input(points);
    det.set_shape_registry(ShapeRegistry::with_defaults());
    let params = DetectParams {
        min_points: Some(300),
        epsilon: Some(0.01),
        cluster_epsilon: Some(0.1),
        ..Default::default()
    };
    if !det.detect(&params) {
        println!("detection did not run");
        return;
    }
    for (id, shape) in det.shapes().iter().enumerate() {
        println!("#{id}: {} points={}", shape.parameters(), shape.len());
    }
    if let Some(report) = det.report() {
        println!(
            "termination={:?} unassigned={} rounds={} detect_ms={:.3}",
            report.termination, report.unassigned_points, report.rounds, report.detect_ms
        );
    }
}
