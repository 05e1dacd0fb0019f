use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use shape_detector::PointWithNormal;

/// Regular `side x side` grid on the plane `z = origin[2]`, spanning `size`
/// along x and y from `origin`, with upward normals.
pub fn grid_patch(origin: [f64; 3], size: f64, side: usize) -> Vec<PointWithNormal> {
    assert!(side > 1, "a patch needs at least two points per side");
    let step = size / (side - 1) as f64;
    let mut points = Vec::with_capacity(side * side);
    for i in 0..side {
        for j in 0..side {
            points.push(PointWithNormal::from_arrays(
                [
                    origin[0] + i as f64 * step,
                    origin[1] + j as f64 * step,
                    origin[2],
                ],
                [0.0, 0.0, 1.0],
            ));
        }
    }
    points
}

/// `n` points drawn uniformly on a sphere, with outward normals.
pub fn sphere_points(center: [f64; 3], radius: f64, n: usize, seed: u64) -> Vec<PointWithNormal> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let z: f64 = rng.gen_range(-1.0..1.0);
            let phi = rng.gen_range(0.0..std::f64::consts::TAU);
            let r = (1.0 - z * z).sqrt();
            let dir = [r * phi.cos(), r * phi.sin(), z];
            PointWithNormal::from_arrays(
                [
                    center[0] + radius * dir[0],
                    center[1] + radius * dir[1],
                    center[2] + radius * dir[2],
                ],
                dir,
            )
        })
        .collect()
}

/// `n` points uniform in the unit cube with uniformly random normals.
pub fn noise_points(n: usize, seed: u64) -> Vec<PointWithNormal> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let position = [rng.gen::<f64>(), rng.gen::<f64>(), rng.gen::<f64>()];
            let z: f64 = rng.gen_range(-1.0..1.0);
            let phi = rng.gen_range(0.0..std::f64::consts::TAU);
            let r = (1.0 - z * z).sqrt();
            PointWithNormal::from_arrays(position, [r * phi.cos(), r * phi.sin(), z])
        })
        .collect()
}
