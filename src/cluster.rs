//! Proximity clustering of inlier sets.
//!
//! Inliers of one fitted surface may come from several disconnected patches
//! (two coplanar walls, say). [`largest_component`] links points closer than
//! `cluster_epsilon` and keeps the biggest linked group. Neighbours are found
//! through a uniform hash grid whose cell side equals `cluster_epsilon`, so a
//! query only inspects the 27 surrounding cells.

use nalgebra::Point3;
use std::collections::HashMap;

type GridKey = (i64, i64, i64);

/// Largest subset of `indices` connected by steps of length at most
/// `cluster_epsilon`. Members keep their order in `indices`.
///
/// A non-positive or non-finite `cluster_epsilon` disables clustering and
/// returns `indices` unchanged.
pub fn largest_component<F>(indices: &[usize], cluster_epsilon: f64, position: F) -> Vec<usize>
where
    F: Fn(usize) -> Point3<f64>,
{
    if indices.len() <= 1 || !(cluster_epsilon.is_finite() && cluster_epsilon > 0.0) {
        return indices.to_vec();
    }
    let inv = 1.0 / cluster_epsilon;
    let key = |p: &Point3<f64>| -> GridKey {
        (
            (p.x * inv).floor() as i64,
            (p.y * inv).floor() as i64,
            (p.z * inv).floor() as i64,
        )
    };

    let positions: Vec<Point3<f64>> = indices.iter().map(|&j| position(j)).collect();
    let mut grid: HashMap<GridKey, Vec<usize>> = HashMap::new();
    for (slot, p) in positions.iter().enumerate() {
        grid.entry(key(p)).or_default().push(slot);
    }

    let eps_sq = cluster_epsilon * cluster_epsilon;
    let mut visited = vec![false; positions.len()];
    let mut best: Vec<usize> = Vec::new();
    let mut unvisited = positions.len();
    let mut stack = Vec::new();
    for start in 0..positions.len() {
        if visited[start] {
            continue;
        }
        // No remaining group can beat the current best.
        if unvisited <= best.len() {
            break;
        }
        visited[start] = true;
        let mut members = vec![start];
        stack.push(start);
        while let Some(s) = stack.pop() {
            let (kx, ky, kz) = key(&positions[s]);
            for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        let Some(bucket) = grid.get(&(kx + dx, ky + dy, kz + dz)) else {
                            continue;
                        };
                        for &t in bucket {
                            if !visited[t] && (positions[t] - positions[s]).norm_squared() <= eps_sq
                            {
                                visited[t] = true;
                                members.push(t);
                                stack.push(t);
                            }
                        }
                    }
                }
            }
        }
        unvisited -= members.len();
        if members.len() > best.len() {
            best = members;
        }
    }

    best.sort_unstable();
    best.into_iter().map(|slot| indices[slot]).collect()
}
