use super::*;
use crate::candidate::Candidate;
use crate::points::{DirectAccessor, IndexedAccessor};
use crate::shapes::Plane;
use crate::types::PointWithNormal;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_store(n: usize, seed: u64) -> PointStore {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    PointStore::new(
        (0..n)
            .map(|_| {
                PointWithNormal::from_arrays(
                    [
                        rng.gen_range(-1.0..3.0),
                        rng.gen_range(0.0..1.0),
                        rng.gen_range(-0.5..0.5),
                    ],
                    [0.0, 0.0, 1.0],
                )
            })
            .collect(),
    )
}

fn grid_plane_store(side: usize, z: f64) -> PointStore {
    let mut records = Vec::with_capacity(side * side);
    for i in 0..side {
        for j in 0..side {
            records.push(PointWithNormal::from_arrays(
                [i as f64 / side as f64, j as f64 / side as f64, z],
                [0.0, 0.0, 1.0],
            ));
        }
    }
    PointStore::new(records)
}

#[test]
fn empty_input_builds_no_tree() {
    let mut store = PointStore::default();
    let tree = Octree::build(IndexedAccessor::new(0), &mut store, OctreeOptions::default());
    assert!(tree.root().is_none());
    assert_eq!(tree.diagonal(), 0.0);
    assert!(tree
        .points_in_cell_containing_point(&Point3::origin(), 0, &[])
        .is_none());
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    assert!(tree
        .draw_samples_from_cell_containing_point(&Point3::origin(), 0, 1, &[], &mut rng)
        .is_none());
}

#[test]
fn cells_contain_their_points_and_children_partition_parent() {
    let mut store = random_store(2000, 7);
    let tree = Octree::build(IndexedAccessor::new(2000), &mut store, OctreeOptions::default());
    let w = tree.half_width();
    for cell in tree.cells() {
        let half = tree.cell_half_width(cell.level);
        for i in cell.range() {
            let p = store.get(tree.index(i)).position;
            let d = (p - cell.center).abs().max();
            assert!(
                d <= half + 1e-9 * w,
                "point {p:?} outside level-{} cell at {:?} (d={d}, half={half})",
                cell.level,
                cell.center
            );
        }
        if !cell.is_leaf() {
            let mut children: Vec<&Cell> = cell
                .children
                .iter()
                .flatten()
                .map(|&c| &tree.cells()[c])
                .collect();
            children.sort_by_key(|c| c.first);
            assert_eq!(children.first().map(|c| c.first), Some(cell.first));
            assert_eq!(children.last().map(|c| c.last), Some(cell.last));
            for pair in children.windows(2) {
                assert_eq!(pair[0].last, pair[1].first, "children must tile the parent range");
            }
            for child in &children {
                assert_eq!(child.level, cell.level + 1);
            }
        }
    }
    let leaf_total: usize = tree.leaf_cells().map(Cell::size).sum();
    assert_eq!(leaf_total, 2000);
}

#[test]
fn leaves_respect_bucket_size_or_depth_limit() {
    let mut store = random_store(500, 3);
    let options = OctreeOptions {
        bucket_size: 4,
        max_depth: 6,
    };
    let tree = Octree::build(IndexedAccessor::new(500), &mut store, options);
    for leaf in tree.leaf_cells() {
        assert!(
            leaf.size() <= options.bucket_size || leaf.level == options.max_depth,
            "leaf of size {} at level {}",
            leaf.size(),
            leaf.level
        );
    }
    assert!(tree.max_level() <= options.max_depth);
}

#[test]
fn identical_points_terminate_at_depth_limit() {
    let mut store = PointStore::new(vec![
        PointWithNormal::from_arrays([1.0, 1.0, 1.0], [0.0, 0.0, 1.0]);
        64
    ]);
    let tree = Octree::build(IndexedAccessor::new(64), &mut store, OctreeOptions::default());
    assert_eq!(tree.max_level(), DEFAULT_MAX_DEPTH);
    assert_eq!(tree.cells().len(), DEFAULT_MAX_DEPTH + 1, "a single chain of cells");
}

#[test]
fn tree_reports_tight_bounds_and_its_options() {
    let mut store = random_store(500, 13);
    let options = OctreeOptions {
        bucket_size: 4,
        max_depth: 6,
    };
    let tree = Octree::build(IndexedAccessor::new(500), &mut store, options);
    assert_eq!(tree.options(), options);
    assert!(tree.max_level() <= 6);

    let bbox = tree.bounding_box().expect("non-empty tree");
    for p in store.records() {
        for axis in 0..3 {
            assert!(bbox.min[axis] <= p.position[axis] && p.position[axis] <= bbox.max[axis]);
        }
    }
    assert!(bbox.min.x >= -1.0 && bbox.max.x < 3.0);
    assert!((tree.diagonal() - bbox.diagonal()).abs() < 1e-12);
}

#[test]
fn direct_tree_reorders_only_its_range() {
    let mut store = random_store(300, 11);
    let before: Vec<PointWithNormal> = store.records()[200..].to_vec();
    let tree = Octree::build(DirectAccessor::new(0, 200), &mut store, OctreeOptions::default());
    assert_eq!(tree.size(), 200);
    assert_eq!(&store.records()[200..], before.as_slice());
    for i in 0..200 {
        assert_eq!(tree.index(i), i);
    }
}

#[test]
fn cell_lookup_finds_the_query_point() {
    let mut store = random_store(1000, 5);
    let tree = Octree::build(IndexedAccessor::new(1000), &mut store, OctreeOptions::default());
    let shape_index = vec![None; 1000];
    let target = 123;
    let query = store.get(target).position;
    for level in 0..=tree.max_level() {
        let members = tree
            .points_in_cell_containing_point(&query, level, &shape_index)
            .expect("query is a stored point");
        assert!(members.contains(&target), "level {level} cell misses the query point");
    }
    let root = tree
        .points_in_cell_containing_point(&query, 0, &shape_index)
        .expect("root exists");
    assert_eq!(root.len(), 1000);
}

#[test]
fn cell_queries_skip_assigned_points() {
    let mut store = grid_plane_store(10, 0.0);
    let tree = Octree::build(IndexedAccessor::new(100), &mut store, OctreeOptions::default());
    let mut shape_index = vec![None; 100];
    for slot in shape_index.iter_mut().take(98) {
        *slot = Some(0);
    }
    let query = store.get(0).position;
    let mut free = tree
        .points_in_cell_containing_point(&query, 0, &shape_index)
        .expect("root exists");
    free.sort_unstable();
    assert_eq!(free, vec![98, 99]);

    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let drawn = tree
        .draw_samples_from_cell_containing_point(&query, 0, 2, &shape_index, &mut rng)
        .expect("two free points remain");
    let mut sorted = drawn.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![98, 99]);
    assert!(tree
        .draw_samples_from_cell_containing_point(&query, 0, 3, &shape_index, &mut rng)
        .is_none());
}

#[test]
fn drawn_samples_are_distinct_and_local() {
    let mut store = random_store(4000, 21);
    let tree = Octree::build(IndexedAccessor::new(4000), &mut store, OctreeOptions::default());
    let shape_index = vec![None; 4000];
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let query = store.get(17).position;
    let level = 2;
    let cell = &tree.cells()[tree.cell_containing_point(&query, level).expect("cell")];
    let half = tree.cell_half_width(cell.level);
    for _ in 0..50 {
        let sample = tree
            .draw_samples_from_cell_containing_point(&query, level, 3, &shape_index, &mut rng)
            .expect("level-2 cell of 4000 points has three members");
        assert_eq!(sample.len(), 3);
        assert!(sample[0] != sample[1] && sample[1] != sample[2] && sample[0] != sample[2]);
        for &j in &sample {
            let d = (store.get(j).position - cell.center).abs().max();
            assert!(d <= half * (1.0 + 1e-9), "sample outside the seed cell");
        }
    }
}

#[test]
fn pruned_score_matches_brute_force() {
    let mut store = random_store(3000, 13);
    // Lay a third of the cloud on z = 0.1.
    for pos in 0..1000 {
        let rec = store.get_mut(pos);
        rec.position.z = 0.1;
    }
    let tree = Octree::build(IndexedAccessor::new(3000), &mut store, OctreeOptions::default());
    let shape_index = vec![None; 3000];
    let plane = Plane {
        normal: nalgebra::Vector3::z(),
        d: -0.1,
    };
    let epsilon = 0.02;

    let mut candidate = Candidate::new(Box::new(plane.clone()));
    let added = tree.score(&mut candidate, &store, &shape_index, epsilon, 0.9);
    let brute = (0..3000)
        .filter(|&j| {
            let p = store.get(j);
            (p.position.z - 0.1).abs() <= epsilon
        })
        .count();
    assert_eq!(added, brute);
    assert_eq!(candidate.score(), brute);
    assert!(added >= 1000);
}
