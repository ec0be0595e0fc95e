use approx::assert_abs_diff_eq;
use ndarray::{array, Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::estimators::hyperparams::ImportanceType;
use crate::tree::*;

fn limits(max_depth: usize) -> TreeLimits {
    TreeLimits {
        max_depth,
        min_samples_split: 2,
        min_samples_leaf: 1,
    }
}

#[test]
fn test_arena_routing() {
    let tree = Tree {
        nodes: vec![
            Node::Split {
                feature: 1,
                threshold: 0.5,
                left: 1,
                right: 2,
            },
            Node::Leaf { value: -1. },
            Node::Leaf { value: 1. },
        ],
    };
    let x = array![[9., 0.5], [9., 0.6], [-9., 0.]];
    assert_eq!(tree.predict(x.view()), array![-1., 1., -1.]);
    assert_eq!(tree.depth(), 1);
    assert_eq!(tree.n_leaves(), 2);
}

#[test]
fn test_step_function_is_recovered() {
    let x = Array2::from_shape_fn((10, 1), |(i, _)| i as f64);
    let y = Array1::from_shape_fn(10, |i| if i < 4 { 1. } else { 3. });
    let mut rng = StdRng::seed_from_u64(0);

    let member = VarianceTreeBuilder::new(x.view(), y.view(), limits(5), 1, &mut rng)
        .build((0..10).collect());

    assert_eq!(member.tree.depth(), 1);
    match member.tree.nodes()[0] {
        Node::Split {
            feature, threshold, ..
        } => {
            assert_eq!(feature, 0);
            assert_abs_diff_eq!(threshold, 3.5);
        }
        _ => panic!("root should be a split"),
    }
    assert_eq!(member.tree.predict(x.view()), y);
    // Variance 0.96 fully removed on 10 rows.
    assert_abs_diff_eq!(member.importances[0], 9.6, epsilon = 1e-9);
}

#[test]
fn test_constant_target_yields_single_leaf() {
    let x = array![[1., 2.], [3., 4.], [5., 6.]];
    let y = array![7., 7., 7.];
    let mut rng = StdRng::seed_from_u64(0);
    let member = VarianceTreeBuilder::new(x.view(), y.view(), limits(3), 2, &mut rng)
        .build(vec![0, 1, 2]);

    assert_eq!(member.tree.nodes(), &[Node::Leaf { value: 7. }]);
    assert_eq!(member.importances, array![0., 0.]);
}

#[test]
fn test_depth_and_leaf_size_limits() {
    let x = Array2::from_shape_fn((32, 2), |(i, j)| ((i * (j + 3)) % 32) as f64);
    let y = Array1::from_shape_fn(32, |i| (i as f64).sin());
    let mut rng = StdRng::seed_from_u64(1);
    let member = VarianceTreeBuilder::new(
        x.view(),
        y.view(),
        TreeLimits {
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 5,
        },
        2,
        &mut rng,
    )
    .build((0..32).collect());

    assert!(member.tree.depth() <= 3);
    assert!(member.tree.n_leaves() <= 6);
    assert!(member.importances.iter().all(|&v| v >= 0.));
}

#[test]
fn test_newton_tree_leaf_values() {
    let x = Array2::from_shape_fn((6, 1), |(i, _)| i as f64);
    // gradient = prediction - target with a null prediction
    let gradients = array![-1., -1., -1., 2., 2., 2.];
    let hessians = Array1::ones(6);
    let member = NewtonTreeBuilder::new(
        x.view(),
        gradients.view(),
        hessians.view(),
        vec![0],
        NewtonLimits {
            max_depth: 2,
            min_child_weight: 1.,
            gamma: 0.,
        },
        ImportanceType::Weight,
    )
    .build((0..6).collect());

    let pred = member.tree.predict(x.view());
    assert_abs_diff_eq!(pred[0], 3. / (3. + HESSIAN_EPSILON), epsilon = 1e-12);
    assert_abs_diff_eq!(pred[5], -6. / (3. + HESSIAN_EPSILON), epsilon = 1e-12);
    assert_eq!(member.importances, array![1.]);
}

#[test]
fn test_newton_tree_gamma_prunes() {
    let x = Array2::from_shape_fn((6, 1), |(i, _)| i as f64);
    let gradients = array![-1., -1., -1., 2., 2., 2.];
    let hessians = Array1::ones(6);
    let member = NewtonTreeBuilder::new(
        x.view(),
        gradients.view(),
        hessians.view(),
        vec![0],
        NewtonLimits {
            max_depth: 2,
            min_child_weight: 1.,
            gamma: 100.,
        },
        ImportanceType::Gain,
    )
    .build((0..6).collect());

    assert_eq!(member.tree.nodes().len(), 1);
    assert_eq!(member.importances, array![0.]);
}

#[test]
fn test_newton_tree_min_child_weight() {
    let x = Array2::from_shape_fn((6, 1), |(i, _)| i as f64);
    // Isolating the first row has the largest gain.
    let gradients = array![-10., 1., 1., 1., 1., 1.];
    let hessians = Array1::ones(6);
    let grow = |min_child_weight: f64| {
        NewtonTreeBuilder::new(
            x.view(),
            gradients.view(),
            hessians.view(),
            vec![0],
            NewtonLimits {
                max_depth: 1,
                min_child_weight,
                gamma: 0.,
            },
            ImportanceType::Weight,
        )
        .build((0..6).collect())
    };
    let root_threshold = |member: &EnsembleMember<f64>| match member.tree.nodes()[0] {
        Node::Split { threshold, .. } => threshold,
        _ => panic!("root should be a split"),
    };

    assert_abs_diff_eq!(root_threshold(&grow(1.)), 0.5);

    // Both children need a hessian sum of at least 2.
    let member = grow(2.);
    assert_abs_diff_eq!(root_threshold(&member), 1.5);
    let pred = member.tree.predict(x.view());
    assert_eq!(pred[0], pred[1]);
    assert!(pred[0] != pred[2]);
}

#[test]
fn test_total_importances() {
    let members = vec![
        EnsembleMember {
            tree: Tree::leaf(0.),
            importances: array![1., 0.],
        },
        EnsembleMember {
            tree: Tree::leaf(0.),
            importances: array![0.5, 2.],
        },
    ];
    assert_eq!(total_importances(&members, 2), array![1.5, 2.]);
}
