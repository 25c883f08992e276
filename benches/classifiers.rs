#![feature(test)]

extern crate test;

use test::{Bencher, black_box};
use pcg_rand::Pcg32;
use rand::{Rng, SeedableRng};
use ndarray::prelude::*;

use nearest_class::classifier::*;
use nearest_class::cluster::ClusterFinder;
use nearest_class::probes::{AttributeSelection, ClassSets};

/// Class sets with `n` training and `n / 4` test probes per class, each
/// class offset by its label along every attribute.
fn generate_data(n: usize, d: usize, n_labels: usize, seed: u64) -> ClassSets {
    let mut rng = Pcg32::seed_from_u64(seed);
    let mut probes = |count: usize, offset: f64| {
        Array::from_iter((0..count * d).map(|_| offset + rng.gen::<f64>()))
              .into_shape((d, count))
              .unwrap()
    };

    let mut sets = ClassSets::new();
    for label in 0..n_labels {
        let training = probes(n, label as f64);
        let test = probes(n / 4, label as f64);
        sets.insert_class(&format!("class{}", label), training, test);
    }
    sets
}

#[bench]
fn bench_knn_train(b: &mut Bencher) {
    let sets = generate_data(250, 2, 2, 0);
    let selected = AttributeSelection::all();
    let mut knn = KNN::new(5);

    b.iter(|| {
        let _ = black_box(knn.train(&sets, &selected, Some(5)));
    });
}

#[bench]
fn bench_nm_train(b: &mut Bencher) {
    let sets = generate_data(250, 4, 3, 0);
    let selected: AttributeSelection = (0..4).collect();
    let mut nm = NM::new();

    b.iter(|| {
        let _ = black_box(nm.train(&sets, &selected, None));
    });
}

#[bench]
fn bench_knm_train(b: &mut Bencher) {
    let sets = generate_data(100, 2, 2, 0);
    let selected: AttributeSelection = (0..2).collect();
    let finder = ClusterFinder::seeded(0).with_max_clusters(3);
    let mut knm = KNM::with_cluster_finder(finder);

    b.iter(|| {
        let _ = black_box(knm.train(&sets, &selected, None));
    });
}

#[bench]
fn bench_cluster_finder(b: &mut Bencher) {
    let sets = generate_data(200, 2, 1, 0);
    let probes = sets.get("class0_training").unwrap().clone();

    b.iter(|| {
        let mut finder = ClusterFinder::seeded(0);
        let _ = black_box(finder.assign_to_clusters(&probes.view()));
    });
}
