use std::io::Write;

use pcg_rand::Pcg32;
use rand::{Rng, SeedableRng};
use tempfile::NamedTempFile;

use nearest_class::classifier::{Classifier, KNN, NM};
use nearest_class::select::{fisher, sequential_forward};
use nearest_class::split::{bootstrap, holdout, k_fold};
use nearest_class::utils::load_data;

/// Two well separated classes on attribute 1, noise on attributes 0 and 2.
fn write_data() -> NamedTempFile {
    let mut rng = Pcg32::seed_from_u64(11);
    let mut f = NamedTempFile::new().expect("tempfile");
    for (label, centre) in &[("Acer", 0.), ("Quercus", 20.)] {
        for _ in 0..30 {
            writeln!(f, "{},{},{},{}", label,
                     rng.gen_range(0.0..10.0),
                     centre + rng.gen_range(-1.0..1.0),
                     rng.gen_range(0.0..10.0)).unwrap();
        }
    }
    f.flush().unwrap();
    f
}

#[test]
fn load_select_split_train() {
    let f = write_data();
    let classes = load_data(f.path()).unwrap();
    assert_eq!(classes.len(), 2);
    assert_eq!(classes["Acer"].shape(), &[3, 30]);

    let selected = fisher(&classes, 1).unwrap();
    assert_eq!(selected.iter().collect::<Vec<_>>(), vec![1]);
    assert!(sequential_forward(&classes, 2).unwrap().contains(1));

    let mut rng = Pcg32::seed_from_u64(0);
    let sets = holdout(&classes, 0.7, &mut rng).unwrap();
    assert_eq!(NM::new().train(&sets, &selected, None).unwrap(), 100.);
}

#[test]
fn cross_validation_and_bootstrap() {
    let f = write_data();
    let classes = load_data(f.path()).unwrap();
    let selected = vec![1].into();

    let mut rng = Pcg32::seed_from_u64(0);
    for sets in k_fold(&classes, 5, &mut rng).unwrap() {
        assert_eq!(KNN::new(3).train(&sets, &selected, Some(3)).unwrap(), 100.);
    }
    for sets in bootstrap(&classes, 5, &mut rng).unwrap() {
        assert_eq!(KNN::new(3).train(&sets, &selected, Some(3)).unwrap(), 100.);
    }
}
