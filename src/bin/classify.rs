use std::process;

use docopt::Docopt;
use pcg_rand::Pcg32;
use rand::SeedableRng;
use serde_derive::Deserialize;
use statrs::statistics::Statistics;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use nearest_class::classifier::{Classifier, KNM, KNN, NM, NN};
use nearest_class::error::{Error, Result};
use nearest_class::probes::{attribute_count, AttributeSelection, ClassSets};
use nearest_class::select::{fisher, sequential_forward};
use nearest_class::split::{bootstrap, holdout, k_fold};
use nearest_class::utils::{load_data, store_accuracies};

const USAGE: &'static str = "
Classify labelled probes and report the accuracy on held-out data.

Each line of <data-file> holds a class label followed by the attributes
of one probe. Probes are split into training and test sets, and the
percentage of test probes assigned to their own class is reported for
each split.

Usage: classify nn [options] <data-file>
       classify knn [--knn=<k>] [options] <data-file>
       classify nm [options] <data-file>
       classify knm [options] <data-file>
       classify (--help | --version)

Options:
    -k, --knn=<k>               Number of neighbours for k-NN [default: 3].
    --split=<method>            Split method: holdout, cross or bootstrap
                                [default: holdout].
    --training=<fraction>       Training fraction for holdout [default: 0.7].
    --folds=<n>                 Number of folds for cross validation
                                [default: 5].
    --trials=<n>                Number of bootstrap trials [default: 20].
    -f, --features=<n>          Number of attributes to select. If not
                                specified, all attributes are used.
    --selector=<name>           Attribute selector for --features: fisher
                                (exhaustive) or sfs (sequential forward)
                                [default: fisher].
    --seed=<seed>               PRNG seed for splitting and clustering.
    -o, --output=<file>         Store the accuracy of each run as CSV.
    -v, --verbose               Log debug information to stderr.
    -h, --help                  Show help.
    --version                   Show the version.
";

#[derive(Deserialize)]
struct Args {
    flag_knn: usize,
    flag_split: String,
    flag_training: f64,
    flag_folds: usize,
    flag_trials: usize,
    flag_features: Option<usize>,
    flag_selector: String,
    flag_seed: Option<u64>,
    flag_output: Option<String>,
    flag_verbose: bool,
    arg_data_file: String,
    cmd_nn: bool,
    cmd_knn: bool,
    cmd_nm: bool,
    cmd_knm: bool,
}

fn main() {
    // Parse args from command line.
    let args: Args = Docopt::new(USAGE)
                            .and_then(|d| d.version(Some(env!("CARGO_PKG_VERSION").to_string()))
                                           .deserialize())
                            .unwrap_or_else(|e| e.exit());

    let filter = if args.flag_verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&args) {
        error!(error = %e, "classification failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let classes = load_data(&args.arg_data_file)?;
    let n_attributes = attribute_count(&classes)?;
    info!(classes = classes.len(), attributes = n_attributes, "loaded {}", args.arg_data_file);

    let mut rng = match args.flag_seed {
        Some(seed) => Pcg32::seed_from_u64(seed),
        None => Pcg32::from_entropy(),
    };

    // Split.
    let runs = match args.flag_split.as_str() {
        "holdout" => vec![holdout(&classes, args.flag_training, &mut rng)?],
        "cross" => k_fold(&classes, args.flag_folds, &mut rng)?,
        "bootstrap" => bootstrap(&classes, args.flag_trials, &mut rng)?,
        other => return Err(Error::InvalidInput(format!("unknown split method `{}`", other))),
    };

    // Select attributes.
    let selected: AttributeSelection = match args.flag_features {
        Some(count) => match args.flag_selector.as_str() {
            "fisher" => fisher(&classes, count)?,
            "sfs" => sequential_forward(&classes, count)?,
            other => return Err(Error::InvalidInput(format!("unknown selector `{}`", other))),
        },
        None => (0..n_attributes).collect(),
    };
    info!(attributes = ?selected.iter().collect::<Vec<_>>(), "selected attributes");

    let (mut classifier, k): (Box<dyn Classifier>, Option<usize>) = if args.cmd_nn {
        (Box::new(NN::new()), None)
    } else if args.cmd_knn {
        (Box::new(KNN::new(args.flag_knn)), Some(args.flag_knn))
    } else if args.cmd_nm {
        (Box::new(NM::new()), None)
    } else if args.cmd_knm {
        (Box::new(KNM::new(args.flag_seed)), None)
    } else {
        unreachable!("docopt accepts one of the classifier commands");
    };

    let completed = train_runs(classifier.as_mut(), &runs, &selected, k)?;
    let accuracies = completed.iter().map(|&(_, accuracy)| accuracy).collect::<Vec<_>>();
    if accuracies.len() > 1 {
        println!("mean: {:.2}% over {} of {} runs", accuracies.iter().mean(),
                 accuracies.len(), runs.len());
    }

    if let Some(ref output) = args.flag_output {
        store_accuracies(&accuracies, output)?;
    }

    Ok(())
}

/// Trains on every run, printing each accuracy, and returns the
/// (1-based run, accuracy) pairs of the runs that completed.
///
/// A run whose split left some class without training or test probes
/// is skipped. Any other error aborts, and so does skipping every run.
fn train_runs(classifier: &mut dyn Classifier, runs: &[ClassSets],
              selected: &AttributeSelection, k: Option<usize>) -> Result<Vec<(usize, f64)>> {
    let mut completed = Vec::with_capacity(runs.len());

    for (run, sets) in runs.iter().enumerate() {
        match classifier.train(sets, selected, k) {
            Ok(accuracy) => {
                println!("run {}: {:.2}%", run + 1, accuracy);
                completed.push((run + 1, accuracy));
            }
            Err(Error::EmptyEvaluationSet(reason)) => {
                warn!(run = run + 1, %reason, "skipping run");
                println!("run {}: skipped ({})", run + 1, reason);
            }
            Err(e) => return Err(e),
        }
    }

    if completed.is_empty() {
        return Err(Error::EmptyEvaluationSet(format!("all {} runs were skipped", runs.len())));
    }

    Ok(completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sets(b_test: ndarray::Array2<f64>) -> ClassSets {
        let mut sets = ClassSets::new();
        sets.insert_class("A", array![[1., 2.]], array![[1.5]]);
        sets.insert_class("B", array![[10., 11.]], b_test);
        sets
    }

    #[test]
    fn runs_without_test_probes_are_skipped() {
        let runs = vec![sets(array![[10.5]]), sets(ndarray::Array2::zeros((1, 0))),
                        sets(array![[1.2]])];
        let mut knn = KNN::new(1);

        let completed = train_runs(&mut knn, &runs, &AttributeSelection::all(), Some(1)).unwrap();
        assert_eq!(completed, vec![(1, 100.), (3, 50.)]);
    }

    #[test]
    fn all_runs_skipped_is_an_error() {
        let runs = vec![sets(ndarray::Array2::zeros((1, 0)))];
        let mut knn = KNN::new(1);

        match train_runs(&mut knn, &runs, &AttributeSelection::all(), Some(1)) {
            Err(Error::EmptyEvaluationSet(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn other_errors_abort() {
        let runs = vec![sets(array![[10.5]]), sets(array![[10.5]])];
        let mut knn = KNN::new(9);

        match train_runs(&mut knn, &runs, &AttributeSelection::all(), Some(9)) {
            Err(Error::InvalidNeighbourCount { k: 9, max: 4 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
