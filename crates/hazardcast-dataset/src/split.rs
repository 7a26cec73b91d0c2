//! Train/test partitioning.
//!
//! Two independent strategies:
//!
//! - Chronological: everything strictly before the split date trains,
//!   the rest tests. Matches how the model is used (train on the past,
//!   score the future) but can concentrate rare positives in one side.
//! - Stratified random: shuffles within each label class and carves off
//!   the test fraction per class, preserving the positive rate on both
//!   sides. Seeded for reproducibility.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;

use crate::assembler::Sample;
use crate::error::{DatasetError, DatasetResult};

/// Split on the target date: `target_date < split_date` trains.
pub fn chronological_split(
    samples: Vec<Sample>,
    split_date: DateTime<Utc>,
) -> (Vec<Sample>, Vec<Sample>) {
    let (train, test): (Vec<Sample>, Vec<Sample>) = samples
        .into_iter()
        .partition(|s| s.target_date < split_date);

    info!(
        train = train.len(),
        test = test.len(),
        %split_date,
        "chronological split"
    );
    (train, test)
}

/// Seeded random split preserving the label balance in both partitions.
///
/// `test_fraction` must be within (0, 1). Per class, the first
/// `round(len * test_fraction)` shuffled samples go to test.
pub fn stratified_split(
    samples: Vec<Sample>,
    test_fraction: f64,
    seed: u64,
) -> DatasetResult<(Vec<Sample>, Vec<Sample>)> {
    if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
        return Err(DatasetError::InvalidSplit(format!(
            "test_fraction must be within (0, 1), got {test_fraction}"
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (mut positives, mut negatives): (Vec<Sample>, Vec<Sample>) =
        samples.into_iter().partition(|s| s.label == 1);
    positives.shuffle(&mut rng);
    negatives.shuffle(&mut rng);

    let mut train = Vec::new();
    let mut test = Vec::new();
    for class in [positives, negatives] {
        let take = ((class.len() as f64) * test_fraction).round() as usize;
        for (i, sample) in class.into_iter().enumerate() {
            if i < take {
                test.push(sample);
            } else {
                train.push(sample);
            }
        }
    }

    info!(
        train = train.len(),
        test = test.len(),
        test_fraction,
        seed,
        "stratified split"
    );
    Ok((train, test))
}
