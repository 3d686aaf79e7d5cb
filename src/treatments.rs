use serde::Deserialize;

use crate::eval::CONTROL;
use crate::hash::bucket;

/// A treatment and the percentage of buckets it receives.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Partition {
    pub treatment: String,
    pub size: u32,
}

impl Partition {
    pub fn new(treatment: impl Into<String>, size: u32) -> Self {
        Partition {
            treatment: treatment.into(),
            size,
        }
    }
}

/// The distribution of buckets over a condition's treatments.
///
/// Partition sizes are turned into cumulative upper bounds when the flag is parsed: sizes
/// `[5, 95]` give bounds `[5, 100]`, and a bucket receives the treatment of the first bound that
/// is at least the bucket. A single partition covering every bucket becomes a constant and never
/// needs a hash.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(from = "Vec<Partition>")]
pub struct Treatments(Distribution);

#[derive(Clone, Debug, PartialEq, Eq)]
enum Distribution {
    Constant(String),
    Ranges(Vec<(u32, String)>),
}

impl From<Vec<Partition>> for Treatments {
    fn from(partitions: Vec<Partition>) -> Self {
        if let [only] = partitions.as_slice() {
            if only.size >= 100 {
                return Treatments(Distribution::Constant(only.treatment.clone()));
            }
        }

        let mut upper: u32 = 0;
        let ranges = partitions
            .into_iter()
            .map(|partition| {
                upper = u32::saturating_add(upper, partition.size);
                (upper, partition.treatment)
            })
            .collect();
        Treatments(Distribution::Ranges(ranges))
    }
}

impl Treatments {
    /// The treatment for a bucket in `1..=100`.
    ///
    /// Sizes that do not reach 100 leave high buckets uncovered; those get the last treatment.
    /// With no partitions at all the answer is `control`.
    pub fn treatment_for(&self, bucket: u32) -> &str {
        match &self.0 {
            Distribution::Constant(treatment) => treatment.as_str(),
            Distribution::Ranges(ranges) => ranges
                .iter()
                .find(|(upper, _)| *upper >= bucket)
                .or_else(|| ranges.last())
                .map(|(_, treatment)| treatment.as_str())
                .unwrap_or(CONTROL),
        }
    }

    /// The treatment for a bucketing key hashed with `seed`.
    pub fn treatment_for_key(&self, bucketing_key: &str, seed: i32) -> &str {
        match &self.0 {
            Distribution::Constant(treatment) => treatment.as_str(),
            Distribution::Ranges(_) => self.treatment_for(bucket(bucketing_key, seed)),
        }
    }
}
