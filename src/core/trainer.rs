//! Codebook training: bounded sampling followed by LBG / Lloyd iterations.
//!
//! Empty clusters keep their previous codeword. Such dead codewords are
//! counted in the [`TrainingReport`] rather than reseeded.

use image::RgbImage;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Result, VqError};

use super::channel::Channel;
use super::codebook::{ChannelCodebooks, Codebook, CODEBOOK_SIZE};
use super::sampler::{SamplingPolicy, TrainingSampler};
use super::vector::{self, Vector, VECTOR_DIM};

pub const DEFAULT_MAX_ITERATIONS: usize = 20;
pub const DEFAULT_SAMPLE_CAP: usize = 1000;

#[derive(Clone, Debug, PartialEq)]
pub struct TrainerConfig {
    pub max_iterations: usize,
    pub sample_cap: usize,
    pub sampling: SamplingPolicy,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            sample_cap: DEFAULT_SAMPLE_CAP,
            sampling: SamplingPolicy::default(),
        }
    }
}

/// Diagnostics of one clustering run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TrainingReport {
    /// Size of the training set after sampling.
    pub training_vectors: usize,
    /// Assignment passes executed.
    pub iterations: usize,
    /// True when a pass left every codeword unchanged.
    pub converged: bool,
    /// Sum of squared distances to the assigned codeword, per pass.
    pub distortion: Vec<f64>,
    /// Codewords that received no vectors, per pass.
    pub empty_clusters: Vec<usize>,
}

impl TrainingReport {
    /// Codewords left without members by the last pass.
    pub fn dead_codewords(&self) -> usize {
        self.empty_clusters.last().copied().unwrap_or(0)
    }
}

#[derive(Clone, Debug)]
pub struct TrainedCodebook {
    pub codebook: Codebook,
    pub report: TrainingReport,
}

#[derive(Clone, Debug)]
pub struct TrainedCodebooks {
    pub codebooks: ChannelCodebooks,
    /// Reports in `Channel::ALL` order.
    pub reports: [TrainingReport; 3],
}

impl TrainedCodebooks {
    pub fn report(&self, channel: Channel) -> &TrainingReport {
        &self.reports[channel.index()]
    }
}

pub struct CodebookTrainer {
    config: TrainerConfig,
}

impl CodebookTrainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Trains the red, green and blue codebooks in that order.
    pub fn train<'a, I, R>(&self, images: I, rng: &mut R) -> Result<TrainedCodebooks>
    where
        I: IntoIterator<Item = &'a RgbImage> + Clone,
        R: Rng + ?Sized,
    {
        let [red, green, blue] = Channel::ALL;
        let red = self.train_channel(images.clone(), red, rng)?;
        let green = self.train_channel(images.clone(), green, rng)?;
        let blue = self.train_channel(images, blue, rng)?;

        Ok(TrainedCodebooks {
            codebooks: ChannelCodebooks::new(red.codebook, green.codebook, blue.codebook),
            reports: [red.report, green.report, blue.report],
        })
    }

    /// Samples one channel's block vectors from `images` and clusters them.
    pub fn train_channel<'a, I, R>(
        &self,
        images: I,
        channel: Channel,
        rng: &mut R,
    ) -> Result<TrainedCodebook>
    where
        I: IntoIterator<Item = &'a RgbImage>,
        R: Rng + ?Sized,
    {
        let mut sampler = TrainingSampler::new(self.config.sampling, self.config.sample_cap);
        for image in images {
            sampler.ingest(vector::vectors(image, channel), rng);
        }
        if sampler.is_empty() {
            return Err(VqError::EmptyTrainingSet);
        }

        info!(
            channel = %channel,
            seen = sampler.seen(),
            sampled = sampler.len(),
            "generating codebook"
        );
        let trained = self.cluster(&sampler.into_vectors(), rng)?;

        let dead = trained.report.dead_codewords();
        if dead > 0 {
            warn!(
                channel = %channel,
                dead_codewords = dead,
                "codebook has codewords with no training vectors"
            );
        }
        Ok(trained)
    }

    /// Runs Lloyd iterations over an in-memory training set.
    pub fn cluster<R: Rng + ?Sized>(&self, vectors: &[Vector], rng: &mut R) -> Result<TrainedCodebook> {
        if vectors.is_empty() {
            return Err(VqError::EmptyTrainingSet);
        }

        let mut codebook = initial_codebook(vectors, rng);
        let mut report = TrainingReport {
            training_vectors: vectors.len(),
            ..Default::default()
        };

        let mut assignments = vec![0u8; vectors.len()];
        let mut sums = [[0.0f64; VECTOR_DIM]; CODEBOOK_SIZE];
        let mut counts = [0usize; CODEBOOK_SIZE];

        for iter in 0..self.config.max_iterations {
            // Assignment step.
            let mut distortion = 0.0;
            for (slot, v) in assignments.iter_mut().zip(vectors) {
                let (idx, d) = codebook.nearest_with_distance(v);
                *slot = idx;
                distortion += d;
            }

            sums.iter_mut().for_each(|s| *s = [0.0; VECTOR_DIM]);
            counts.iter_mut().for_each(|c| *c = 0);
            for (&idx, v) in assignments.iter().zip(vectors) {
                let c = idx as usize;
                counts[c] += 1;
                for (acc, x) in sums[c].iter_mut().zip(v) {
                    *acc += x;
                }
            }

            // Update step into a fresh candidate; empty clusters carry over.
            let mut candidate = *codebook.codewords();
            let mut empty = 0usize;
            for ((cw, sum), &count) in candidate.iter_mut().zip(sums.iter()).zip(counts.iter()) {
                if count == 0 {
                    empty += 1;
                    continue;
                }
                let n = count as f64;
                for (out, s) in cw.iter_mut().zip(sum) {
                    *out = s / n;
                }
            }
            let candidate = Codebook::new(candidate);
            let max_shift = codebook
                .codewords()
                .iter()
                .zip(candidate.codewords())
                .map(|(old, new)| vector::distance(old, new))
                .fold(0.0f64, f64::max);

            report.iterations = iter + 1;
            report.distortion.push(distortion);
            report.empty_clusters.push(empty);
            debug!(
                iter = iter + 1,
                distortion = distortion,
                empty_clusters = empty,
                max_shift = max_shift,
                "lbg iteration complete"
            );

            if candidate == codebook {
                report.converged = true;
                break;
            }
            codebook = candidate;
        }

        if report.converged {
            debug!(iterations = report.iterations, "codebook converged");
        } else {
            debug!(
                max_iterations = self.config.max_iterations,
                "iteration budget exhausted, using current codebook"
            );
        }

        Ok(TrainedCodebook { codebook, report })
    }
}

/// `CODEBOOK_SIZE` independent uniform draws; duplicates are allowed.
fn initial_codebook<R: Rng + ?Sized>(vectors: &[Vector], rng: &mut R) -> Codebook {
    let mut codewords = [[0.0; VECTOR_DIM]; CODEBOOK_SIZE];
    for cw in codewords.iter_mut() {
        *cw = vectors[rng.gen_range(0..vectors.len())];
    }
    Codebook::new(codewords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn noise_image(seed: u64, width: u32, height: u32) -> RgbImage {
        let mut rng = StdRng::seed_from_u64(seed);
        RgbImage::from_fn(width, height, |_, _| Rgb([rng.gen(), rng.gen(), rng.gen()]))
    }

    #[test]
    fn test_uniform_image_converges_immediately() {
        let img = RgbImage::from_pixel(4, 4, Rgb([10, 20, 30]));
        let trainer = CodebookTrainer::new(TrainerConfig::default());
        let mut rng = StdRng::seed_from_u64(42);

        let trained = trainer.train([&img], &mut rng).unwrap();

        assert_eq!(trained.codebooks[Channel::Red], Codebook::uniform([10.0; 4]));
        assert_eq!(trained.codebooks[Channel::Green], Codebook::uniform([20.0; 4]));
        assert_eq!(trained.codebooks[Channel::Blue], Codebook::uniform([30.0; 4]));

        for channel in Channel::ALL {
            let report = trained.report(channel);
            assert!(report.converged);
            assert_eq!(report.iterations, 1);
            assert_eq!(report.training_vectors, 4);
            assert_eq!(report.distortion, vec![0.0]);
            // Every vector lands on codeword 0.
            assert_eq!(report.dead_codewords(), CODEBOOK_SIZE - 1);
        }
    }

    #[test]
    fn test_empty_training_set() {
        let trainer = CodebookTrainer::new(TrainerConfig::default());
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(trainer.cluster(&[], &mut rng).unwrap_err(), VqError::EmptyTrainingSet);

        let images: Vec<RgbImage> = Vec::new();
        assert_eq!(
            trainer.train(&images, &mut rng).unwrap_err(),
            VqError::EmptyTrainingSet
        );

        // 1-pixel-wide images yield no complete blocks.
        let sliver = RgbImage::new(1, 8);
        assert_eq!(
            trainer.train_channel([&sliver], Channel::Red, &mut rng).unwrap_err(),
            VqError::EmptyTrainingSet
        );
    }

    #[test]
    fn test_two_clusters_are_separated() {
        let mut vectors = Vec::new();
        for i in 0..50 {
            vectors.push([i as f64 * 0.1; 4]);
            vectors.push([200.0 + i as f64 * 0.1; 4]);
        }
        let trainer = CodebookTrainer::new(TrainerConfig::default());
        let mut rng = StdRng::seed_from_u64(7);
        let trained = trainer.cluster(&vectors, &mut rng).unwrap();

        for v in &vectors {
            let (_, d) = trained.codebook.nearest_with_distance(v);
            // Closest codeword sits inside the vector's own group.
            assert!(d < 4.0 * 5.0 * 5.0, "vector {v:?} too far: {d}");
        }
    }

    #[test]
    fn test_same_seed_same_codebooks() {
        let images = [noise_image(1, 16, 16), noise_image(2, 16, 16)];
        let trainer = CodebookTrainer::new(TrainerConfig::default());

        let a = trainer.train(&images, &mut StdRng::seed_from_u64(11)).unwrap();
        let b = trainer.train(&images, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(a.codebooks, b.codebooks);
        assert_eq!(a.reports, b.reports);
    }

    #[test]
    fn test_iteration_budget_respected() {
        let images = [noise_image(3, 64, 64)];
        let config = TrainerConfig {
            max_iterations: 3,
            ..Default::default()
        };
        let trained = CodebookTrainer::new(config)
            .train_channel(&images, Channel::Green, &mut StdRng::seed_from_u64(5))
            .unwrap();
        assert!(trained.report.iterations <= 3);
        assert_eq!(trained.report.distortion.len(), trained.report.iterations);
    }

    #[test]
    fn test_window_policy_trains() {
        let images: Vec<_> = (0..4).map(|s| noise_image(s, 40, 40)).collect();
        let config = TrainerConfig {
            sampling: SamplingPolicy::Window,
            ..Default::default()
        };
        let trained = CodebookTrainer::new(config)
            .train_channel(&images, Channel::Blue, &mut StdRng::seed_from_u64(8))
            .unwrap();
        assert_eq!(trained.report.training_vectors, DEFAULT_SAMPLE_CAP);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_distortion_non_increasing(
            seed in any::<u64>(),
            vectors in prop::collection::vec(prop::array::uniform4(0u8..=255u8), 1..300),
        ) {
            let vectors: Vec<Vector> = vectors
                .iter()
                .map(|v| v.map(|x| x as f64))
                .collect();
            let trainer = CodebookTrainer::new(TrainerConfig::default());
            let trained = trainer.cluster(&vectors, &mut StdRng::seed_from_u64(seed)).unwrap();
            let report = trained.report;

            prop_assert!(report.iterations >= 1);
            prop_assert!(report.iterations <= DEFAULT_MAX_ITERATIONS);
            for pair in report.distortion.windows(2) {
                prop_assert!(pair[1] <= pair[0] * (1.0 + 1e-9) + 1e-9, "{:?}", report.distortion);
            }
        }

        #[test]
        fn prop_codewords_stay_in_sample_range(
            seed in any::<u64>(),
            vectors in prop::collection::vec(prop::array::uniform4(0u8..=255u8), 1..200),
        ) {
            let vectors: Vec<Vector> = vectors
                .iter()
                .map(|v| v.map(|x| x as f64))
                .collect();
            let trained = CodebookTrainer::new(TrainerConfig::default())
                .cluster(&vectors, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            for cw in trained.codebook.codewords() {
                for &x in cw {
                    prop_assert!((0.0..=255.0).contains(&x));
                }
            }
        }
    }
}
