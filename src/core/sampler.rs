//! Memory-bounded training buffer fed one image at a time.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::vector::Vector;

/// How the bounded training buffer keeps itself under its cap.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SamplingPolicy {
    /// Algorithm R: a uniform sample over every vector seen.
    #[default]
    Reservoir,
    /// Legacy behaviour: once the buffer reaches the cap it is replaced by
    /// `cap` draws with replacement from itself. Biased towards recent images.
    Window,
}

pub struct TrainingSampler {
    policy: SamplingPolicy,
    cap: usize,
    buffer: Vec<Vector>,
    seen: u64,
}

impl TrainingSampler {
    pub fn new(policy: SamplingPolicy, cap: usize) -> Self {
        Self {
            policy,
            cap,
            buffer: Vec::with_capacity(cap),
            seen: 0,
        }
    }

    /// Feeds the vectors of one image.
    pub fn ingest<I, R>(&mut self, vectors: I, rng: &mut R)
    where
        I: IntoIterator<Item = Vector>,
        R: Rng + ?Sized,
    {
        match self.policy {
            SamplingPolicy::Reservoir => {
                for vector in vectors {
                    self.offer(vector, rng);
                }
            }
            SamplingPolicy::Window => {
                for vector in vectors {
                    self.seen += 1;
                    self.buffer.push(vector);
                }
                if self.buffer.len() >= self.cap {
                    self.resample(rng);
                }
            }
        }
    }

    fn offer<R: Rng + ?Sized>(&mut self, vector: Vector, rng: &mut R) {
        self.seen += 1;
        if self.buffer.len() < self.cap {
            self.buffer.push(vector);
            return;
        }
        let slot = rng.gen_range(0..self.seen);
        if (slot as usize) < self.cap {
            self.buffer[slot as usize] = vector;
        }
    }

    fn resample<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let n = self.buffer.len();
        let sampled: Vec<Vector> = (0..self.cap)
            .map(|_| self.buffer[rng.gen_range(0..n)])
            .collect();
        trace!(from = n, to = self.cap, "resampled training window");
        self.buffer = sampled;
    }

    /// Total vectors offered so far.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The training set to cluster.
    pub fn into_vectors(self) -> Vec<Vector> {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn batch(start: usize, len: usize) -> Vec<Vector> {
        (start..start + len).map(|i| [i as f64; 4]).collect()
    }

    #[test]
    fn test_window_keeps_small_batches_verbatim() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut sampler = TrainingSampler::new(SamplingPolicy::Window, 10);
        sampler.ingest(batch(0, 4), &mut rng);
        sampler.ingest(batch(4, 4), &mut rng);
        assert_eq!(sampler.into_vectors(), batch(0, 8));
    }

    #[test]
    fn test_window_resamples_to_cap() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut sampler = TrainingSampler::new(SamplingPolicy::Window, 10);
        sampler.ingest(batch(0, 25), &mut rng);
        assert_eq!(sampler.len(), 10);
        assert_eq!(sampler.seen(), 25);

        // A later small image is appended on top of the resampled window.
        sampler.ingest(batch(100, 3), &mut rng);
        assert_eq!(sampler.len(), 10);
        let vectors = sampler.into_vectors();
        assert!(vectors.iter().all(|v| v[0] < 25.0 || v[0] >= 100.0));
    }

    #[test]
    fn test_window_resamples_exactly_at_cap() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sampler = TrainingSampler::new(SamplingPolicy::Window, 6);
        sampler.ingest(batch(0, 3), &mut rng);
        sampler.ingest(batch(3, 3), &mut rng);
        assert_eq!(sampler.len(), 6);
        let vectors = sampler.into_vectors();
        assert!(vectors.iter().all(|v| v[0] < 6.0));
    }

    #[test]
    fn test_reservoir_never_exceeds_cap() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut sampler = TrainingSampler::new(SamplingPolicy::Reservoir, 50);
        for i in 0..20 {
            sampler.ingest(batch(i * 37, 37), &mut rng);
            assert!(sampler.len() <= 50);
        }
        assert_eq!(sampler.len(), 50);
        assert_eq!(sampler.seen(), 20 * 37);
    }

    #[test]
    fn test_reservoir_reaches_early_and_late_vectors() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut sampler = TrainingSampler::new(SamplingPolicy::Reservoir, 200);
        sampler.ingest(batch(0, 1000), &mut rng);
        sampler.ingest(batch(1000, 1000), &mut rng);
        let vectors = sampler.into_vectors();
        let early = vectors.iter().filter(|v| v[0] < 1000.0).count();
        // Uniform over the stream: roughly half from each image.
        assert!(early > 50 && early < 150, "early = {early}");
    }

    #[test]
    fn test_same_seed_same_sample() {
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut sampler = TrainingSampler::new(SamplingPolicy::Window, 16);
            sampler.ingest(batch(0, 40), &mut rng);
            sampler.into_vectors()
        };
        assert_eq!(run(9), run(9));
    }
}
