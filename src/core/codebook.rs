use std::ops::Index;

use super::channel::Channel;
use super::vector::{squared_distance, Vector};

/// Number of codewords in every codebook; an index fits in one byte.
pub const CODEBOOK_SIZE: usize = 256;

/// A frozen set of `CODEBOOK_SIZE` codewords.
#[derive(Clone, Debug, PartialEq)]
pub struct Codebook {
    codewords: [Vector; CODEBOOK_SIZE],
}

impl Codebook {
    pub fn new(codewords: [Vector; CODEBOOK_SIZE]) -> Self {
        Self { codewords }
    }

    /// Every codeword set to `value`.
    #[cfg(test)]
    pub fn uniform(value: Vector) -> Self {
        Self::new([value; CODEBOOK_SIZE])
    }

    pub fn codewords(&self) -> &[Vector; CODEBOOK_SIZE] {
        &self.codewords
    }

    pub fn codeword(&self, index: u8) -> &Vector {
        &self.codewords[index as usize]
    }

    /// Index of the codeword closest to `vector`.
    ///
    /// Ties go to the lowest index.
    pub fn nearest(&self, vector: &Vector) -> u8 {
        self.nearest_with_distance(vector).0
    }

    /// Like [`Codebook::nearest`], also returning the squared distance.
    pub fn nearest_with_distance(&self, vector: &Vector) -> (u8, f64) {
        let mut best_idx = 0usize;
        let mut best_dist = f64::MAX;
        for (i, codeword) in self.codewords.iter().enumerate() {
            let d = squared_distance(vector, codeword);
            if d < best_dist {
                best_dist = d;
                best_idx = i;
            }
        }
        (best_idx as u8, best_dist)
    }
}

/// One codebook per channel.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelCodebooks {
    books: [Codebook; 3],
}

impl ChannelCodebooks {
    /// Books in `Channel::ALL` order.
    pub fn new(red: Codebook, green: Codebook, blue: Codebook) -> Self {
        Self {
            books: [red, green, blue],
        }
    }
}

impl Index<Channel> for ChannelCodebooks {
    type Output = Codebook;

    fn index(&self, channel: Channel) -> &Codebook {
        &self.books[channel.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ramp() -> Codebook {
        let mut codewords = [[0.0; 4]; CODEBOOK_SIZE];
        for (i, cw) in codewords.iter_mut().enumerate() {
            *cw = [i as f64; 4];
        }
        Codebook::new(codewords)
    }

    #[test]
    fn test_nearest_exact_hit() {
        let book = ramp();
        assert_eq!(book.nearest(&[42.0; 4]), 42);
        assert_eq!(book.nearest_with_distance(&[42.0; 4]), (42, 0.0));
    }

    #[test]
    fn test_nearest_tie_prefers_lowest_index() {
        let book = ramp();
        // Exactly between 10 and 11.
        assert_eq!(book.nearest(&[10.5; 4]), 10);

        let uniform = Codebook::uniform([7.0; 4]);
        assert_eq!(uniform.nearest(&[100.0, 0.0, 3.0, 9.0]), 0);
    }

    #[test]
    fn test_nearest_checkerboard_vector() {
        let mut codewords = [[128.0; 4]; CODEBOOK_SIZE];
        codewords[3] = [0.0, 255.0, 0.0, 255.0];
        codewords[9] = [0.0, 250.0, 0.0, 250.0];
        let book = Codebook::new(codewords);
        assert_eq!(book.nearest(&[0.0, 255.0, 0.0, 255.0]), 3);
    }

    #[test]
    fn test_channel_index() {
        let books = ChannelCodebooks::new(
            Codebook::uniform([1.0; 4]),
            Codebook::uniform([2.0; 4]),
            Codebook::uniform([3.0; 4]),
        );
        assert_eq!(books[Channel::Green].codeword(0), &[2.0; 4]);
        assert_eq!(books[Channel::Blue].codewords()[255], [3.0; 4]);
    }

    proptest! {
        #[test]
        fn prop_nearest_is_true_minimum(
            v in prop::array::uniform4(0.0f64..=255.0),
            seed in prop::collection::vec(prop::array::uniform4(0.0f64..=255.0), CODEBOOK_SIZE),
        ) {
            let mut codewords = [[0.0; 4]; CODEBOOK_SIZE];
            codewords.copy_from_slice(&seed);
            let book = Codebook::new(codewords);

            let (idx, d) = book.nearest_with_distance(&v);
            for cw in book.codewords() {
                prop_assert!(d <= squared_distance(&v, cw));
            }
            prop_assert_eq!(squared_distance(&v, book.codeword(idx)), d);
        }
    }
}
