// Splittable random number generator for the scattering kernel.
//
// SplitMix64 streams: the state advances by a per-stream odd increment and
// every output is a finalizer hash of the state, so a generator is two u64s
// of copyable state and splitting off an independent stream for an electron
// history is a pair of hashes, not a jump along one shared sequence.
//
// Reference: Steele, Lea, Vigna, "Fast Splittable Pseudorandom Number
// Generators", OOPSLA 2014.

use rand::{RngCore, SeedableRng};

/// Golden-ratio increment of the default stream.
const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// 2^-53, scales a 53-bit mantissa draw into [0, 1).
const F64_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

/// Variant 13 of the 64-bit finalizer (Stafford).
#[inline(always)]
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Derive a stream increment: odd, and with enough bit transitions that the
/// finalizer keeps its avalanche quality.
#[inline]
fn mix_gamma(z: u64) -> u64 {
    let gamma = mix64(z) | 1;
    if (gamma ^ (gamma >> 1)).count_ones() < 24 {
        gamma ^ 0xAAAA_AAAA_AAAA_AAAA
    } else {
        gamma
    }
}

/// Counter-based splittable RNG.
#[derive(Clone, Copy, Debug)]
pub struct FastRng {
    state: u64,
    gamma: u64,
}

impl FastRng {
    /// Generator on the default stream for the given seed.
    #[inline]
    pub fn new(seed: u64) -> Self {
        FastRng {
            state: mix64(seed),
            gamma: GOLDEN_GAMMA,
        }
    }

    /// Split the private stream for one electron history.
    ///
    /// The call-level seed and the electron index select both the starting
    /// state and the stream increment, so histories are independent of each
    /// other and of how electrons are distributed over worker threads.
    #[inline]
    pub fn for_electron(call_seed: u64, electron: u64) -> Self {
        let base = call_seed.wrapping_add(electron.wrapping_mul(GOLDEN_GAMMA));
        FastRng {
            state: mix64(base),
            gamma: mix_gamma(base.wrapping_add(GOLDEN_GAMMA)),
        }
    }

    #[inline(always)]
    fn next_raw(&mut self) -> u64 {
        self.state = self.state.wrapping_add(self.gamma);
        mix64(self.state)
    }

    /// Generate a random f64 in [0, 1)
    #[inline(always)]
    pub fn random(&mut self) -> f64 {
        (self.next_raw() >> 11) as f64 * F64_SCALE
    }
}

impl SeedableRng for FastRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        FastRng::new(u64::from_le_bytes(seed))
    }
}

impl RngCore for FastRng {
    #[inline(always)]
    fn next_u32(&mut self) -> u32 {
        (self.next_raw() >> 32) as u32
    }

    #[inline(always)]
    fn next_u64(&mut self) -> u64 {
        self.next_raw()
    }

    #[inline]
    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_raw().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_same_seed_same_sequence() {
        let mut rng1 = FastRng::new(12345);
        let mut rng2 = FastRng::new(12345);

        for _ in 0..100 {
            assert_eq!(rng1.random(), rng2.random());
        }
    }

    #[test]
    fn test_random_stays_in_unit_interval() {
        let mut rng = FastRng::new(42);

        for _ in 0..10000 {
            let val = rng.random();
            assert!(val >= 0.0 && val < 1.0, "Value {} out of range [0, 1)", val);
        }
    }

    #[test]
    fn test_works_through_the_rand_traits() {
        let mut rng = FastRng::new(12345);

        let _: f64 = rng.gen();
        let _: u32 = rng.gen();
        let _: bool = rng.gen();
        let _ = rng.gen_range(0.1..0.9);
    }

    #[test]
    fn test_gamma_is_always_odd() {
        for seed in 0..1000u64 {
            let rng = FastRng::for_electron(seed, seed.wrapping_mul(31));
            assert_eq!(rng.gamma & 1, 1, "even increment for seed {seed}");
        }
    }

    #[test]
    fn test_electron_streams_are_deterministic() {
        let mut a = FastRng::for_electron(42, 7);
        let mut b = FastRng::for_electron(42, 7);
        for _ in 0..100 {
            assert_eq!(a.random(), b.random());
        }
    }

    #[test]
    fn test_electron_streams_differ_by_index() {
        let mut a = FastRng::for_electron(42, 0);
        let mut b = FastRng::for_electron(42, 1);
        let same = (0..100).filter(|_| a.random() == b.random()).count();
        assert!(same < 100, "adjacent electron streams must not coincide");
    }

    #[test]
    fn test_electron_streams_differ_by_seed() {
        let mut a = FastRng::for_electron(42, 3);
        let mut b = FastRng::for_electron(43, 3);
        assert_ne!(a.random(), b.random());
    }

    #[test]
    fn test_copied_generator_replays_the_stream() {
        let mut rng = FastRng::for_electron(42, 11);
        let snapshot = rng;
        let run: Vec<u64> = (0..16).map(|_| rng.next_u64()).collect();
        let mut replay = snapshot;
        let again: Vec<u64> = (0..16).map(|_| replay.next_u64()).collect();
        assert_eq!(run, again);
    }
}
