use rand::Rng;

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_FRAGMENT_LEN: usize = 8;

/// Randomness seam for the admin fee and the transaction-id fragment, so
/// tests can pin both.
pub trait RandomSource: Send + Sync {
    /// Uniform draw from `[min, max]`, both ends inclusive.
    fn fee_between(&self, min: u64, max: u64) -> u64;

    /// Eight base36 characters for the transaction id.
    fn id_fragment(&self) -> String;
}

pub struct SystemRandom;

impl RandomSource for SystemRandom {
    fn fee_between(&self, min: u64, max: u64) -> u64 {
        if min > max {
            return min;
        }
        rand::thread_rng().gen_range(min..=max)
    }

    fn id_fragment(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..ID_FRAGMENT_LEN)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect()
    }
}

/// Deterministic source for tests.
#[cfg(test)]
pub struct FixedRandom {
    pub fee: u64,
    pub fragment: &'static str,
}

#[cfg(test)]
impl RandomSource for FixedRandom {
    fn fee_between(&self, _min: u64, _max: u64) -> u64 {
        self.fee
    }

    fn id_fragment(&self) -> String {
        self.fragment.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_stays_inside_the_range() {
        let source = SystemRandom;
        for _ in 0..100 {
            let fee = source.fee_between(5, 150);
            assert!((5..=150).contains(&fee));
        }
        assert_eq!(source.fee_between(7, 7), 7);
    }

    #[test]
    fn fragment_is_eight_base36_chars() {
        let fragment = SystemRandom.id_fragment();
        assert_eq!(fragment.len(), 8);
        assert!(fragment
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
    }
}
