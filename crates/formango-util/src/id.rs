use rand::{rngs::OsRng, Rng, RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const ID_LEN: usize = 10;

/// Generates opaque identities such as `form-Xq3bT9aLk2`.
///
/// Uses the xoshiro256** PRNG so that a seeded generator produces the same
/// sequence on every run.
///
/// # Examples
///
/// ```
/// use formango_util::IdGenerator;
///
/// let mut a = IdGenerator::seeded(7);
/// let mut b = IdGenerator::seeded(7);
/// let id = a.next_id("form");
/// assert!(id.starts_with("form-"));
/// assert_eq!(id.len(), "form-".len() + 10);
/// assert_eq!(id, b.next_id("form"));
/// ```
pub struct IdGenerator {
    rng: Xoshiro256StarStar,
}

impl IdGenerator {
    /// Create a generator seeded from the operating system.
    pub fn new() -> Self {
        let mut seed = [0u8; 32];
        OsRng.fill_bytes(&mut seed);
        Self {
            rng: Xoshiro256StarStar::from_seed(seed),
        }
    }

    /// Create a generator with a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        }
    }

    /// Generate `{prefix}-` followed by ten alphanumeric characters.
    pub fn next_id(&mut self, prefix: &str) -> String {
        let mut id = String::with_capacity(prefix.len() + 1 + ID_LEN);
        id.push_str(prefix);
        id.push('-');
        for _ in 0..ID_LEN {
            let idx = self.rng.gen_range(0..ALPHABET.len());
            id.push(ALPHABET[idx] as char);
        }
        id
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
