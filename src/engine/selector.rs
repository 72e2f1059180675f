// Credential selection for the single-account shape

use rand::Rng;

/// Picks which credential of a loaded set to use
pub trait CredentialSelector: Send + Sync {
    /// Return an index in `0..len`; `len` is never zero
    fn pick(&self, len: usize) -> usize;
}

/// Uniform random choice, the production selector
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomSelector;

impl CredentialSelector for RandomSelector {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Always the same position (wrapped to the set size)
#[derive(Debug, Clone, Copy)]
pub struct FixedSelector(pub usize);

impl CredentialSelector for FixedSelector {
    fn pick(&self, len: usize) -> usize {
        self.0 % len
    }
}
