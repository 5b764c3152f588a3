//! Challenge provider port
//!
//! Puzzle construction, signing and solution checking live behind this
//! trait; the gate treats challenges and payloads as opaque.

use crate::domain::entities::{Challenge, ChallengeOptions, SolutionPayload, Verification};
use crate::error::GateResult;

pub trait ChallengeProvider: Send + Sync + 'static {
    /// Mint and sign a new challenge
    fn create_challenge(&self, options: &ChallengeOptions<'_>) -> GateResult<Challenge>;

    /// Check a submitted solution against its signature (and expiry, if asked)
    ///
    /// Must not panic on arbitrary payloads, including an empty one.
    fn verify_solution(
        &self,
        payload: &SolutionPayload,
        hmac_key: &str,
        check_expires: bool,
    ) -> Verification;
}
