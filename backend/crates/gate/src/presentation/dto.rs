//! API DTOs (Data Transfer Objects)

use crate::domain::entities::Challenge;
use serde::{Deserialize, Serialize};

/// Query for GET on the challenge path
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChallengeQuery {
    #[serde(default)]
    pub next: Option<String>,
}

/// Challenge as the widget expects it
#[derive(Debug, Clone, Serialize)]
pub struct ChallengeDto {
    pub algorithm: String,
    pub challenge: String,
    #[serde(rename = "maxnumber")]
    pub max_number: u64,
    pub salt: String,
    pub signature: String,
}

impl From<Challenge> for ChallengeDto {
    fn from(challenge: Challenge) -> Self {
        Self {
            algorithm: challenge.algorithm,
            challenge: challenge.challenge,
            max_number: challenge.max_number,
            salt: challenge.salt,
            signature: challenge.signature,
        }
    }
}

/// Render context for the challenge page
#[derive(Debug, Clone, Serialize)]
pub struct ChallengePage {
    pub challenge: ChallengeDto,
    pub next_url: String,
    pub referrer: Option<String>,
    pub message: String,
    pub help_message: String,
    pub js_src_url: String,
    pub css_url: String,
    pub site_icon_url: String,
}

/// Form posted to the submit path
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitForm {
    /// Base64-encoded JSON solution
    #[serde(default)]
    pub altcha: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Response for a successful submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
}
