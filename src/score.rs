//! Off-chain identity scoring: advisory inputs from the hub backend. Scores
//! gate nothing authoritative here; the airdrop contract enforces
//! eligibility on-chain. Every failure is soft.

use crate::config::MIN_SCORE;
use serde::Deserialize;
use tracing::warn;

#[derive(Clone, Debug, Deserialize)]
pub struct FarcasterSession {
    pub fid: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub score: Option<f64>,
}

/// The scoring endpoint has shipped two layouts; accept both.
#[derive(Deserialize)]
struct ScoreResponse {
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    experimental: Option<ExperimentalScore>,
}

#[derive(Deserialize)]
struct ExperimentalScore {
    #[serde(default)]
    neynar_user_score: Option<f64>,
}

pub struct ScoreClient {
    http: reqwest::Client,
    base_url: String,
}

impl ScoreClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Hydrate the Farcaster session from the backend, if it has one.
    pub async fn session(&self) -> Option<FarcasterSession> {
        let url = format!("{}/api/farcaster/session", self.base_url);
        match self.http.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                match resp.json::<FarcasterSession>().await {
                    Ok(session) => Some(session),
                    Err(e) => {
                        warn!(error = %e, "farcaster session payload unreadable");
                        None
                    }
                }
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "farcaster session fetch failed");
                None
            }
            Err(e) => {
                warn!(error = %e, "farcaster session fetch failed");
                None
            }
        }
    }

    /// Fetch the Neynar anti-bot score for `fid`.
    pub async fn neynar_score(&self, fid: u64) -> Option<f64> {
        let url = format!("{}/api/neynar-score?fid={}", self.base_url, fid);
        let resp = match self.http.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                warn!(fid, status = %resp.status(), "score fetch failed");
                return None;
            }
            Err(e) => {
                warn!(fid, error = %e, "score fetch failed");
                return None;
            }
        };
        match resp.json::<ScoreResponse>().await {
            Ok(body) => body
                .score
                .or(body.experimental.and_then(|e| e.neynar_user_score)),
            Err(e) => {
                warn!(fid, error = %e, "score payload unreadable");
                None
            }
        }
    }
}

/// Advisory eligibility gate. Unknown scores are ineligible for display
/// purposes but never block an on-chain attempt on their own.
pub fn score_eligible(score: Option<f64>) -> bool {
    matches!(score, Some(s) if s >= MIN_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_eligible__threshold_is_inclusive() {
        assert!(score_eligible(Some(0.35)));
        assert!(score_eligible(Some(0.9)));
        assert!(!score_eligible(Some(0.349)));
        assert!(!score_eligible(None));
    }

    #[test]
    fn score_response__accepts_both_layouts() {
        let flat: ScoreResponse = serde_json::from_str(r#"{"score":0.42}"#).unwrap();
        assert_eq!(flat.score, Some(0.42));

        let nested: ScoreResponse = serde_json::from_str(
            r#"{"experimental":{"neynar_user_score":0.61}}"#,
        )
        .unwrap();
        assert_eq!(
            nested.experimental.and_then(|e| e.neynar_user_score),
            Some(0.61)
        );
    }
}
