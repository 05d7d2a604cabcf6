//! Advisor collaborator
//!
//! Thin client for a hosted generative-AI API, used for natural-language
//! security Q&A and rule-set audits. Strictly request/response: nothing
//! returned here feeds back into packet evaluation, and a failed call
//! only surfaces in the CLI path that asked for it.

use crate::config::AdvisorConfig;
use crate::engine::RuleSet;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::json;

/// Answer to a free-text consultation
#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    /// Web sources the model grounded its answer in, possibly empty
    pub sources: Vec<SourceLink>,
}

/// Web source backing an answer
#[derive(Debug, Clone, Deserialize)]
pub struct SourceLink {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub uri: String,
}

/// Structured result of a rule-set audit
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAudit {
    pub summary: String,
    /// CRITICAL, HIGH, MEDIUM or LOW
    pub risk_level: String,
    #[serde(default)]
    pub findings: Vec<AuditFinding>,
}

/// One audit finding
#[derive(Debug, Clone, Deserialize)]
pub struct AuditFinding {
    pub description: String,
    pub recommendation: String,
}

// Wire format of the generateContent response; only the fields we read.

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<SourceLink>,
}

impl GenerateResponse {
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default()
    }

    fn into_sources(self) -> Vec<SourceLink> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.grounding_metadata)
            .map(|g| g.grounding_chunks.into_iter().filter_map(|c| c.web).collect())
            .unwrap_or_default()
    }
}

/// Client for the advisor API
pub struct AdvisorClient {
    http: reqwest::Client,
    base_url: String,
    consult_model: String,
    audit_model: String,
    api_key: String,
}

impl AdvisorClient {
    pub fn new(
        base_url: impl Into<String>,
        consult_model: impl Into<String>,
        audit_model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            consult_model: consult_model.into(),
            audit_model: audit_model.into(),
            api_key: api_key.into(),
        }
    }

    /// Build a client from configuration, reading the API key from the
    /// configured environment variable
    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            Error::Advisor(format!(
                "API key not set; export {} to use the advisor",
                config.api_key_env
            ))
        })?;
        Ok(Self::new(
            config.base_url.clone(),
            config.consult_model.clone(),
            config.audit_model.clone(),
            api_key,
        ))
    }

    async fn generate(&self, model: &str, body: serde_json::Value) -> Result<GenerateResponse> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Advisor(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Advisor(format!(
                "API returned {}",
                response.status()
            )));
        }

        response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| Error::Advisor(e.to_string()))
    }

    /// Ask a free-text security question. The model may ground its
    /// answer in web search results.
    pub async fn consult(&self, question: &str) -> Result<Answer> {
        let prompt = format!(
            "You are a cybersecurity consultant. Answer the following technical \
             question about firewall implementation or host security strategy. \
             Provide concrete commands or architecture advice where possible.\n\
             Question: {}",
            question
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "tools": [{ "googleSearch": {} }],
        });

        let response = self.generate(&self.consult_model, body).await?;
        let text = response.text();
        if text.is_empty() {
            return Err(Error::Advisor("empty answer from model".to_string()));
        }
        Ok(Answer {
            text,
            sources: response.into_sources(),
        })
    }

    /// Audit the active rule set for shadowing and zero-trust holes
    pub async fn audit_rules(&self, rules: &RuleSet) -> Result<RuleAudit> {
        let listing: Vec<String> = rules.iter().map(|r| r.to_string()).collect();
        let prompt = format!(
            "As a senior network security architect, audit this host firewall \
             rule set. Rules are evaluated in order; first match wins. Look for \
             rule shadowing, holes in the default-deny posture, and ordering \
             problems.\nRules:\n{}",
            listing.join("\n")
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "summary": { "type": "STRING" },
                        "riskLevel": { "type": "STRING" },
                        "findings": {
                            "type": "ARRAY",
                            "items": {
                                "type": "OBJECT",
                                "properties": {
                                    "description": { "type": "STRING" },
                                    "recommendation": { "type": "STRING" }
                                },
                                "required": ["description", "recommendation"]
                            }
                        }
                    },
                    "required": ["summary", "riskLevel", "findings"]
                }
            },
        });

        let response = self.generate(&self.audit_model, body).await?;
        serde_json::from_str(&response.text())
            .map_err(|e| Error::Advisor(format!("malformed audit response: {}", e)))
    }
}
