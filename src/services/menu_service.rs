use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::menu::MenuAnalysis;
use crate::services::oracle::{Oracle, OracleError, OracleRequest};
use crate::services::response_validator::strip_code_fences;

const READ_API_VERSION: &str = "2024-11-30";
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLLS: usize = 30;

#[derive(Debug, Error)]
pub enum MenuError {
    #[error("Azure credentials missing: {0}")]
    Config(String),

    #[error("OCR Failed: {0}")]
    Ocr(String),

    #[error("AI Failed: {0}")]
    Oracle(#[from] OracleError),
}

/// Reads printed text out of an image.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// All recognised lines joined with single spaces.
    async fn read_text(&self, image: Vec<u8>) -> Result<String, MenuError>;
}

#[derive(Deserialize)]
struct ReadOperation {
    status: String,
    #[serde(rename = "analyzeResult")]
    analyze_result: Option<AnalyzeResult>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct AnalyzeResult {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Deserialize)]
struct Page {
    #[serde(default)]
    lines: Vec<Line>,
}

#[derive(Deserialize)]
struct Line {
    content: String,
}

impl AnalyzeResult {
    fn joined_lines(&self) -> String {
        self.pages
            .iter()
            .flat_map(|page| page.lines.iter().map(|line| line.content.as_str()))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Azure Document Intelligence `prebuilt-read` over REST.
pub struct AzureDocumentReader {
    client: Client,
    endpoint: String,
    key: String,
}

impl AzureDocumentReader {
    pub fn new(endpoint: &str, key: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            key: key.to_string(),
        }
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/prebuilt-read:analyze?api-version={}",
            self.endpoint, READ_API_VERSION
        )
    }
}

#[async_trait]
impl TextRecognizer for AzureDocumentReader {
    async fn read_text(&self, image: Vec<u8>) -> Result<String, MenuError> {
        let response = self
            .client
            .post(self.analyze_url())
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "application/octet-stream")
            .body(image)
            .send()
            .await
            .map_err(|e| MenuError::Ocr(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(MenuError::Ocr(format!(
                "Analyze request failed with status {}: {}",
                status, error_text
            )));
        }

        let operation_url = response
            .headers()
            .get("operation-location")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| MenuError::Ocr("Missing operation-location header".to_string()))?;

        for _ in 0..MAX_POLLS {
            tokio::time::sleep(POLL_INTERVAL).await;

            let operation: ReadOperation = self
                .client
                .get(&operation_url)
                .header("Ocp-Apim-Subscription-Key", &self.key)
                .send()
                .await
                .map_err(|e| MenuError::Ocr(e.to_string()))?
                .json()
                .await
                .map_err(|e| MenuError::Ocr(format!("Failed to parse read result: {}", e)))?;

            match operation.status.as_str() {
                "succeeded" => {
                    let text = operation
                        .analyze_result
                        .map(|result| result.joined_lines())
                        .unwrap_or_default();
                    info!("OCR read {} characters", text.chars().count());
                    return Ok(text);
                }
                "failed" => {
                    return Err(MenuError::Ocr(format!(
                        "Read operation failed: {}",
                        operation.error.unwrap_or_default()
                    )));
                }
                _ => continue,
            }
        }

        Err(MenuError::Ocr("Read operation did not finish in time".to_string()))
    }
}

const MENU_PROMPT: &str = r#"You are an expert Korean food translator.
The user sends raw text extracted from a Korean menu board. Work through these steps in order:

1. Fix wide letter spacing. Menus justify text, so single syllables are often separated by spaces or newlines ("우        동" is "우동", "물        만        두" is "물만두"). When a lone syllable has a price next to it, join it with the syllables right before it.
2. Merge composite names. Modifiers belong to the dish that follows them ("김치" + "우동" is "김치 우동"). Words sharing one price are one item.
3. Translate each corrected name into natural English.
4. Describe ingredients and taste in one or two sentences.
5. Estimate a spicy level from 0 (mild) to 3 (very spicy).
6. Extract the price that belongs to the item.

Reply with JSON only:
{
  "foods": [
    {"korean": "우동", "english": "Udon", "description": "Thick wheat noodles in a savoury broth with fish cake.", "spicy_level": 0, "price": "3500"}
  ]
}"#;

/// OCR followed by a translation call.
pub struct MenuAnalyzer {
    recognizer: Option<Arc<dyn TextRecognizer>>,
    oracle: Arc<dyn Oracle>,
}

impl MenuAnalyzer {
    pub fn new(recognizer: Option<Arc<dyn TextRecognizer>>, oracle: Arc<dyn Oracle>) -> Self {
        Self { recognizer, oracle }
    }

    pub async fn analyze(&self, image: Vec<u8>) -> Result<MenuAnalysis, MenuError> {
        let recognizer = self.recognizer.as_ref().ok_or_else(|| {
            MenuError::Config("AZURE_DOC_ENDPOINT and AZURE_DOC_KEY must be set".to_string())
        })?;

        let text = recognizer.read_text(image).await?;
        if text.trim().is_empty() {
            warn!("OCR found no text on the menu image");
            return Ok(MenuAnalysis::default());
        }

        let request = OracleRequest::new(MENU_PROMPT, text).temperature(0.0).json();
        let reply = self.oracle.complete(request).await?;

        serde_json::from_str(&strip_code_fences(&reply))
            .map_err(|e| MenuError::Oracle(OracleError::Parse(e.to_string())))
    }
}
