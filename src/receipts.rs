//! Receipt uploads kept in the local store under `uploaded_receipts`.
//! Extraction is a placeholder that returns one of a few canned results.

use crate::errors::ClientError;
use crate::storage::{LocalStore, RECEIPTS};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;
/// Request body cap for `/api/receipts`: room for a handful of base64
/// encoded files at `MAX_FILE_SIZE` plus the JSON around them.
pub const MAX_UPLOAD_BODY: usize = 32 * 1024 * 1024;
pub const ALLOWED_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "application/pdf"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedData {
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub merchant: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: String,
    pub name: String,
    pub size: usize,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub data_url: String,
    pub uploaded_at: DateTime<Utc>,
    pub extracted_data: ExtractedData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptUpload {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub data_base64: String,
}

#[derive(Debug, Default, Serialize)]
pub struct UploadOutcome {
    pub receipts: Vec<Receipt>,
    pub errors: Vec<String>,
}

pub fn check_file(name: &str, mime_type: &str, size: usize) -> Result<(), String> {
    if !ALLOWED_TYPES.contains(&mime_type) {
        return Err(format!(
            "{name}: Unsupported file type. Please use JPEG, PNG, GIF, or PDF."
        ));
    }
    if size > MAX_FILE_SIZE {
        return Err(format!(
            "{name}: File too large. Maximum size is {}MB.",
            MAX_FILE_SIZE / (1024 * 1024)
        ));
    }
    Ok(())
}

pub fn extract_mock_data(file_name: &str) -> ExtractedData {
    const SAMPLES: [(i64, &str, &str); 4] = [
        (2599, "Coffee Shop", "2024-01-15"),
        (15678, "Grocery Store", "2024-01-14"),
        (8950, "Restaurant", "2024-01-13"),
        (1200, "Gas Station", "2024-01-12"),
    ];
    let seed: usize = file_name.bytes().map(usize::from).sum();
    let (cents, merchant, date) = SAMPLES[seed % SAMPLES.len()];
    ExtractedData {
        amount: Decimal::new(cents, 2),
        merchant: merchant.to_string(),
        date: date.to_string(),
    }
}

pub fn format_file_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{value:.2}");
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed} {}", UNITS[unit])
}

#[derive(Clone)]
pub struct ReceiptBook {
    store: LocalStore,
}

impl ReceiptBook {
    pub fn new(store: LocalStore) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Vec<Receipt> {
        self.store.load_list(RECEIPTS).await
    }

    /// Stores every acceptable file; rejected files are reported by name and
    /// do not stop the rest.
    pub async fn upload(
        &self,
        uploads: Vec<ReceiptUpload>,
        now: DateTime<Utc>,
    ) -> Result<UploadOutcome, ClientError> {
        let mut outcome = UploadOutcome::default();
        for upload in uploads {
            let bytes = match STANDARD.decode(upload.data_base64.trim()) {
                Ok(bytes) => bytes,
                Err(err) => {
                    outcome
                        .errors
                        .push(format!("Error processing {}: {err}", upload.name));
                    continue;
                }
            };
            if let Err(message) = check_file(&upload.name, &upload.mime_type, bytes.len()) {
                warn!("receipt rejected: {message}");
                outcome.errors.push(message);
                continue;
            }

            outcome.receipts.push(Receipt {
                id: Uuid::new_v4().to_string(),
                extracted_data: extract_mock_data(&upload.name),
                size: bytes.len(),
                data_url: format!("data:{};base64,{}", upload.mime_type, STANDARD.encode(&bytes)),
                mime_type: upload.mime_type,
                name: upload.name,
                uploaded_at: now,
            });
        }

        if !outcome.receipts.is_empty() {
            let mut all = self.list().await;
            all.extend(outcome.receipts.iter().cloned());
            self.store.set_json(RECEIPTS, &all).await?;
            info!("stored {} receipt(s)", outcome.receipts.len());
        }
        Ok(outcome)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let mut all = self.list().await;
        let before = all.len();
        all.retain(|r| r.id != id);
        if all.len() == before {
            return Err(ClientError::not_found("Receipt not found"));
        }
        self.store.set_json(RECEIPTS, &all).await
    }
}
