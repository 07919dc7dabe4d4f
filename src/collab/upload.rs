// src/collab/upload.rs
// Media upload to Cloudinary (signed requests), plus the matching remote delete used by the sweep.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::time::Duration;

use crate::assets::AssetDeleter;
use crate::history::AssetKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMedia {
    pub public_url: String,
    pub asset_id: String,
}

#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, file: &Path, kind: AssetKind, folder: &str) -> Result<UploadedMedia>;
}

#[derive(Debug, Clone, Default)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl CloudinaryCredentials {
    pub fn is_complete(&self) -> bool {
        !self.cloud_name.is_empty() && !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

/// Sign request params: sorted `k=v` pairs joined by `&`, secret appended, sha256 hex.
pub fn sign_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    let digest = Sha256::digest(format!("{joined}{api_secret}").as_bytes());
    format!("{:x}", digest)
}

pub struct CloudinaryClient {
    http: reqwest::Client,
    creds: CloudinaryCredentials,
    base: String,
}

impl CloudinaryClient {
    pub fn new(creds: CloudinaryCredentials, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("news-reel-publisher/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .context("building cloudinary http client")?;
        Ok(Self {
            http,
            creds,
            base: "https://api.cloudinary.com/v1_1".into(),
        })
    }

    fn endpoint(&self, kind: AssetKind, action: &str) -> String {
        format!("{}/{}/{}/{}", self.base, self.creds.cloud_name, kind.as_str(), action)
    }

    fn ensure_creds(&self) -> Result<()> {
        if self.creds.is_complete() {
            Ok(())
        } else {
            Err(anyhow!("cloudinary credentials are incomplete"))
        }
    }
}

#[derive(Deserialize)]
struct UploadResp {
    secure_url: String,
    public_id: String,
}

#[derive(Deserialize)]
struct DestroyResp {
    result: String,
}

#[async_trait]
impl Uploader for CloudinaryClient {
    async fn upload(&self, file: &Path, kind: AssetKind, folder: &str) -> Result<UploadedMedia> {
        self.ensure_creds()?;
        let bytes = tokio::fs::read(file)
            .await
            .with_context(|| format!("reading media file {}", file.display()))?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "media".into());

        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("folder", folder), ("timestamp", &timestamp)],
            &self.creds.api_secret,
        );

        let mut form = Form::new()
            .text("api_key", self.creds.api_key.clone())
            .text("timestamp", timestamp)
            .text("signature", signature)
            .text("signature_algorithm", "sha256")
            .part("file", Part::bytes(bytes).file_name(file_name));
        if !folder.is_empty() {
            form = form.text("folder", folder.to_string());
        }

        let resp: UploadResp = self
            .http
            .post(self.endpoint(kind, "upload"))
            .multipart(form)
            .send()
            .await
            .context("cloudinary upload request")?
            .error_for_status()
            .context("cloudinary upload non-2xx")?
            .json()
            .await
            .context("cloudinary upload response")?;

        tracing::info!(asset_id = %resp.public_id, kind = kind.as_str(), "media uploaded");
        Ok(UploadedMedia {
            public_url: resp.secure_url,
            asset_id: resp.public_id,
        })
    }
}

#[async_trait]
impl AssetDeleter for CloudinaryClient {
    async fn delete(&self, asset_id: &str, kind: AssetKind) -> Result<()> {
        self.ensure_creds()?;
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign_params(
            &[("public_id", asset_id), ("timestamp", &timestamp)],
            &self.creds.api_secret,
        );
        let params = [
            ("public_id", asset_id.to_string()),
            ("timestamp", timestamp),
            ("api_key", self.creds.api_key.clone()),
            ("signature", signature),
            ("signature_algorithm", "sha256".to_string()),
        ];
        let resp: DestroyResp = self
            .http
            .post(self.endpoint(kind, "destroy"))
            .form(&params)
            .send()
            .await
            .context("cloudinary destroy request")?
            .error_for_status()
            .context("cloudinary destroy non-2xx")?
            .json()
            .await
            .context("cloudinary destroy response")?;
        match resp.result.as_str() {
            "ok" | "not found" => Ok(()),
            other => Err(anyhow!("cloudinary destroy returned {other:?}")),
        }
    }
}
