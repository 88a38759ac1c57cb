//! Batch asset metadata lookup (DAS `getAssetBatch`)

use crate::{
    error::MetadataError,
    token::{TokenMetadata, UNKNOWN_TOKEN_NAME},
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;

/// Source of display metadata keyed by mint address
#[async_trait]
pub trait AssetMetadataSource: Send + Sync {
    async fn fetch_assets(
        &self,
        mints: &[String],
    ) -> Result<HashMap<String, TokenMetadata>, MetadataError>;
}

/// Helius DAS client
pub struct HeliusAssetClient {
    http: reqwest::Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl HeliusAssetClient {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.filter(|url| !url.is_empty()),
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }

    fn endpoint(&self) -> Result<String, MetadataError> {
        match (&self.base_url, &self.api_key) {
            (Some(url), Some(key)) => Ok(format!("{}/?api-key={key}", url.trim_end_matches('/'))),
            _ => Err(MetadataError::MissingCredentials),
        }
    }
}

#[async_trait]
impl AssetMetadataSource for HeliusAssetClient {
    async fn fetch_assets(
        &self,
        mints: &[String],
    ) -> Result<HashMap<String, TokenMetadata>, MetadataError> {
        let endpoint = self.endpoint()?;
        debug!("Requesting metadata for {} mints", mints.len());

        let body = json!({
            "jsonrpc": "2.0",
            "id": "devour",
            "method": "getAssetBatch",
            "params": { "ids": mints },
        });

        let response = self.http.post(endpoint).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::Status(status.as_u16()));
        }

        let payload: serde_json::Value = response.json().await?;
        parse_asset_batch(payload)
    }
}

#[derive(Debug, Deserialize)]
struct AssetBatchResponse {
    #[serde(default)]
    result: Option<Vec<Option<Asset>>>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Asset {
    id: String,
    #[serde(default)]
    content: Option<AssetContent>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetContent {
    #[serde(default)]
    files: Vec<AssetFile>,
    #[serde(default)]
    metadata: Option<AssetMetadata>,
}

#[derive(Debug, Deserialize)]
struct AssetFile {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    cdn_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssetMetadata {
    #[serde(default)]
    name: Option<String>,
}

/// Turn a `getAssetBatch` response into metadata keyed by asset id
pub fn parse_asset_batch(
    payload: serde_json::Value,
) -> Result<HashMap<String, TokenMetadata>, MetadataError> {
    let response: AssetBatchResponse = serde_json::from_value(payload)?;

    if let Some(error) = response.error {
        return Err(MetadataError::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    Ok(response
        .result
        .unwrap_or_default()
        .into_iter()
        .flatten()
        .map(|asset| {
            let content = asset.content.unwrap_or_default();
            (asset.id, asset_metadata(&content))
        })
        .collect())
}

fn asset_metadata(content: &AssetContent) -> TokenMetadata {
    let name = content
        .metadata
        .as_ref()
        .and_then(|meta| meta.name.as_deref())
        .filter(|name| !name.is_empty())
        .unwrap_or(UNKNOWN_TOKEN_NAME)
        .to_string();

    let first = content.files.first();
    let image_uri = first
        .and_then(|file| file.uri.as_deref().filter(|uri| !uri.is_empty()))
        .or_else(|| first.and_then(|file| file.cdn_uri.as_deref().filter(|uri| !uri.is_empty())))
        .unwrap_or_default()
        .to_string();

    TokenMetadata { name, image_uri }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_asset_batch() {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": "devour",
            "result": [
                {
                    "interface": "FungibleToken",
                    "id": "MintA",
                    "content": {
                        "json_uri": "https://example.com/a.json",
                        "files": [{ "uri": "ipfs://QmA", "cdn_uri": "https://cdn/a", "mime": "image/png" }],
                        "metadata": { "name": "Alpha", "symbol": "A", "description": "", "attributes": [] }
                    }
                },
                {
                    "id": "MintB",
                    "content": {
                        "files": [{ "cdn_uri": "https://cdn/b" }],
                        "metadata": { "name": "" }
                    }
                },
                { "id": "MintC", "content": { "files": [], "metadata": {} } },
                null
            ]
        });

        let assets = parse_asset_batch(payload).unwrap();
        assert_eq!(assets.len(), 3);
        assert_eq!(
            assets["MintA"],
            TokenMetadata {
                name: "Alpha".to_string(),
                image_uri: "ipfs://QmA".to_string()
            }
        );
        assert_eq!(assets["MintB"].name, "unknown token");
        assert_eq!(assets["MintB"].image_uri, "https://cdn/b");
        assert_eq!(assets["MintC"].image_uri, "");
    }

    #[test]
    fn test_parse_asset_batch_error_body() {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": "devour",
            "error": { "code": -32602, "message": "invalid ids" }
        });
        let err = parse_asset_batch(payload).unwrap_err();
        assert!(matches!(err, MetadataError::Rpc { code: -32602, .. }));
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let client = HeliusAssetClient::new(Some("https://mainnet.helius-rpc.com".into()), None);
        let err = client.fetch_assets(&["MintA".to_string()]).await.unwrap_err();
        assert!(matches!(err, MetadataError::MissingCredentials));
    }

    #[test]
    fn test_endpoint_format() {
        let client = HeliusAssetClient::new(
            Some("https://mainnet.helius-rpc.com/".into()),
            Some("key".into()),
        );
        assert_eq!(
            client.endpoint().unwrap(),
            "https://mainnet.helius-rpc.com/?api-key=key"
        );
    }
}
