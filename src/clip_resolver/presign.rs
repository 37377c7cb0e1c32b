use chrono::{DateTime, Utc};
use color_eyre::eyre::{Context, Result, eyre};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::StorageConfig;
use crate::ports::clip::ClipError;

type HmacSha256 = Hmac<Sha256>;

/// Longest expiry S3 accepts for a presigned URL (seven days).
const MAX_EXPIRES_SECONDS: u64 = 604_800;

/// Mints AWS Signature V4 query-string presigned `GET` URLs for object-storage keys.
#[derive(Clone)]
pub struct Presigner {
    scheme: String,
    host: String,
    /// Path prefix before the key: empty for virtual-hosted buckets, `/<bucket>` for custom endpoints.
    path_prefix: String,
    region: String,
    access_key_id: String,
    secret_access_key: String,
}

impl std::fmt::Debug for Presigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presigner")
            .field("host", &self.host)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

impl Presigner {
    pub fn from_config(storage: &StorageConfig) -> Result<Self> {
        let (access_key_id, secret_access_key) = storage.credentials()?;

        let (scheme, host, path_prefix) = match &storage.endpoint {
            Some(endpoint) => {
                let url = Url::parse(endpoint)
                    .wrap_err_with(|| format!("Invalid storage endpoint: {endpoint}"))?;
                let host = url
                    .host_str()
                    .ok_or_else(|| eyre!("Storage endpoint has no host: {endpoint}"))?;
                let host = match url.port() {
                    Some(port) => format!("{host}:{port}"),
                    None => host.to_string(),
                };
                (
                    url.scheme().to_string(),
                    host,
                    format!("/{}", urlencoding::encode(&storage.bucket)),
                )
            }
            None if storage.region == "us-east-1" => (
                "https".to_string(),
                format!("{}.s3.amazonaws.com", storage.bucket),
                String::new(),
            ),
            None => (
                "https".to_string(),
                format!("{}.s3.{}.amazonaws.com", storage.bucket, storage.region),
                String::new(),
            ),
        };

        Ok(Self {
            scheme,
            host,
            path_prefix,
            region: storage.region.clone(),
            access_key_id,
            secret_access_key,
        })
    }

    pub fn presign_get(
        &self,
        key: &str,
        expires_in_seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<String, ClipError> {
        if expires_in_seconds == 0 || expires_in_seconds > MAX_EXPIRES_SECONDS {
            return Err(ClipError::Signing {
                key: key.to_string(),
                reason: format!(
                    "expiry must be between 1 and {MAX_EXPIRES_SECONDS} seconds, got {expires_in_seconds}"
                ),
            });
        }

        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = format!("{date}/{}/s3/aws4_request", self.region);

        let path = format!("{}/{}", self.path_prefix, encode_key(key));
        let credential = format!("{}/{scope}", self.access_key_id);
        // Already in canonical (sorted) order
        let query = [
            ("X-Amz-Algorithm", "AWS4-HMAC-SHA256".to_string()),
            ("X-Amz-Credential", credential),
            ("X-Amz-Date", amz_date.clone()),
            ("X-Amz-Expires", expires_in_seconds.to_string()),
            ("X-Amz-SignedHeaders", "host".to_string()),
        ]
        .iter()
        .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

        let canonical_request = format!(
            "GET\n{path}\n{query}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD",
            self.host
        );
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{:x}",
            Sha256::digest(canonical_request.as_bytes())
        );

        let signing_key = [date.as_str(), self.region.as_str(), "s3", "aws4_request"]
            .iter()
            .try_fold(
                format!("AWS4{}", self.secret_access_key).into_bytes(),
                |acc, part| hmac_sha256(&acc, part.as_bytes()),
            )
            .map_err(|reason| ClipError::Signing {
                key: key.to_string(),
                reason,
            })?;
        let signature = hmac_sha256(&signing_key, string_to_sign.as_bytes())
            .map_err(|reason| ClipError::Signing {
                key: key.to_string(),
                reason,
            })?
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect::<String>();

        Ok(format!(
            "{}://{}{path}?{query}&X-Amz-Signature={signature}",
            self.scheme, self.host
        ))
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, String> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| e.to_string())?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// URI-encodes each path segment of an object key, keeping the separators.
fn encode_key(key: &str) -> String {
    key.trim_start_matches('/')
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
