//! AWS SigV4 presigned POST policies
//!
//! Builds the form fields a browser needs to upload straight into an S3
//! bucket. The policy is base64-encoded JSON and the signature is an
//! HMAC-SHA256 of that base64 string under the SigV4 signing key.
//!
//! Reference: https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-post-example.html

use super::UploadPolicy;
use base64::{Engine as _, engine::general_purpose};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";

/// Credentials used to sign a policy.
#[derive(Debug, Clone, Copy)]
pub struct SigningCredentials<'a> {
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub session_token: Option<&'a str>,
}

/// Build the signed form fields for uploading `key` into `bucket`.
///
/// The only payload condition is `content-length-range [0, policy.max_bytes]`;
/// no content-type condition is added.
pub fn post_policy_fields(
    bucket: &str,
    key: &str,
    region: &str,
    credentials: &SigningCredentials<'_>,
    policy: UploadPolicy,
    now: DateTime<Utc>,
) -> BTreeMap<String, String> {
    let date_str = now.format("%Y%m%d").to_string();
    let datetime_str = now.format("%Y%m%dT%H%M%SZ").to_string();
    let credential = format!(
        "{}/{date_str}/{region}/{SERVICE}/aws4_request",
        credentials.access_key_id
    );

    let expires_in = i64::try_from(policy.expires_in.as_secs()).unwrap_or(i64::MAX);
    let expiration = now + chrono::Duration::seconds(expires_in);

    let mut conditions = vec![
        json!({ "bucket": bucket }),
        json!({ "key": key }),
        json!(["content-length-range", 0, policy.max_bytes]),
        json!({ "x-amz-algorithm": ALGORITHM }),
        json!({ "x-amz-credential": credential }),
        json!({ "x-amz-date": datetime_str }),
    ];
    if let Some(token) = credentials.session_token {
        conditions.push(json!({ "x-amz-security-token": token }));
    }

    let document = json!({
        "expiration": expiration.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        "conditions": conditions,
    });
    let encoded_policy = general_purpose::STANDARD.encode(document.to_string());

    let signing_key =
        derive_signing_key(credentials.secret_access_key, &date_str, region, SERVICE);
    let signature = hex::encode(hmac_sha256(&signing_key, encoded_policy.as_bytes()));

    let mut fields = BTreeMap::new();
    fields.insert("bucket".to_string(), bucket.to_string());
    fields.insert("key".to_string(), key.to_string());
    fields.insert("X-Amz-Algorithm".to_string(), ALGORITHM.to_string());
    fields.insert("X-Amz-Credential".to_string(), credential);
    fields.insert("X-Amz-Date".to_string(), datetime_str);
    if let Some(token) = credentials.session_token {
        fields.insert("X-Amz-Security-Token".to_string(), token.to_string());
    }
    fields.insert("Policy".to_string(), encoded_policy);
    fields.insert("X-Amz-Signature".to_string(), signature);
    fields
}

/// Derive the SigV4 signing key from the secret access key and scope components.
fn derive_signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}
