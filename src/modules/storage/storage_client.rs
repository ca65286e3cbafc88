//! MinIO/S3-compatible object storage client.
//!
//! Holds the profile images served by the platform. Everything under
//! the upload prefix is world-readable; the client provisions the
//! bucket and its read policy on startup.

use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Client, Url};
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::core::config::StorageConfig;
use crate::core::error::AppError;

type HmacSha256 = Hmac<Sha256>;

pub struct StorageClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: String,
    upload_prefix: String,
    access_key: String,
    secret_key: String,
    region_name: String,
    http_client: Client,
}

impl StorageClient {
    /// Build the client, create the bucket if missing and make the
    /// upload prefix publicly readable.
    pub async fn new(config: StorageConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create storage credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create storage bucket: {}", e)))?;

        // MinIO serves buckets path-style (http://endpoint/bucket).
        bucket.set_path_style();

        let http_client = Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let client = Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
            public_endpoint: config.public_endpoint,
            upload_prefix: config.upload_prefix,
            access_key: config.access_key,
            secret_key: config.secret_key,
            region_name: config.region,
            http_client,
        };

        client.ensure_bucket_exists().await?;
        client.set_public_read_policy().await?;

        info!(
            "Storage client initialized for endpoint: {}, bucket: {}, prefix: {}",
            client.endpoint,
            client.bucket.name(),
            client.upload_prefix
        );

        Ok(client)
    }

    /// Create the bucket if it does not exist yet.
    async fn ensure_bucket_exists(&self) -> Result<(), AppError> {
        match self.create_bucket().await {
            Ok(_) => {
                info!("Bucket '{}' created", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                    Ok(())
                } else {
                    // The bucket may exist behind a different error;
                    // keep starting and let the first upload tell.
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                    Ok(())
                }
            }
        }
    }

    async fn create_bucket(&self) -> Result<(), AppError> {
        Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            BucketConfiguration::default(),
        )
        .await
        .map_err(|e| {
            AppError::Internal(format!(
                "Failed to create bucket '{}': {}",
                self.bucket.name(),
                e
            ))
        })?;

        Ok(())
    }

    /// Allow anonymous reads under the upload prefix so image URLs can
    /// be served directly. rust-s3 has no policy API, so the PUT is
    /// signed by hand with AWS Signature v4.
    async fn set_public_read_policy(&self) -> Result<(), AppError> {
        let bucket_name = self.bucket.name();
        let upload_prefix = &self.upload_prefix;

        let policy = json!({
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Allow",
                    "Principal": {"AWS": "*"},
                    "Action": ["s3:GetObject"],
                    "Resource": [format!("arn:aws:s3:::{bucket_name}/{upload_prefix}/*")]
                }
            ]
        });

        match self
            .put_bucket_policy_with_sigv4(&bucket_name, &policy.to_string())
            .await
        {
            Ok(_) => {
                info!("Set public read policy for {}/{}/*", bucket_name, upload_prefix);
                Ok(())
            }
            Err(e) => {
                // Startup continues; the policy can be set manually with
                // `mc anonymous set download`.
                warn!(
                    "Failed to set bucket policy for '{}': {}. Set it manually with: \
                     mc anonymous set download minio/{}/{}",
                    bucket_name, e, bucket_name, upload_prefix
                );
                Ok(())
            }
        }
    }

    async fn put_bucket_policy_with_sigv4(
        &self,
        bucket_name: &str,
        policy: &str,
    ) -> Result<(), AppError> {
        let now = Utc::now();
        let date_stamp = now.format("%Y%m%d").to_string();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();

        let endpoint_url = Url::parse(&self.endpoint)
            .map_err(|e| AppError::Internal(format!("Invalid endpoint URL: {}", e)))?;
        let host = endpoint_url
            .host_str()
            .ok_or_else(|| AppError::Internal("Endpoint URL has no host".to_string()))?;
        let host_header = match endpoint_url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        let url = format!("{}/{}?policy", self.endpoint, bucket_name);
        let payload_hash = hex::encode(Sha256::digest(policy.as_bytes()));

        let canonical_uri = format!("/{}", bucket_name);
        let canonical_querystring = "policy=";
        let canonical_headers = format!(
            "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
            host_header, payload_hash, amz_date
        );
        let signed_headers = "host;x-amz-content-sha256;x-amz-date";

        let canonical_request = format!(
            "PUT\n{}\n{}\n{}\n{}\n{}",
            canonical_uri, canonical_querystring, canonical_headers, signed_headers, payload_hash
        );

        let algorithm = "AWS4-HMAC-SHA256";
        let credential_scope = format!("{}/{}/s3/aws4_request", date_stamp, self.region_name);
        let canonical_request_hash = hex::encode(Sha256::digest(canonical_request.as_bytes()));
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            algorithm, amz_date, credential_scope, canonical_request_hash
        );

        let signature = self.calculate_signature(&date_stamp, &string_to_sign)?;
        let authorization_header = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            algorithm, self.access_key, credential_scope, signed_headers, signature
        );

        let response = self
            .http_client
            .put(&url)
            .header("Host", &host_header)
            .header("x-amz-date", &amz_date)
            .header("x-amz-content-sha256", &payload_hash)
            .header("Authorization", &authorization_header)
            .header("Content-Type", "application/json")
            .body(policy.to_string())
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to send policy request: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(AppError::Internal(format!(
                "Failed to set bucket policy: {} - {}",
                status, body
            )))
        }
    }

    /// AWS Signature v4 over the derived signing key chain.
    fn calculate_signature(
        &self,
        date_stamp: &str,
        string_to_sign: &str,
    ) -> Result<String, AppError> {
        let k_date = Self::hmac_sha256(
            format!("AWS4{}", self.secret_key).as_bytes(),
            date_stamp.as_bytes(),
        )?;
        let k_region = Self::hmac_sha256(&k_date, self.region_name.as_bytes())?;
        let k_service = Self::hmac_sha256(&k_region, b"s3")?;
        let k_signing = Self::hmac_sha256(&k_service, b"aws4_request")?;

        let signature = Self::hmac_sha256(&k_signing, string_to_sign.as_bytes())?;
        Ok(hex::encode(signature))
    }

    fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, AppError> {
        let mut mac = HmacSha256::new_from_slice(key)
            .map_err(|e| AppError::Internal(format!("HMAC key error: {}", e)))?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Object key under the upload prefix for a path like
    /// `{user_id}/{uuid}.{ext}`.
    pub fn generate_key(&self, path: &str) -> String {
        format!("{}/{}", self.upload_prefix, path)
    }

    pub async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        self.bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to upload file '{}': {}", key, e)))?;

        debug!("Uploaded '{}' to bucket '{}'", key, self.bucket.name());
        Ok(key.to_string())
    }

    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.bucket
            .delete_object(key)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to delete file '{}': {}", key, e)))?;

        debug!("Deleted '{}' from bucket '{}'", key, self.bucket.name());
        Ok(())
    }

    /// Direct URL a browser can fetch, via the public endpoint.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket.name(), key)
    }
}
