//! S3-compatible object store client.
//!
//! A thin layer over `object_store`'s Amazon S3 backend. Requests use
//! path-style addressing (`{endpoint}/{bucket}/{key}`), which Cloudflare R2
//! and most S3-compatible stores accept. With credentials configured every
//! request is signed; without them requests go out unsigned, which works
//! for public buckets.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ClientOptions, ObjectStore};
use tracing::debug;

use super::{validate_key, RemoteError, RemoteSource};

/// Default bucket holding the tile objects.
pub const DEFAULT_BUCKET: &str = "optimal-stargazing-locator";

/// Region name used for signing. R2 accepts `auto`.
pub const DEFAULT_REGION: &str = "auto";

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Access key pair for request signing.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Connection settings for [`S3Source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    /// Base URL of the service, e.g. `https://<account>.r2.cloudflarestorage.com`
    pub endpoint: String,
    pub bucket: String,
    pub region: String,
    pub credentials: Option<Credentials>,
    pub connect_timeout: Duration,
}

impl S3Config {
    /// Settings for an arbitrary S3-compatible endpoint.
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            region: DEFAULT_REGION.to_string(),
            credentials: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Settings for a Cloudflare R2 account.
    pub fn r2(account_id: &str, bucket: impl Into<String>) -> Self {
        Self::new(r2_endpoint(account_id), bucket)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

/// Endpoint URL of a Cloudflare R2 account.
pub fn r2_endpoint(account_id: &str) -> String {
    format!("https://{}.r2.cloudflarestorage.com", account_id)
}

/// [`RemoteSource`] over an S3-compatible HTTP API.
pub struct S3Source {
    store: Arc<dyn ObjectStore>,
    config: S3Config,
}

impl S3Source {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// [`RemoteError::Transport`] if the endpoint is not an absolute
    /// http(s) URL or the client cannot be built.
    pub fn new(config: S3Config) -> Result<Self, RemoteError> {
        let endpoint = normalize_endpoint(&config.endpoint)?;

        let client_options = ClientOptions::new()
            .with_connect_timeout(config.connect_timeout)
            .with_allow_http(endpoint.starts_with("http://"));

        let builder = AmazonS3Builder::new()
            .with_endpoint(endpoint)
            .with_bucket_name(&config.bucket)
            .with_region(&config.region)
            .with_virtual_hosted_style_request(false)
            .with_client_options(client_options);

        let builder = match &config.credentials {
            Some(credentials) => builder
                .with_access_key_id(&credentials.access_key)
                .with_secret_access_key(&credentials.secret_key),
            None => builder.with_skip_signature(true),
        };

        let store = builder
            .build()
            .map_err(|e| RemoteError::Transport(format!("failed to create S3 client: {}", e)))?;

        Ok(Self::with_store(Arc::new(store), config))
    }

    /// Wrap an already-built store.
    pub(crate) fn with_store(store: Arc<dyn ObjectStore>, config: S3Config) -> Self {
        Self { store, config }
    }

    /// Get the connection settings.
    pub fn config(&self) -> &S3Config {
        &self.config
    }
}

impl fmt::Debug for S3Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Source")
            .field("endpoint", &self.config.endpoint)
            .field("bucket", &self.config.bucket)
            .field("signed", &self.config.credentials.is_some())
            .finish()
    }
}

/// Check the endpoint is an absolute http(s) URL and drop trailing slashes.
fn normalize_endpoint(endpoint: &str) -> Result<String, RemoteError> {
    let trimmed = endpoint.trim_end_matches('/');
    let authority = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| {
            RemoteError::Transport(format!("unsupported endpoint {:?}: expected http(s) URL", endpoint))
        })?;
    if authority.is_empty() || authority.contains(char::is_whitespace) {
        return Err(RemoteError::Transport(format!(
            "endpoint has no valid host: {:?}",
            endpoint
        )));
    }
    Ok(trimmed.to_string())
}

fn object_path(key: &str) -> Result<ObjectPath, RemoteError> {
    validate_key(key)?;
    ObjectPath::parse(key).map_err(|_| RemoteError::InvalidKey(key.to_string()))
}

fn store_error(key: &str, e: object_store::Error) -> RemoteError {
    match e {
        object_store::Error::NotFound { .. } => RemoteError::Miss(key.to_string()),
        e => RemoteError::Transport(format!("request for {} failed: {}", key, e)),
    }
}

#[allow(clippy::manual_async_fn)]
impl RemoteSource for S3Source {
    fn fetch(&self, key: &str) -> impl Future<Output = Result<Vec<u8>, RemoteError>> + Send {
        async move {
            let path = object_path(key)?;
            let result = self.store.get(&path).await.map_err(|e| store_error(key, e))?;
            let bytes = result.bytes().await.map_err(|e| store_error(key, e))?;
            debug!(key = %key, size = bytes.len(), "GET object");
            Ok(bytes.to_vec())
        }
    }

    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, RemoteError>> + Send {
        async move {
            let path = object_path(key)?;
            match self.store.head(&path).await {
                Ok(_) => Ok(true),
                Err(e) => match store_error(key, e) {
                    RemoteError::Miss(_) => Ok(false),
                    other => Err(other),
                },
            }
        }
    }

    fn name(&self) -> &str {
        "s3"
    }
}
