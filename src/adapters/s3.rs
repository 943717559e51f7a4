use crate::domain::ports::HostingProvider;
use crate::utils::error::{ReaperError, Result};
use crate::utils::validation::validate_artifact_key;
use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::delete_object::DeleteObjectError;
use aws_sdk_s3::Client as S3Client;
use std::fmt::Debug;

/// Portfolios stored as blobs at `{bucket}/{prefix}/{key}.html`.
#[derive(Debug, Clone)]
pub struct S3Hosting {
    client: S3Client,
    bucket: String,
    prefix: String,
}

impl S3Hosting {
    pub fn new(client: S3Client, bucket: String, prefix: String) -> Self {
        Self {
            client,
            bucket,
            prefix,
        }
    }

    pub fn object_key(&self, key: &str) -> String {
        object_key(&self.prefix, key)
    }
}

pub fn object_key(prefix: &str, key: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}.html", key)
    } else {
        format!("{}/{}.html", prefix, key)
    }
}

#[async_trait]
impl HostingProvider for S3Hosting {
    fn name(&self) -> &str {
        "s3"
    }

    async fn delete_artifact(&self, key: &str) -> Result<()> {
        validate_artifact_key(key).map_err(|e| ReaperError::HostingFailure {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        // DeleteObject 對不存在的物件同樣回傳 204
        let object = self.object_key(key);
        let result = self
            .client
            .delete_object()
            .bucket(&self.bucket)
            .key(&object)
            .send()
            .await;

        match result {
            Ok(_output) => {
                tracing::debug!(key, bucket = %self.bucket, object = %object, "Deleted blob");
                Ok(())
            }
            Err(err) => classify_s3_failure(key, S3Failure::from_sdk_error(err)),
        }
    }
}

/// A failed S3 call, reduced to what decides retry versus give up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum S3Failure {
    /// Never reached S3 or got no usable answer (dispatch, timeout, unparseable response).
    Transport(String),
    /// The request could not be built.
    Construction(String),
    Service {
        code: Option<String>,
        message: Option<String>,
    },
}

impl S3Failure {
    pub fn from_sdk_error<R>(err: SdkError<DeleteObjectError, R>) -> Self
    where
        R: Debug + Send + Sync + 'static,
    {
        match &err {
            SdkError::DispatchFailure(_) | SdkError::TimeoutError(_) | SdkError::ResponseError(_) => {
                return S3Failure::Transport(DisplayErrorContext(&err).to_string());
            }
            SdkError::ConstructionFailure(_) => {
                return S3Failure::Construction(DisplayErrorContext(&err).to_string());
            }
            _ => {}
        }

        let service = err.into_service_error();
        S3Failure::Service {
            code: service.code().map(str::to_string),
            message: service.message().map(str::to_string),
        }
    }
}

pub fn classify_s3_failure(key: &str, failure: S3Failure) -> Result<()> {
    match failure {
        S3Failure::Transport(message) => Err(ReaperError::HostingUnavailable {
            key: key.to_string(),
            message,
        }),
        S3Failure::Construction(message) => Err(ReaperError::HostingFailure {
            key: key.to_string(),
            message,
        }),
        S3Failure::Service { code, message } => {
            classify_s3_error(key, code.as_deref(), message.as_deref())
        }
    }
}

/// Maps S3 error codes onto the reaper's hosting error kinds.
pub fn classify_s3_error(key: &str, code: Option<&str>, message: Option<&str>) -> Result<()> {
    let message = message.unwrap_or("no message").to_string();

    match code {
        Some("NoSuchKey") => Ok(()),
        Some("AccessDenied" | "InvalidAccessKeyId" | "SignatureDoesNotMatch" | "ExpiredToken") => {
            Err(ReaperError::HostingNotAuthorized {
                key: key.to_string(),
                message,
            })
        }
        Some("SlowDown" | "Throttling" | "ThrottlingException" | "RequestLimitExceeded") => {
            Err(ReaperError::HostingRateLimited {
                key: key.to_string(),
                retry_after: None,
            })
        }
        other => Err(ReaperError::HostingFailure {
            key: key.to_string(),
            message: format!("{}: {}", other.unwrap_or("Unhandled"), message),
        }),
    }
}
