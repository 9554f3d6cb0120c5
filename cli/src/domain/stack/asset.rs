//! Code assets: Lambda code located by a pair of S3 stack parameters.

use efsml_common::intrinsic::reference;
use serde_json::{Value, json};

use crate::domain::error::StackError;
use crate::domain::stack::StackScope;

/// Metadata key recording the code fingerprint on the consuming resource.
pub const ASSET_HASH_METADATA: &str = "efsml:asset-hash";

/// A code asset and its bucket/key parameters.
#[derive(Debug, Clone)]
pub struct CodeAsset {
    pub bucket_parameter: String,
    pub key_parameter: String,
    /// SHA-256 of the source directory, when it was available at synth time.
    pub fingerprint: Option<String>,
}

impl CodeAsset {
    /// Declare `{name}S3Bucket` and `{name}S3Key`.
    ///
    /// # Errors
    ///
    /// Returns an error if either parameter id is already taken.
    pub fn declare(
        scope: &mut StackScope,
        name: &str,
        description: &str,
        fingerprint: Option<String>,
    ) -> Result<Self, StackError> {
        let bucket_parameter = format!("{name}S3Bucket");
        let key_parameter = format!("{name}S3Key");
        scope.add_parameter(&bucket_parameter, &format!("S3 bucket for {description}"))?;
        scope.add_parameter(&key_parameter, &format!("S3 key for {description}"))?;
        Ok(Self {
            bucket_parameter,
            key_parameter,
            fingerprint,
        })
    }

    /// The `Code` property of a Lambda function.
    #[must_use]
    pub fn code_property(&self) -> Value {
        json!({
            "S3Bucket": reference(&self.bucket_parameter),
            "S3Key": reference(&self.key_parameter),
        })
    }

    /// `(key, value)` metadata for the consuming resource, if fingerprinted.
    #[must_use]
    pub fn metadata(&self) -> Option<(&'static str, Value)> {
        self.fingerprint
            .as_ref()
            .map(|hash| (ASSET_HASH_METADATA, json!(hash)))
    }
}
