//! AWS error classification
//!
//! SDK errors are classified by their `.code()` instead of string matching on
//! the Debug format. Collaborators return [`AwsError`] so the orchestrator
//! can log a failure kind and a hint without knowing which SDK produced it.

use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata};
use thiserror::Error;

/// AWS error categories
#[derive(Debug, Error)]
pub enum AwsError {
    /// Rate limit exceeded (the SDK already retried)
    #[error("Rate limit exceeded: {message}")]
    Throttled { message: String },

    /// Credentials lack permission for the call
    #[error("Access denied ({code}): {message}")]
    AccessDenied { code: String, message: String },

    /// Region is not enabled for the account
    #[error("Region not enabled for this account: {message}")]
    OptInRequired { message: String },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl AwsError {
    /// The AWS error code, if the service returned one
    pub fn code(&self) -> Option<&str> {
        match self {
            AwsError::Throttled { .. } => Some("Throttling"),
            AwsError::AccessDenied { code, .. } => Some(code),
            AwsError::OptInRequired { .. } => Some("OptInRequired"),
            AwsError::Sdk { code, .. } => code.as_deref(),
        }
    }

    /// Get a user-friendly suggestion for resolving this error, if available.
    pub fn suggestion(&self) -> Option<&'static str> {
        self.code().and_then(suggestion_for_code)
    }
}

/// A metric batch was not fully delivered.
///
/// Backends that split a batch into several requests stop at the first
/// failing request; `delivered` counts the points published before it.
#[derive(Debug, Error)]
#[error("{source}{}", partial_suffix(*.delivered))]
pub struct TransmitError {
    /// Points already published when the failure happened
    pub delivered: usize,
    #[source]
    pub source: AwsError,
}

impl TransmitError {
    pub fn is_partial(&self) -> bool {
        self.delivered > 0
    }
}

impl From<AwsError> for TransmitError {
    fn from(source: AwsError) -> Self {
        Self {
            delivered: 0,
            source,
        }
    }
}

fn partial_suffix(delivered: usize) -> String {
    if delivered == 0 {
        String::new()
    } else {
        format!(" ({delivered} points were already published)")
    }
}

/// Known AWS error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &["Throttling", "ThrottlingException", "RequestLimitExceeded"];

/// Known AWS error codes for missing permissions or bad credentials
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "UnauthorizedOperation",
    "AuthFailure",
    "InvalidClientTokenId",
    "ExpiredToken",
];

/// Known AWS error codes for disabled opt-in regions
const OPT_IN_CODES: &[&str] = &["OptInRequired"];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> AwsError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if THROTTLING_CODES.contains(&c) => AwsError::Throttled { message },
        Some(c) if ACCESS_DENIED_CODES.contains(&c) => AwsError::AccessDenied {
            code: c.to_string(),
            message,
        },
        Some(c) if OPT_IN_CODES.contains(&c) => AwsError::OptInRequired { message },
        _ => AwsError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify any SDK operation error.
///
/// Errors that never reached the service (dispatch, timeout, credential
/// resolution) carry no metadata; their full context chain becomes the
/// message.
pub fn from_sdk_error<E>(error: &E) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error,
{
    let context = DisplayErrorContext(error).to_string();
    classify_aws_error(error.code(), Some(error.message().unwrap_or(&context)))
}

/// Error code to user-friendly suggestion mapping
const SUGGESTIONS: &[(&str, &str)] = &[
    (
        "UnauthorizedOperation",
        "Grant ec2:DescribeRegions, ec2:DescribeInstances and cloudwatch:PutMetricData.",
    ),
    (
        "AccessDenied",
        "Grant ec2:DescribeRegions, ec2:DescribeInstances and cloudwatch:PutMetricData.",
    ),
    (
        "AccessDeniedException",
        "Grant ec2:DescribeRegions, ec2:DescribeInstances and cloudwatch:PutMetricData.",
    ),
    (
        "AuthFailure",
        "Check that AWS credentials are configured and valid for this region.",
    ),
    (
        "InvalidClientTokenId",
        "Check that AWS credentials are configured and valid for this region.",
    ),
    ("ExpiredToken", "Refresh the AWS session credentials."),
    (
        "OptInRequired",
        "Enable the region for the account or exclude it from discovery.",
    ),
    (
        "Throttling",
        "AWS API rate limit hit. The next pass will try again.",
    ),
];

/// Get a user-friendly suggestion for a known error code.
fn suggestion_for_code(code: &str) -> Option<&'static str> {
    SUGGESTIONS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, s)| *s)
}
