//! AWS adapters for region discovery, instance listing and metric publishing

pub mod cloudwatch;
pub mod context;
pub mod ec2;
pub mod error;

pub use cloudwatch::CloudWatchSink;
pub use context::{AwsContext, FromAwsContext};
pub use ec2::{Ec2InstanceFetcher, Ec2RegionLister};
pub use error::{AwsError, TransmitError, classify_aws_error, from_sdk_error};
