//! EC2 region discovery and instance listing

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::{AwsError, from_sdk_error};
use crate::operations::{InstanceFetcher, RegionLister};
use aws_sdk_ec2::types::{Filter, Instance};
use instance_count_common::RawInstance;
use tracing::debug;

/// Filter name for instance lifecycle state
const STATE_FILTER: &str = "instance-state-name";

/// Lists the regions enabled for the account via `DescribeRegions`
pub struct Ec2RegionLister {
    client: aws_sdk_ec2::Client,
}

impl FromAwsContext for Ec2RegionLister {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
        }
    }
}

impl RegionLister for Ec2RegionLister {
    async fn list_regions(&self) -> Result<Vec<String>, AwsError> {
        let response = self
            .client
            .describe_regions()
            .send()
            .await
            .map_err(|e| from_sdk_error(&e))?;

        let regions: Vec<String> = response
            .regions()
            .iter()
            .filter_map(|r| r.region_name())
            .map(str::to_string)
            .collect();

        for region in &regions {
            debug!(region = %region, "Discovered region");
        }
        Ok(regions)
    }
}

/// Lists instances in a region via paginated `DescribeInstances`
pub struct Ec2InstanceFetcher {
    ctx: AwsContext,
    states: Vec<String>,
}

impl FromAwsContext for Ec2InstanceFetcher {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            ctx: ctx.clone(),
            states: Vec::new(),
        }
    }
}

impl Ec2InstanceFetcher {
    /// Only list instances in these lifecycle states (e.g. "running").
    /// An empty list counts every state.
    pub fn with_states(mut self, states: Vec<String>) -> Self {
        self.states = states;
        self
    }
}

/// Build the lifecycle state filter, or `None` to list every state
fn state_filter(states: &[String]) -> Option<Filter> {
    if states.is_empty() {
        return None;
    }
    Some(
        Filter::builder()
            .name(STATE_FILTER)
            .set_values(Some(states.to_vec()))
            .build(),
    )
}

impl InstanceFetcher for Ec2InstanceFetcher {
    async fn fetch_instances(&self, region: &str) -> Result<Vec<RawInstance>, AwsError> {
        let client = self.ctx.ec2_client_for_region(region);

        let mut pages = client
            .describe_instances()
            .set_filters(state_filter(&self.states).map(|f| vec![f]))
            .into_paginator()
            .send();

        let mut instances = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| from_sdk_error(&e))?;
            for reservation in page.reservations() {
                instances.extend(reservation.instances().iter().map(raw_instance));
            }
        }

        debug!(region = %region, count = instances.len(), "Fetched instances");
        Ok(instances)
    }
}

/// Copy the fields the classifier needs out of an SDK instance
pub fn raw_instance(instance: &Instance) -> RawInstance {
    let placement = instance.placement();

    RawInstance {
        instance_id: instance.instance_id().map(str::to_string),
        instance_type: instance.instance_type().map(|t| t.as_str().to_string()),
        availability_zone: placement
            .and_then(|p| p.availability_zone())
            .map(str::to_string),
        tenancy: placement
            .and_then(|p| p.tenancy())
            .map(|t| t.as_str().to_string()),
        platform: instance.platform().map(|p| p.as_str().to_string()),
        state: instance
            .state()
            .and_then(|s| s.name())
            .map(|n| n.as_str().to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::{
        InstanceState, InstanceStateName, InstanceType, Placement, PlatformValues, Tenancy,
    };

    fn sdk_instance() -> aws_sdk_ec2::types::builders::InstanceBuilder {
        Instance::builder()
            .instance_id("i-0abc")
            .instance_type(InstanceType::M5Large)
            .placement(
                Placement::builder()
                    .availability_zone("us-west-2a")
                    .tenancy(Tenancy::Default)
                    .build(),
            )
            .state(
                InstanceState::builder()
                    .name(InstanceStateName::Running)
                    .build(),
            )
    }

    #[test]
    fn test_raw_instance_linux() {
        let raw = raw_instance(&sdk_instance().build());
        assert_eq!(
            raw,
            RawInstance {
                instance_id: Some("i-0abc".to_string()),
                instance_type: Some("m5.large".to_string()),
                availability_zone: Some("us-west-2a".to_string()),
                tenancy: Some("default".to_string()),
                platform: None,
                state: Some("running".to_string()),
            }
        );
    }

    #[test]
    fn test_raw_instance_windows_dedicated() {
        let instance = sdk_instance()
            .platform(PlatformValues::Windows)
            .placement(
                Placement::builder()
                    .availability_zone("us-east-1b")
                    .tenancy(Tenancy::Dedicated)
                    .build(),
            )
            .build();

        let raw = raw_instance(&instance);
        assert_eq!(raw.platform.as_deref(), Some("Windows"));
        assert_eq!(raw.tenancy.as_deref(), Some("dedicated"));
        assert_eq!(raw.availability_zone.as_deref(), Some("us-east-1b"));
    }

    #[test]
    fn test_raw_instance_without_placement() {
        let instance = Instance::builder().instance_id("i-0def").build();
        let raw = raw_instance(&instance);
        assert_eq!(raw.instance_id.as_deref(), Some("i-0def"));
        assert!(raw.availability_zone.is_none());
        assert!(raw.tenancy.is_none());
        assert!(raw.state.is_none());
    }

    #[test]
    fn test_state_filter() {
        assert!(state_filter(&[]).is_none());

        let filter = state_filter(&["pending".to_string(), "running".to_string()]).unwrap();
        assert_eq!(filter.name(), Some(STATE_FILTER));
        assert_eq!(filter.values(), ["pending", "running"]);
    }

    #[tokio::test]
    #[ignore = "requires AWS credentials"]
    async fn test_list_regions() {
        let ctx = AwsContext::new("us-east-2").await;
        let regions = Ec2RegionLister::from_context(&ctx)
            .list_regions()
            .await
            .unwrap();
        assert!(regions.iter().any(|r| r == "us-east-2"));
    }
}
