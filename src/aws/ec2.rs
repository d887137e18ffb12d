//! EC2 instance listing
//!
//! Fetches the full DescribeInstances response and flattens the
//! reservations -> instances nesting into plain `InstanceRecord`s.
//! No state or IP filtering happens here; the inventory fold decides
//! what to keep.

use crate::aws::context::AwsContext;
use anyhow::{Context, Result};
use aws_sdk_ec2::types::Instance;
use std::collections::BTreeMap;
use tracing::debug;

/// Flattened view of one instance from a DescribeInstances response.
///
/// Ephemeral: built fresh per invocation and discarded after the output
/// writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    pub instance_id: String,
    /// Instance state name as reported by EC2 (e.g. "running", "stopped")
    pub state: String,
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
    pub tags: BTreeMap<String, String>,
}

impl TryFrom<&Instance> for InstanceRecord {
    type Error = anyhow::Error;

    fn try_from(instance: &Instance) -> Result<Self> {
        let instance_id = instance
            .instance_id()
            .context("instance in response is missing an instance id")?
            .to_string();
        let state = instance
            .state()
            .and_then(|s| s.name())
            .with_context(|| format!("instance {instance_id} is missing a state name"))?
            .as_str()
            .to_string();

        Ok(Self {
            instance_id,
            state,
            public_ip: instance.public_ip_address().map(str::to_string),
            private_ip: instance.private_ip_address().map(str::to_string),
            tags: extract_tags(instance.tags()),
        })
    }
}

/// EC2 client for listing inventory instances
pub struct Ec2Client {
    client: aws_sdk_ec2::Client,
}

impl Ec2Client {
    /// Create a new EC2 client (loads AWS config from the environment)
    pub async fn new(region: Option<&str>) -> Self {
        let ctx = AwsContext::new(region).await;
        Self::from_context(&ctx)
    }

    /// Create an EC2 client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.ec2_client(),
        }
    }

    /// List all instances in the region, in response order.
    ///
    /// Issues DescribeInstances with no filters and drains the paginator,
    /// so large fleets are not truncated. Any transport or auth error
    /// propagates to the caller.
    pub async fn describe_instances(&self) -> Result<Vec<InstanceRecord>> {
        let mut records = Vec::new();

        let mut pages = self.client.describe_instances().into_paginator().send();
        while let Some(page) = pages.next().await {
            let page = page.context("Failed to describe instances")?;
            for reservation in page.reservations() {
                for instance in reservation.instances() {
                    records.push(InstanceRecord::try_from(instance)?);
                }
            }
        }

        debug!(count = records.len(), "Fetched EC2 instances");
        Ok(records)
    }
}

fn extract_tags(tags: &[aws_sdk_ec2::types::Tag]) -> BTreeMap<String, String> {
    tags.iter()
        .filter_map(|t| match (t.key(), t.value()) {
            (Some(k), Some(v)) => Some((k.to_string(), v.to_string())),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::{InstanceState, InstanceStateName, Tag};

    fn tag(key: &str, value: &str) -> Tag {
        Tag::builder().key(key).value(value).build()
    }

    #[test]
    fn record_from_full_instance() {
        let instance = Instance::builder()
            .instance_id("i-0abc")
            .state(
                InstanceState::builder()
                    .name(InstanceStateName::Running)
                    .build(),
            )
            .public_ip_address("1.2.3.4")
            .private_ip_address("10.0.0.4")
            .tags(tag("Name", "web1"))
            .tags(tag("group", "web"))
            .build();

        let record = InstanceRecord::try_from(&instance).unwrap();
        assert_eq!(record.instance_id, "i-0abc");
        assert_eq!(record.state, "running");
        assert_eq!(record.public_ip.as_deref(), Some("1.2.3.4"));
        assert_eq!(record.private_ip.as_deref(), Some("10.0.0.4"));
        assert_eq!(record.tags.get("Name").map(String::as_str), Some("web1"));
        assert_eq!(record.tags.get("group").map(String::as_str), Some("web"));
    }

    #[test]
    fn record_without_optional_fields() {
        let instance = Instance::builder()
            .instance_id("i-0def")
            .state(
                InstanceState::builder()
                    .name(InstanceStateName::Stopped)
                    .build(),
            )
            .build();

        let record = InstanceRecord::try_from(&instance).unwrap();
        assert_eq!(record.state, "stopped");
        assert_eq!(record.public_ip, None);
        assert_eq!(record.private_ip, None);
        assert!(record.tags.is_empty());
    }

    #[test]
    fn missing_instance_id_is_an_error() {
        let instance = Instance::builder()
            .state(
                InstanceState::builder()
                    .name(InstanceStateName::Running)
                    .build(),
            )
            .build();

        let err = InstanceRecord::try_from(&instance).unwrap_err();
        assert!(err.to_string().contains("instance id"), "{err}");
    }

    #[test]
    fn missing_state_is_an_error() {
        let instance = Instance::builder().instance_id("i-0abc").build();

        let err = InstanceRecord::try_from(&instance).unwrap_err();
        assert!(err.to_string().contains("state"), "{err}");
    }

    #[test]
    fn tags_without_key_or_value_are_dropped() {
        let instance = Instance::builder()
            .instance_id("i-0abc")
            .state(
                InstanceState::builder()
                    .name(InstanceStateName::Running)
                    .build(),
            )
            .tags(Tag::builder().key("orphan-key").build())
            .tags(tag("Name", "db1"))
            .build();

        let record = InstanceRecord::try_from(&instance).unwrap();
        assert_eq!(record.tags.len(), 1);
        assert_eq!(record.tags.get("Name").map(String::as_str), Some("db1"));
    }
}
