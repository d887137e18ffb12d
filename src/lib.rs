//! ec2-inventory - Ansible dynamic inventory for EC2 instances
//!
//! Queries the EC2 DescribeInstances API, groups running instances by their
//! `group` tag, and renders the result both as a static INI inventory file
//! and as the JSON structure Ansible's dynamic-inventory protocol consumes.

pub mod aws;
pub mod defaults;
pub mod inventory;
