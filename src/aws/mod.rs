//! AWS client modules
//!
//! - `context`: shared SDK configuration loading
//! - `ec2`: DescribeInstances fetch, flattened into `InstanceRecord`s

pub mod context;
pub mod ec2;

pub use context::AwsContext;
pub use ec2::{Ec2Client, InstanceRecord};
