//! ec2-inventory: Ansible dynamic inventory for EC2 instances
//!
//! Lists instances via DescribeInstances, groups the running ones by their
//! `group` tag, writes a static INI inventory file on every run, and with
//! `--list` prints the full inventory as JSON for Ansible.

use anyhow::Result;
use clap::Parser;
use ec2_inventory::aws::{AwsContext, Ec2Client};
use ec2_inventory::defaults::DEFAULT_INVENTORY_FILE;
use ec2_inventory::inventory::{self, InventorySettings};
use std::path::Path;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "ec2-inventory")]
#[command(about = "Ansible dynamic inventory for EC2 instances")]
#[command(version)]
struct Args {
    /// Print the full inventory as JSON on stdout (Ansible dynamic-inventory protocol)
    #[arg(long)]
    list: bool,

    /// AWS region (defaults to the ambient SDK resolution)
    #[arg(long)]
    region: Option<String>,

    /// AWS profile to use (overrides AWS_PROFILE env var)
    #[arg(long)]
    profile: Option<String>,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&e);
        std::process::exit(1);
    }
}

/// Print the error and its cause chain to stderr
fn print_error(e: &anyhow::Error) {
    use std::io::Write;

    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "\x1b[1;31mError:\x1b[0m {e}");

    let mut source = e.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  \x1b[33mCaused by:\x1b[0m {cause}");
        source = cause.source();
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();

    // Ansible consumes stdout when invoked with --list; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let aws = AwsContext::with_profile(args.region.as_deref(), args.profile.as_deref()).await;
    if let Some(profile) = &args.profile {
        info!(profile = %profile, "Using AWS profile");
    }

    let ec2 = Ec2Client::from_context(&aws);
    let records = ec2.describe_instances().await?;
    info!(
        count = records.len(),
        region = aws.region().unwrap_or("default"),
        "Fetched EC2 instances"
    );

    let inventory = inventory::build_inventory(&records, &InventorySettings::default());

    // The static file is written on every run, --list or not.
    inventory::write_ini_file(&inventory, Path::new(DEFAULT_INVENTORY_FILE))?;

    if args.list {
        println!("{}", inventory.to_json_pretty()?);
    } else {
        println!("Inventory written to {DEFAULT_INVENTORY_FILE}");
        println!("Hint: use with Ansible like this:");
        println!("  ansible-playbook playbook.yml -i ./ec2-inventory");
    }

    Ok(())
}
