//! Inventory fold and serialization
//!
//! `build_inventory` is a pure fold from the fetched instance list to an
//! immutable `Inventory` value; the two output formats (static INI file,
//! Ansible JSON) are rendered from that value.
//!
//! ## Inventory Tag Schema
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `Name`  | Host alias; falls back to the instance id when absent |
//! | `group` | Inventory group; falls back to `ungrouped` when absent |

use anyhow::{Context, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::aws::ec2::InstanceRecord;
use crate::defaults::{expand_tilde, DEFAULT_SSH_KEY_PATH, DEFAULT_SSH_USER};

/// Tag key for the host alias
pub const TAG_NAME: &str = "Name";

/// Tag key for the inventory group
pub const TAG_GROUP: &str = "group";

/// Group for instances without a `group` tag
pub const UNGROUPED: &str = "ungrouped";

/// Instance state accepted into the inventory
const STATE_RUNNING: &str = "running";

/// Connection settings stamped into every host's variables.
#[derive(Debug, Clone)]
pub struct InventorySettings {
    pub ssh_user: String,
    /// Private key path, already tilde-expanded
    pub ssh_key_file: String,
}

impl Default for InventorySettings {
    fn default() -> Self {
        Self {
            ssh_user: DEFAULT_SSH_USER.to_string(),
            ssh_key_file: expand_tilde(DEFAULT_SSH_KEY_PATH),
        }
    }
}

/// Per-host variables consumed by Ansible at execution time.
///
/// `private_ip` and `tags` appear only in the JSON output; the static INI
/// format carries the connection variables alone.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HostVars {
    pub ansible_host: String,
    pub ansible_user: String,
    pub ansible_ssh_private_key_file: String,
    pub instance_id: String,
    pub private_ip: Option<String>,
    pub tags: BTreeMap<String, String>,
}

/// A named bucket of host aliases, in API response order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub hosts: Vec<String>,
}

/// The grouped inventory: groups in first-seen order plus per-alias hostvars.
///
/// On alias collision the later record overwrites the earlier hostvars entry
/// in place (keeping its original position) while the alias is appended to
/// the group host list again, matching what the downstream tooling was
/// written against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    groups: Vec<Group>,
    hostvars: Vec<(String, HostVars)>,
}

impl Inventory {
    /// Groups in insertion order (first seen in the API response).
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Look up hostvars for an alias.
    pub fn host_vars(&self, alias: &str) -> Option<&HostVars> {
        self.hostvars
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, vars)| vars)
    }

    /// Number of hostvars entries.
    pub fn host_count(&self) -> usize {
        self.hostvars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hostvars.is_empty()
    }

    fn add_host(&mut self, group: &str, alias: String, vars: HostVars) {
        match self.groups.iter_mut().find(|g| g.name == group) {
            Some(g) => g.hosts.push(alias.clone()),
            None => self.groups.push(Group {
                name: group.to_string(),
                hosts: vec![alias.clone()],
            }),
        }

        // Overwrite keeps the first-insertion position on alias collision.
        match self.hostvars.iter_mut().find(|(a, _)| *a == alias) {
            Some((_, existing)) => *existing = vars,
            None => self.hostvars.push((alias, vars)),
        }
    }

    /// Render the full inventory as pretty-printed JSON (Ansible `--list`).
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize inventory")
    }
}

/// Fold the raw instance list into an inventory.
///
/// Instances that are not running or have no public IP are skipped; every
/// other instance lands in the group named by its `group` tag under the
/// alias from its `Name` tag (instance id when untagged).
pub fn build_inventory(records: &[InstanceRecord], settings: &InventorySettings) -> Inventory {
    let mut inventory = Inventory::default();

    for record in records {
        if record.state != STATE_RUNNING {
            debug!(
                instance_id = %record.instance_id,
                state = %record.state,
                "Skipping non-running instance"
            );
            continue;
        }
        let Some(public_ip) = record.public_ip.as_deref() else {
            debug!(instance_id = %record.instance_id, "Skipping instance without public IP");
            continue;
        };

        let alias = record
            .tags
            .get(TAG_NAME)
            .cloned()
            .unwrap_or_else(|| record.instance_id.clone());
        let group = record
            .tags
            .get(TAG_GROUP)
            .map(String::as_str)
            .unwrap_or(UNGROUPED);

        inventory.add_host(
            group,
            alias,
            HostVars {
                ansible_host: public_ip.to_string(),
                ansible_user: settings.ssh_user.clone(),
                ansible_ssh_private_key_file: settings.ssh_key_file.clone(),
                instance_id: record.instance_id.clone(),
                private_ip: record.private_ip.clone(),
                tags: record.tags.clone(),
            },
        );
    }

    inventory
}

/// Render the static INI inventory.
///
/// One bracketed section per group in insertion order, one host line per
/// alias, a blank line after each section. Byte-reproducible for identical
/// input; `private_ip` and `tags` are intentionally omitted from this format.
pub fn render_ini(inventory: &Inventory) -> String {
    let mut out = String::new();

    for group in inventory.groups() {
        out.push_str(&format!("[{}]\n", group.name));
        for host in &group.hosts {
            if let Some(vars) = inventory.host_vars(host) {
                out.push_str(&format!(
                    "{} ansible_host={} ansible_user={} ansible_ssh_private_key_file={}\n",
                    host, vars.ansible_host, vars.ansible_user, vars.ansible_ssh_private_key_file
                ));
            }
        }
        out.push('\n');
    }

    out
}

/// Write the static INI inventory, overwriting any previous run's file.
pub fn write_ini_file(inventory: &Inventory, path: &Path) -> Result<()> {
    std::fs::write(path, render_ini(inventory))
        .with_context(|| format!("Failed to write inventory file {}", path.display()))?;
    info!(path = %path.display(), hosts = inventory.host_count(), "Inventory written");
    Ok(())
}

// JSON shape: {"_meta": {"hostvars": {...}}, "<group>": {"hosts": [...]}, ...}
// `_meta` is emitted first, then groups in insertion order.
impl Serialize for Inventory {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.groups.len() + 1))?;
        map.serialize_entry("_meta", &Meta(&self.hostvars))?;
        for group in &self.groups {
            map.serialize_entry(&group.name, &GroupHosts(&group.hosts))?;
        }
        map.end()
    }
}

struct Meta<'a>(&'a [(String, HostVars)]);

impl Serialize for Meta<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("hostvars", &HostVarsMap(self.0))?;
        map.end()
    }
}

struct HostVarsMap<'a>(&'a [(String, HostVars)]);

impl Serialize for HostVarsMap<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (alias, vars) in self.0 {
            map.serialize_entry(alias, vars)?;
        }
        map.end()
    }
}

struct GroupHosts<'a>(&'a [String]);

impl Serialize for GroupHosts<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("hosts", self.0)?;
        map.end()
    }
}
