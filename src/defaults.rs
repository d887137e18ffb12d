//! Default configuration values
//!
//! These are fixed configuration: there is no runtime override surface for
//! them, matching the downstream tooling that parses the static file.

/// SSH user stamped into every host entry
pub const DEFAULT_SSH_USER: &str = "ec2-user";

/// SSH private key path, tilde-expanded before use
pub const DEFAULT_SSH_KEY_PATH: &str = "~/.ssh/id_rsa";

/// Static inventory file, overwritten unconditionally on every run
pub const DEFAULT_INVENTORY_FILE: &str = "aws_inventory.ini";

/// Expand a leading `~` against `$HOME`.
///
/// Only the current user's home is handled; `~other/` forms and paths
/// without a leading tilde pass through untouched.
pub fn expand_tilde(path: &str) -> String {
    let Ok(home) = std::env::var("HOME") else {
        return path.to_string();
    };
    let home = home.trim_end_matches('/');

    if path == "~" {
        return home.to_string();
    }
    match path.strip_prefix("~/") {
        Some(rest) => format!("{home}/{rest}"),
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_path_passes_through() {
        assert_eq!(expand_tilde("/etc/ssh/key.pem"), "/etc/ssh/key.pem");
    }

    #[test]
    fn relative_path_passes_through() {
        assert_eq!(expand_tilde("keys/id_rsa"), "keys/id_rsa");
    }

    #[test]
    fn other_user_home_passes_through() {
        assert_eq!(expand_tilde("~other/key.pem"), "~other/key.pem");
    }

    #[test]
    fn tilde_prefix_expands_against_home() {
        let Ok(home) = std::env::var("HOME") else {
            return; // nothing to expand against in this environment
        };
        let home = home.trim_end_matches('/');
        assert_eq!(expand_tilde("~/.ssh/id_rsa"), format!("{home}/.ssh/id_rsa"));
        assert_eq!(expand_tilde("~"), home);
    }
}
