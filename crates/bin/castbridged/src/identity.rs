//! Stable machine identity for the discovery device block.
//!
//! Home Assistant groups entities by `device.identifiers`, so the token
//! must survive restarts and stay unique per machine. The systemd machine
//! id is the best candidate; the kernel hostname is the portable fallback.

use std::fs;
use std::path::Path;

/// Resolve a stable per-machine token.
///
/// Tries, in order: `/etc/machine-id`, `/var/lib/dbus/machine-id`, the
/// kernel hostname. `fallback` (typically the configured sensor name) is
/// used when none of those are readable.
#[must_use]
pub fn machine_token(fallback: &str) -> String {
    read_token(Path::new("/etc/machine-id"))
        .or_else(|| read_token(Path::new("/var/lib/dbus/machine-id")))
        .or_else(|| read_token(Path::new("/proc/sys/kernel/hostname")))
        .unwrap_or_else(|| fallback.to_string())
}

fn read_token(path: &Path) -> Option<String> {
    let content = fs::read_to_string(path).ok()?;
    let token = content.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_read_and_trim_token_file() {
        let path = std::env::temp_dir().join("castbridge-identity-test");
        fs::write(&path, "3f2a9cdeadbeef\n").unwrap();

        assert_eq!(read_token(&path), Some("3f2a9cdeadbeef".to_string()));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn should_skip_empty_token_file() {
        let path = std::env::temp_dir().join("castbridge-identity-empty");
        fs::write(&path, "\n").unwrap();

        assert_eq!(read_token(&path), None);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn should_skip_missing_token_file() {
        assert_eq!(read_token(Path::new("/nonexistent/machine-id")), None);
    }

    #[test]
    fn should_produce_a_stable_non_empty_token() {
        let first = machine_token("studio");
        let second = machine_token("studio");
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }
}
