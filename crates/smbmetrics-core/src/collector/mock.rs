//! In-memory `smbstatus` stand-in for testing collectors and exporters.

use std::collections::HashMap;

use super::command::{CollectError, StatusCommand};

/// Canned `smbstatus` outputs keyed by the exact argument list.
///
/// Invocations with arguments that were never registered fail the same way a
/// non-zero exit of the real command does.
#[derive(Debug, Clone, Default)]
pub struct MockSmbStatus {
    outputs: HashMap<Vec<String>, String>,
}

impl MockSmbStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the output returned for `args`.
    pub fn add_output(&mut self, args: &[&str], output: impl Into<String>) {
        let key = args.iter().map(|a| a.to_string()).collect();
        self.outputs.insert(key, output.into());
    }

    /// Builder form of [`MockSmbStatus::add_output`].
    pub fn with_output(mut self, args: &[&str], output: impl Into<String>) -> Self {
        self.add_output(args, output);
        self
    }
}

impl StatusCommand for MockSmbStatus {
    fn run(&self, args: &[&str]) -> Result<String, CollectError> {
        let key: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        self.outputs
            .get(&key)
            .map(|out| out.trim().to_string())
            .ok_or_else(|| CollectError::Command(format!("smbstatus {}: exit status: 1", args.join(" "))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registered_output() {
        let mock = MockSmbStatus::new().with_output(&["--version"], "Version 4.19.4\n");
        assert_eq!(mock.run(&["--version"]).unwrap(), "Version 4.19.4");
    }

    #[test]
    fn test_unknown_args_fail() {
        let mock = MockSmbStatus::new().with_output(&["-S", "--json"], "{}");
        assert!(matches!(mock.run(&["-S"]), Err(CollectError::Command(_))));
        assert!(matches!(
            mock.run(&["--json", "-S"]),
            Err(CollectError::Command(_))
        ));
    }
}
