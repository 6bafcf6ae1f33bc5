// ABOUTME: Control surface for the alert engine: enable, disable, status verbs
// ABOUTME: Prefix-parsed, role-gated, idempotent over the shared readiness flag

use std::sync::atomic::{AtomicBool, Ordering};

/// A recognized control verb
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Enable,
    Disable,
    Status,
}

/// Parse a message body into a control command.
/// Returns None for non-commands and unknown verbs.
pub fn parse_control_command(prefix: &str, body: &str) -> Option<ControlCommand> {
    let rest = body.strip_prefix(prefix)?;
    match rest.trim() {
        "enable" => Some(ControlCommand::Enable),
        "disable" => Some(ControlCommand::Disable),
        "status" => Some(ControlCommand::Status),
        _ => None,
    }
}

/// Whether the invoker holds the role required to drive the control surface
pub fn is_authorized(control_role: &str, invoker_roles: &[String]) -> bool {
    invoker_roles.iter().any(|role| role == control_role)
}

/// Apply a control command to the readiness flag and return the reply text.
/// Transitions are idempotent; re-enabling an enabled service only reports state.
pub fn apply_control_command(command: ControlCommand, ready: &AtomicBool) -> String {
    match command {
        ControlCommand::Enable => {
            ready.store(true, Ordering::SeqCst);
            "Stream alerts are enabled!".to_string()
        }
        ControlCommand::Disable => {
            ready.store(false, Ordering::SeqCst);
            "Stream alerts are disabled!".to_string()
        }
        ControlCommand::Status => {
            let state = if ready.load(Ordering::SeqCst) {
                "enabled"
            } else {
                "disabled"
            };
            format!("Stream alerts are currently {}.", state)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_recognizes_all_verbs() {
        assert_eq!(
            parse_control_command(".", ".enable"),
            Some(ControlCommand::Enable)
        );
        assert_eq!(
            parse_control_command(".", ".disable"),
            Some(ControlCommand::Disable)
        );
        assert_eq!(
            parse_control_command(".", ".status"),
            Some(ControlCommand::Status)
        );
    }

    #[test]
    fn test_parse_ignores_non_commands() {
        assert_eq!(parse_control_command(".", "enable"), None);
        assert_eq!(parse_control_command(".", "hello there"), None);
        assert_eq!(parse_control_command(".", ".restart"), None);
        assert_eq!(parse_control_command(".", ""), None);
    }

    #[test]
    fn test_parse_respects_configured_prefix() {
        assert_eq!(
            parse_control_command("!", "!status"),
            Some(ControlCommand::Status)
        );
        assert_eq!(parse_control_command("!", ".status"), None);
    }

    #[test]
    fn test_parse_tolerates_trailing_whitespace() {
        assert_eq!(
            parse_control_command(".", ".enable  "),
            Some(ControlCommand::Enable)
        );
    }

    #[test]
    fn test_authorization_checks_role_name() {
        let roles = vec!["Member".to_string(), "Mod".to_string()];
        assert!(is_authorized("Mod", &roles));
        assert!(!is_authorized("Admin", &roles));
        assert!(!is_authorized("Mod", &[]));
    }

    #[test]
    fn test_enable_and_disable_flip_the_flag() {
        let ready = AtomicBool::new(false);
        let reply = apply_control_command(ControlCommand::Enable, &ready);
        assert!(ready.load(Ordering::SeqCst));
        assert_eq!(reply, "Stream alerts are enabled!");

        let reply = apply_control_command(ControlCommand::Disable, &ready);
        assert!(!ready.load(Ordering::SeqCst));
        assert_eq!(reply, "Stream alerts are disabled!");
    }

    #[test]
    fn test_transitions_are_idempotent() {
        let ready = AtomicBool::new(true);
        apply_control_command(ControlCommand::Enable, &ready);
        apply_control_command(ControlCommand::Enable, &ready);
        assert!(ready.load(Ordering::SeqCst));
    }

    #[test]
    fn test_status_reports_without_mutating() {
        let ready = AtomicBool::new(true);
        assert_eq!(
            apply_control_command(ControlCommand::Status, &ready),
            "Stream alerts are currently enabled."
        );
        assert!(ready.load(Ordering::SeqCst));

        ready.store(false, Ordering::SeqCst);
        assert_eq!(
            apply_control_command(ControlCommand::Status, &ready),
            "Stream alerts are currently disabled."
        );
    }
}
