//! Parsing of terminal input lines.

use palaver_widget::HostSignal;

/// What one input line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send a chat message.
    Say(String),
    /// Forward a host signal.
    Signal(HostSignal),
    /// Sign in as the given id.
    Login(String),
    /// Sign out.
    Logout,
    /// Clear all history.
    Reset,
    /// Print the session status.
    Status,
    /// Print the command list.
    Help,
    /// Leave.
    Quit,
    /// An unrecognized slash command.
    Unknown(String),
}

/// Usage text for the slash commands.
pub const HELP: &str = "\
/online                  mark the host reachable
/offline                 mark the host unreachable
/maintenance <message>   start a maintenance window
/maintenance off         end the maintenance window
/login <id>              sign in
/logout                  sign out
/reset                   clear all history
/status                  show session status
/quit                    leave";

impl Command {
    /// Parses one line. Lines not starting with `/` are chat messages.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let Some(rest) = line.strip_prefix('/') else {
            return Self::Say(line.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match (name, arg) {
            ("online", _) => Self::Signal(HostSignal::Online),
            ("offline", _) => Self::Signal(HostSignal::Offline),
            ("maintenance", "off") => Self::Signal(HostSignal::MaintenanceInactive),
            ("maintenance", message) => Self::Signal(HostSignal::MaintenanceActive {
                message: message.to_string(),
            }),
            ("login", id) if !id.is_empty() => Self::Login(id.to_string()),
            ("logout", _) => Self::Logout,
            ("reset", _) => Self::Reset,
            ("status", _) => Self::Status,
            ("help", _) => Self::Help,
            ("quit" | "exit", _) => Self::Quit,
            _ => Self::Unknown(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(Command::parse("  hello there "), Command::Say("hello there".to_string()));
    }

    #[test]
    fn maintenance_commands() {
        assert_eq!(
            Command::parse("/maintenance Back at noon"),
            Command::Signal(HostSignal::MaintenanceActive {
                message: "Back at noon".to_string()
            })
        );
        assert_eq!(
            Command::parse("/maintenance"),
            Command::Signal(HostSignal::MaintenanceActive {
                message: String::new()
            })
        );
        assert_eq!(
            Command::parse("/maintenance off"),
            Command::Signal(HostSignal::MaintenanceInactive)
        );
    }

    #[test]
    fn login_requires_an_id() {
        assert_eq!(Command::parse("/login u1"), Command::Login("u1".to_string()));
        assert_eq!(Command::parse("/login"), Command::Unknown("/login".to_string()));
    }

    #[test]
    fn simple_commands() {
        assert_eq!(Command::parse("/online"), Command::Signal(HostSignal::Online));
        assert_eq!(Command::parse("/offline"), Command::Signal(HostSignal::Offline));
        assert_eq!(Command::parse("/logout"), Command::Logout);
        assert_eq!(Command::parse("/reset"), Command::Reset);
        assert_eq!(Command::parse("/status"), Command::Status);
        assert_eq!(Command::parse("/quit"), Command::Quit);
        assert_eq!(Command::parse("/dance"), Command::Unknown("/dance".to_string()));
    }
}
