//! Line commands read from standard input.

use tether_domain::AppStatus;

/// A parsed console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start an interactive login.
    Login,
    /// End the session.
    Logout,
    /// Report a host status change.
    Status(AppStatus),
    /// Print the current session.
    Show,
    /// Print the command list.
    Help,
    /// Stop the service.
    Quit,
}

/// Text printed by [`Command::Help`].
pub const HELP: &str = "commands: login | logout | active | inactive | background | show | help | quit";

impl Command {
    /// Parses one line. Blank lines and unknown words yield `None`.
    pub fn parse(line: &str) -> Option<Self> {
        let word = line.trim().to_lowercase();
        match word.as_str() {
            "login" => Some(Self::Login),
            "logout" => Some(Self::Logout),
            "show" | "whoami" => Some(Self::Show),
            "help" | "?" => Some(Self::Help),
            "quit" | "exit" => Some(Self::Quit),
            other => other.parse::<AppStatus>().ok().map(Self::Status),
        }
    }
}
