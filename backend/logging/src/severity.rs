//! Message severities and the ANSI color palette used to decorate them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resets the terminal to its default styling.
pub const RESET: &str = "\x1b[0m";

/// Category of a log message. Doubles as the literal tag in every output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
    Debug,
    Trace,
}

impl Severity {
    pub const ALL: [Severity; 6] = [
        Severity::Info,
        Severity::Success,
        Severity::Warning,
        Severity::Error,
        Severity::Debug,
        Severity::Trace,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Success => "SUCCESS",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Debug => "DEBUG",
            Severity::Trace => "TRACE",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown severity \"{0}\"")]
pub struct UnknownSeverity(pub String);

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSeverity(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Palette
// ---------------------------------------------------------------------------

/// Fixed mapping from severity to a terminal escape sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette([Option<&'static str>; 6]);

impl Palette {
    /// Seven-bit ANSI foreground colors.
    pub const ANSI: Palette = Palette([
        Some("\x1b[34m"), // blue
        Some("\x1b[32m"), // green
        Some("\x1b[33m"), // yellow
        Some("\x1b[31m"), // red
        Some("\x1b[35m"), // magenta
        Some("\x1b[36m"), // cyan
    ]);

    pub fn code(&self, severity: Severity) -> Option<&'static str> {
        self.0[severity.index()]
    }

    /// Copy of this palette with no entry for `severity`.
    pub fn without(mut self, severity: Severity) -> Palette {
        self.0[severity.index()] = None;
        self
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette::ANSI
    }
}

/// Wrap the severity tag and/or the message in the severity's color.
///
/// `foreground` colors the message text, `background` colors the tag text.
/// Both may apply. A severity missing from `palette` is returned untouched.
pub fn colorize(
    palette: &Palette,
    severity: Severity,
    message: &str,
    foreground: bool,
    background: bool,
) -> (String, String) {
    let tag = severity.as_str();
    let Some(code) = palette.code(severity) else {
        return (tag.to_string(), message.to_string());
    };

    let message = if foreground {
        format!("{code}{message}{RESET}")
    } else {
        message.to_string()
    };
    let tag = if background {
        format!("{code}{tag}{RESET}")
    } else {
        tag.to_string()
    };
    (tag, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_upper_case() {
        let tags: Vec<_> = Severity::ALL.iter().map(|s| s.to_string()).collect();
        assert_eq!(tags, ["INFO", "SUCCESS", "WARNING", "ERROR", "DEBUG", "TRACE"]);
    }

    #[test]
    fn parses_tags_case_insensitively() {
        assert_eq!("warning".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!(" TRACE ".parse::<Severity>().unwrap(), Severity::Trace);
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn serializes_as_tag() {
        let json = serde_json::to_string(&Severity::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
        let back: Severity = serde_json::from_str("\"DEBUG\"").unwrap();
        assert_eq!(back, Severity::Debug);
    }

    #[test]
    fn ansi_palette_matches_terminal_colors() {
        let p = Palette::ANSI;
        assert_eq!(p.code(Severity::Info), Some("\x1b[34m"));
        assert_eq!(p.code(Severity::Success), Some("\x1b[32m"));
        assert_eq!(p.code(Severity::Warning), Some("\x1b[33m"));
        assert_eq!(p.code(Severity::Error), Some("\x1b[31m"));
        assert_eq!(p.code(Severity::Debug), Some("\x1b[35m"));
        assert_eq!(p.code(Severity::Trace), Some("\x1b[36m"));
    }

    #[test]
    fn foreground_wraps_message_only() {
        let (tag, msg) = colorize(&Palette::ANSI, Severity::Error, "disk full", true, false);
        assert_eq!(tag, "ERROR");
        assert_eq!(msg, "\x1b[31mdisk full\x1b[0m");
    }

    #[test]
    fn background_wraps_tag_only() {
        let (tag, msg) = colorize(&Palette::ANSI, Severity::Trace, "hop", false, true);
        assert_eq!(tag, "\x1b[36mTRACE\x1b[0m");
        assert_eq!(msg, "hop");
    }

    #[test]
    fn both_modes_apply_together() {
        for sev in Severity::ALL {
            let code = Palette::ANSI.code(sev).unwrap();
            let (tag, msg) = colorize(&Palette::ANSI, sev, "m", true, true);
            assert_eq!(tag, format!("{code}{}{RESET}", sev.as_str()));
            assert_eq!(msg, format!("{code}m{RESET}"));
        }
    }

    #[test]
    fn missing_entry_passes_through() {
        let palette = Palette::ANSI.without(Severity::Debug);
        let (tag, msg) = colorize(&palette, Severity::Debug, "raw", true, true);
        assert_eq!(tag, "DEBUG");
        assert_eq!(msg, "raw");
        // Other entries are untouched.
        assert!(palette.code(Severity::Info).is_some());
    }
}
