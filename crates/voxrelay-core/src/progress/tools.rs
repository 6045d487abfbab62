//! Tool name → spoken phrase table.

use crate::phrases;

/// Tools the upstream gateway is known to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownTool {
    WebSearch,
    WebFetch,
    Browser,
    MemorySearch,
    MemoryGet,
    Read,
    Write,
    Edit,
    Exec,
    Process,
    Image,
    SessionsSpawn,
    Cron,
}

impl KnownTool {
    /// Look up a tool by its wire name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let tool = match name.to_ascii_lowercase().as_str() {
            "web_search" => Self::WebSearch,
            "web_fetch" => Self::WebFetch,
            "browser" => Self::Browser,
            "memory_search" => Self::MemorySearch,
            "memory_get" => Self::MemoryGet,
            "read" | "read_file" => Self::Read,
            "write" | "write_file" => Self::Write,
            "edit" => Self::Edit,
            "exec" | "bash" => Self::Exec,
            "process" => Self::Process,
            "image" => Self::Image,
            "sessions_spawn" => Self::SessionsSpawn,
            "cron" => Self::Cron,
            _ => return None,
        };
        Some(tool)
    }

    pub const fn phrase(self) -> &'static str {
        match self {
            Self::WebSearch => "Searching the web...",
            Self::WebFetch => "Pulling up that page...",
            Self::Browser => "Opening the browser...",
            Self::MemorySearch => "Checking my memory...",
            Self::MemoryGet => "Looking through my notes...",
            Self::Read => "Reading a file...",
            Self::Write => "Writing that down...",
            Self::Edit => "Making an edit...",
            Self::Exec => "Running a command...",
            Self::Process => "Checking on a running task...",
            Self::Image => "Looking at an image...",
            Self::SessionsSpawn => "Handing part of this to a helper...",
            Self::Cron => "Setting up a reminder...",
        }
    }
}

/// Spoken phrase for any tool name; unmapped names get the templated phrase.
pub fn tool_phrase(name: &str) -> String {
    KnownTool::from_name(name).map_or_else(
        || phrases::tool_fallback(name),
        |tool| tool.phrase().to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tools_map_to_phrases() {
        assert_eq!(tool_phrase("web_search"), "Searching the web...");
        assert_eq!(tool_phrase("memory_search"), "Checking my memory...");
        assert_eq!(tool_phrase("bash"), tool_phrase("exec"));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(KnownTool::from_name("Web_Search"), Some(KnownTool::WebSearch));
    }

    #[test]
    fn unmapped_tool_uses_fallback() {
        assert_eq!(tool_phrase("calendar_lookup"), "Working on calendar_lookup...");
    }
}
