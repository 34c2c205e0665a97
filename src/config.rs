//! Backend configuration.
//!
//! The driver builds one [`BackendConfig`] per run from CLI flags. Every field has a default, so library callers
//! can start from `BackendConfig::default()` and override what they need.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

/// How a unit's output is split into files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputLayout {
    /// Three files per unit: declarations, definitions, method bodies.
    #[default]
    Single,
    /// The three unit files plus one `.h`/`.cpp` pair per type.
    FilePerType,
}

/// Default comment written at the top of every generated file.
pub const DEFAULT_BANNER: &str = "Generated by nativize. Do not edit.";

/// Options controlling one translation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub layout: OutputLayout,
    /// Managed full names of types that must not be generated.
    pub excluded: HashSet<String>,
    /// Spaces per indentation level.
    pub indent: usize,
    /// Emit enum types before anything else.
    pub enum_prepass: bool,
    pub banner: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            layout: OutputLayout::Single,
            excluded: HashSet::new(),
            indent: 4,
            enum_prepass: true,
            banner: DEFAULT_BANNER.to_string(),
        }
    }
}

impl BackendConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layout(mut self, layout: OutputLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_excluded<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_enum_prepass(mut self, enabled: bool) -> Self {
        self.enum_prepass = enabled;
        self
    }

    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = banner.into();
        self
    }
}

/// Parse a do-not-generate list: one managed type name per line. Blank lines and `#` comments are ignored.
pub fn parse_exclusion_list(text: &str) -> HashSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read an exclusion list from disk.
pub fn load_exclusion_list(path: &Path) -> io::Result<HashSet<String>> {
    Ok(parse_exclusion_list(&fs::read_to_string(path)?))
}
