//! Extension allow-list for uploaded pictures.

/// Extensions accepted when no configuration overrides them.
pub const DEFAULT_ALLOWED: &[&str] = &["jpg", "png"];

/// The text after the last `.` of `filename`, or `None` when there is no dot.
///
/// `"a.tar.png"` yields `"png"` and `".png"` yields `"png"`. A trailing dot
/// yields an empty extension.
pub fn extension_of(filename: &str) -> Option<&str> {
    filename.rfind('.').map(|idx| &filename[idx + 1..])
}

/// Case-insensitive allow-list of file extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionPolicy {
    allowed: Vec<String>,
}

impl ExtensionPolicy {
    /// Build a policy from bare extensions (`"png"`, not `".png"`).
    ///
    /// Entries are lowercased; blanks and duplicates are dropped while the
    /// first-seen order is kept.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut allowed: Vec<String> = Vec::new();
        for ext in extensions {
            let ext = ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase();
            if !ext.is_empty() && !allowed.contains(&ext) {
                allowed.push(ext);
            }
        }
        Self { allowed }
    }

    /// Whether `filename` carries an allowed extension.
    ///
    /// Total over all inputs: names without a dot are never allowed.
    pub fn is_allowed(&self, filename: &str) -> bool {
        match extension_of(filename) {
            Some(ext) if !ext.is_empty() => {
                self.allowed.iter().any(|a| a.eq_ignore_ascii_case(ext))
            }
            _ => false,
        }
    }

    /// Allowed extensions in configured order.
    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }
}

impl Default for ExtensionPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED)
    }
}
