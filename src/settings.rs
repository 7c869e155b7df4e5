/// Parameters controlling how a diff is computed and rendered.
#[derive(Debug, Clone)]
pub struct DiffSettings {
    /// Similarity threshold in `[0, 1]` under which the two documents are
    /// considered too different to diff (0 disables the gate).
    pub cutoff: f64,
    /// Whether to treat the inputs as lenient HTML (with HTML-specific
    /// cleanup and list/table repair) or as strict XML.
    pub html: bool,
    /// Whether to indent the output, two spaces per depth level.
    pub pretty: bool,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            cutoff: 0.0,
            html: true,
            pretty: false,
        }
    }
}
