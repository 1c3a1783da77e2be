/// How a failed load degrades the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The catalog listing could not be fetched; no topics are shown.
    Network,
    /// The selected document could not be fetched or parsed.
    Content,
    /// A title lookup failed; the filename is shown instead.
    TitleResolution,
    /// The question index came back empty; the flashcard shows the sentinel.
    Aggregation,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Content => "content",
            Self::TitleResolution => "title",
            Self::Aggregation => "index",
        }
    }
}
