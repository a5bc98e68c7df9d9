//! Begin/end tokens delimiting one command's output in a transcript.

/// Fixed prefix shared by every marker token.
///
/// Nothing a device prints contains this sequence, so a token can only
/// appear in the transcript because the script put it there.
pub const MARKER_PREFIX: &str = "@@FSCRAPE";

/// Marker pair for the command at `index` of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMarker {
    /// Position of the command in its batch.
    pub index: usize,

    /// Token emitted before the command.
    pub begin: String,

    /// Token emitted after the command.
    pub end: String,
}

impl SessionMarker {
    /// Derive the marker pair for a batch position.
    ///
    /// Both tokens end in a closing delimiter, so the token for index 1 is
    /// never a prefix of the token for index 10.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            begin: format!("{MARKER_PREFIX}_{index}_BEGIN@@"),
            end: format!("{MARKER_PREFIX}_{index}_END@@"),
        }
    }

    /// Markers for a batch of `len` commands.
    pub fn for_batch(len: usize) -> Vec<SessionMarker> {
        (0..len).map(SessionMarker::new).collect()
    }

    /// Whether a line carries any marker token.
    pub fn is_marker_text(line: &str) -> bool {
        line.contains(MARKER_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_is_deterministic() {
        assert_eq!(SessionMarker::new(3), SessionMarker::new(3));
        assert_eq!(SessionMarker::new(0).begin, "@@FSCRAPE_0_BEGIN@@");
        assert_eq!(SessionMarker::new(0).end, "@@FSCRAPE_0_END@@");
    }

    #[test]
    fn test_tokens_are_not_prefixes_of_each_other() {
        let markers = SessionMarker::for_batch(12);
        for a in &markers {
            for b in &markers {
                if a.index != b.index {
                    assert!(!b.begin.contains(&a.begin));
                    assert!(!b.end.contains(&a.end));
                }
                assert!(!b.end.contains(&a.begin));
            }
        }
    }

    #[test]
    fn test_is_marker_text() {
        assert!(SessionMarker::is_marker_text("R1#echo @@FSCRAPE_4_END@@"));
        assert!(!SessionMarker::is_marker_text("R1#show clock"));
    }
}
