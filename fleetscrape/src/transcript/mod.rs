//! Raw session transcripts and their conversion into per-command output.
//!
//! A [`RawTranscript`] holds every byte the transport client produced during
//! one session. It is consumed once by [`RawTranscript::demultiplex`], which
//! cuts it into one [`Segment`] per command using the session's marker
//! tokens. Segments are then cleaned with the dialect's [`NoiseFilter`].

mod demux;
mod noise;

use std::path::{Path, PathBuf};

use memchr::memmem;

pub use demux::{Segment, SegmentStatus};
pub use noise::{NoiseFilter, NoiseRule, keep_line};

use crate::channel::escape;
use crate::command::SessionMarker;

/// Captured output of one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTranscript {
    bytes: Vec<u8>,
}

impl RawTranscript {
    /// Wrap captured bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The captured bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Captured length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of markers whose begin token appears in the transcript.
    pub fn matched_markers(&self, markers: &[SessionMarker]) -> usize {
        markers
            .iter()
            .filter(|marker| memmem::find(&self.bytes, marker.begin.as_bytes()).is_some())
            .count()
    }

    /// Cut the transcript into one segment per marker, in marker order.
    ///
    /// Escape sequences are removed before cutting so a token split by a
    /// cursor sequence is still found. The result depends only on the
    /// transcript and the markers.
    pub fn demultiplex(self, markers: &[SessionMarker]) -> Vec<Segment> {
        demultiplex_bytes(&self.bytes, markers)
    }

    /// Persist the raw bytes to `{dir}/{hostname}.transcript.log`.
    pub async fn dump(&self, dir: &Path, hostname: &str) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("{}.transcript.log", sanitize_file_stem(hostname)));
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}

impl From<Vec<u8>> for RawTranscript {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

/// Demultiplex a borrowed region of output, e.g. the part of a live
/// session written since one command was sent.
pub(crate) fn demultiplex_bytes(bytes: &[u8], markers: &[SessionMarker]) -> Vec<Segment> {
    let text = escape::strip_str(bytes);
    demux::split(&text, markers)
}

/// Replace characters that are unsafe in a file name.
fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.trim_matches('.').is_empty() {
        "device".to_string()
    } else {
        stem
    }
}
