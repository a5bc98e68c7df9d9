//! Marker-based transcript demultiplexing.
//!
//! Cutting works on whole lines. A marker token shows up inside a line that
//! also carries a prompt and the input that produced it (`R1#echo <token>`),
//! and sometimes again on a line of its own when the device prints it back.
//! A segment therefore starts on the line after the first line carrying its
//! begin token and stops at the start of the first line carrying its end
//! token. Anything between those bounds that is still marker text is left
//! for the noise filter to drop.

use memchr::memmem;

use crate::command::SessionMarker;

/// How a segment's bounds were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStatus {
    /// Both markers were present.
    Complete,
    /// The begin marker was present but the end marker was not.
    Truncated,
    /// The begin marker never appeared.
    Missing,
}

/// Output attributed to one command, before noise filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Batch position.
    pub index: usize,

    /// Text between the marker lines.
    pub text: String,

    /// How the bounds were found.
    pub status: SegmentStatus,
}

impl Segment {
    fn missing(index: usize) -> Self {
        Self {
            index,
            text: String::new(),
            status: SegmentStatus::Missing,
        }
    }
}

/// Split `text` into one segment per marker, in marker order.
pub(crate) fn split(text: &str, markers: &[SessionMarker]) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(markers.len());
    let mut cursor = 0;

    for (position, marker) in markers.iter().enumerate() {
        let Some(begin_at) = find_from(text, &marker.begin, cursor) else {
            segments.push(Segment::missing(marker.index));
            continue;
        };

        let content_start = next_line_start(text, begin_at);

        match find_from(text, &marker.end, content_start) {
            Some(end_at) => {
                let content_end = line_start(text, end_at).max(content_start);
                segments.push(Segment {
                    index: marker.index,
                    text: text[content_start..content_end].to_string(),
                    status: SegmentStatus::Complete,
                });
                cursor = next_line_start(text, end_at);
            }
            None => {
                let bound = markers[position + 1..]
                    .iter()
                    .filter_map(|later| find_from(text, &later.begin, content_start))
                    .min()
                    .map(|at| line_start(text, at).max(content_start))
                    .unwrap_or(text.len());
                segments.push(Segment {
                    index: marker.index,
                    text: text[content_start..bound].to_string(),
                    status: SegmentStatus::Truncated,
                });
                cursor = bound;
            }
        }
    }

    segments
}

/// Byte offset of `needle` at or after `from`.
fn find_from(text: &str, needle: &str, from: usize) -> Option<usize> {
    let from = from.min(text.len());
    memmem::find(&text.as_bytes()[from..], needle.as_bytes()).map(|at| from + at)
}

/// Start of the line containing `at`.
fn line_start(text: &str, at: usize) -> usize {
    memchr::memrchr(b'\n', &text.as_bytes()[..at]).map_or(0, |nl| nl + 1)
}

/// Start of the line after the one containing `at`.
fn next_line_start(text: &str, at: usize) -> usize {
    memchr::memchr(b'\n', &text.as_bytes()[at..]).map_or(text.len(), |nl| at + nl + 1)
}
