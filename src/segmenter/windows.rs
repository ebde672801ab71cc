use serde::{Deserialize, Serialize};

use crate::transcript::TranscriptSegment;

/// A fixed-length time slice over the segment sequence. Windows may overlap
/// when the stride is smaller than the window length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Window {
    /// Window start time in seconds
    pub start: f64,
    /// Window end time in seconds
    pub end: f64,
    /// Concatenated text of the overlapping segments
    pub text: String,
    /// Half-open `[lo, hi)` range of overlapping segment indices, `(0, 0)` when none
    pub index_range: (usize, usize),
}

/// Build successive `[cur, cur + win_len)` windows from the first segment's
/// start to the last segment's end, advancing by `stride` seconds. A segment
/// belongs to a window when their time intervals overlap.
pub fn build_windows(segments: &[TranscriptSegment], win_len: u32, stride: u32) -> Vec<Window> {
    if segments.is_empty() {
        return Vec::new();
    }

    let t0 = segments[0].start;
    let t_end = segments.last().map(|s| s.end()).unwrap_or(t0);

    // A zero stride would never advance; treat it as one second
    let stride = stride.max(1);

    let mut windows = Vec::new();
    let mut cur = t0;
    while cur < t_end {
        let w_start = cur;
        let w_end = (cur + f64::from(win_len)).min(t_end);

        let mut start_idx: Option<usize> = None;
        let mut end_idx = 0usize;
        let mut buf: Vec<&str> = Vec::new();
        for (i, seg) in segments.iter().enumerate() {
            if seg.end() <= w_start {
                continue;
            }
            if seg.start >= w_end {
                break;
            }
            if start_idx.is_none() {
                start_idx = Some(i);
            }
            end_idx = i + 1;
            buf.push(&seg.text);
        }

        windows.push(Window {
            start: w_start,
            end: w_end,
            text: buf.join(" ").trim().to_string(),
            index_range: match start_idx {
                Some(lo) => (lo, end_idx),
                None => (0, 0),
            },
        });

        cur += f64::from(stride);
    }

    windows
}

/// Merge batches of `size` consecutive windows into one window spanning the
/// batch's time range and index range.
pub fn super_chunks(windows: &[Window], size: usize) -> Vec<Window> {
    if size == 0 {
        return Vec::new();
    }

    windows
        .chunks(size)
        .filter(|batch| !batch.is_empty())
        .map(|batch| {
            let first = &batch[0];
            let last = &batch[batch.len() - 1];
            let text = batch
                .iter()
                .filter(|w| !w.text.is_empty())
                .map(|w| w.text.as_str())
                .collect::<Vec<_>>()
                .join(" ")
                .trim()
                .to_string();
            Window {
                start: first.start,
                end: last.end,
                text,
                index_range: (first.index_range.0, last.index_range.1),
            }
        })
        .collect()
}
