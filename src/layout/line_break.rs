//! Line breaking for headless text measurement

use crate::layout::font::FontMetrics;
use std::ops::Range;
use unicode_linebreak::{linebreaks, BreakOpportunity};
use unicode_segmentation::UnicodeSegmentation;

/// Layout result for a single line
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    /// Byte range within the text this line covers
    pub byte_range: Range<usize>,
    /// Advance width of the line, trailing whitespace included
    pub width: f32,
}

/// Greedy line breaker over Unicode line-break opportunities
#[derive(Debug, Default, Clone, Copy)]
pub struct LineBreaker;

impl LineBreaker {
    pub fn new() -> Self {
        Self
    }

    /// Break `text` into lines no wider than `max_width`.
    ///
    /// Empty text still occupies one line. A word wider than the line is
    /// broken between grapheme clusters.
    pub fn break_lines(&self, text: &str, max_width: f32, metrics: &FontMetrics) -> Vec<LineLayout> {
        let mut lines = Vec::new();
        if text.is_empty() {
            lines.push(LineLayout {
                byte_range: 0..0,
                width: 0.0,
            });
            return lines;
        }

        // Never narrower than one glyph, or nothing could ever be placed
        let max_width = max_width.max(metrics.default_width);

        let mut line_start = 0;
        let mut line_width: f32 = 0.0;
        let mut segment_start = 0;

        for (end, opportunity) in linebreaks(text) {
            let segment = &text[segment_start..end];
            let visible = measure(segment.trim_end(), metrics);

            if line_width + visible > max_width && line_start < segment_start {
                lines.push(LineLayout {
                    byte_range: line_start..segment_start,
                    width: line_width,
                });
                line_start = segment_start;
                line_width = 0.0;
            }

            if visible > max_width {
                // Emergency break inside an overlong word
                for (offset, grapheme) in segment.grapheme_indices(true) {
                    let w = metrics.grapheme_width(grapheme);
                    let at = segment_start + offset;
                    if line_width + w > max_width && at > line_start {
                        lines.push(LineLayout {
                            byte_range: line_start..at,
                            width: line_width,
                        });
                        line_start = at;
                        line_width = 0.0;
                    }
                    line_width += w;
                }
            } else {
                line_width += measure(segment, metrics);
            }

            segment_start = end;

            if opportunity == BreakOpportunity::Mandatory && end < text.len() {
                lines.push(LineLayout {
                    byte_range: line_start..end,
                    width: line_width,
                });
                line_start = end;
                line_width = 0.0;
            }
        }

        lines.push(LineLayout {
            byte_range: line_start..text.len(),
            width: line_width,
        });
        lines
    }

    /// Number of lines `text` occupies
    pub fn line_count(&self, text: &str, max_width: f32, metrics: &FontMetrics) -> usize {
        self.break_lines(text, max_width, metrics).len()
    }
}

fn measure(text: &str, metrics: &FontMetrics) -> f32 {
    text.graphemes(true).map(|g| metrics.grapheme_width(g)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> FontMetrics {
        FontMetrics::monospace(10.0, 8.0)
    }

    #[test]
    fn test_empty_text() {
        let lines = LineBreaker::new().break_lines("", 100.0, &metrics());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].byte_range, 0..0);
    }

    #[test]
    fn test_single_line() {
        let lines = LineBreaker::new().break_lines("Hello", 100.0, &metrics());
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].byte_range, 0..5);
        assert_eq!(lines[0].width, 40.0);
    }

    #[test]
    fn test_line_wrap() {
        // With 8px per char, 40px width = 5 chars per line
        let lines = LineBreaker::new().break_lines("Hello World", 40.0, &metrics());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].byte_range, 0..6);
        assert_eq!(lines[1].byte_range, 6..11);
    }

    #[test]
    fn test_explicit_newline() {
        let lines = LineBreaker::new().break_lines("Hello\nWorld", 1000.0, &metrics());
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].byte_range, 6..11);
    }

    #[test]
    fn test_overlong_word_is_broken() {
        // 12 chars at 8px in a 40px line: 5 + 5 + 2
        let count = LineBreaker::new().line_count("abcdefghijkl", 40.0, &metrics());
        assert_eq!(count, 3);
    }
}
