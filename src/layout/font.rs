//! Font metrics for headless measurement

/// Metrics needed for text layout
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    /// Line height in logical pixels
    pub line_height: f32,
    /// Width of ASCII characters (0-127)
    pub char_widths: Vec<f32>,
    /// Default width for non-ASCII characters
    pub default_width: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        // 12pt serif body text at 96 DPI: 16px * 1.4 line height,
        // ~7.2px average advance
        let default_width = 7.2;
        let mut char_widths = vec![default_width; 128];
        for c in ['i', 'l', 'j', 't', 'f', 'r', '.', ',', ';', ':', '\'', '!', '|', ' '] {
            char_widths[c as usize] = 4.4;
        }
        for c in ['m', 'w', 'M', 'W'] {
            char_widths[c as usize] = 11.5;
        }

        Self {
            line_height: 22.4,
            char_widths,
            default_width,
        }
    }
}

impl FontMetrics {
    pub fn new(line_height: f32, char_widths: Vec<f32>, default_width: f32) -> Self {
        Self {
            line_height,
            char_widths,
            default_width,
        }
    }

    /// Monospace metrics, handy for predictable tests
    pub fn monospace(line_height: f32, width: f32) -> Self {
        Self::new(line_height, vec![width; 128], width)
    }

    /// Get width of a character
    pub fn width(&self, c: char) -> f32 {
        if c.is_control() {
            return 0.0;
        }
        if c.is_ascii() {
            if let Some(w) = self.char_widths.get(c as usize) {
                return *w;
            }
        }
        self.default_width
    }

    /// Width of a grapheme cluster; tabs advance four default widths
    pub fn grapheme_width(&self, grapheme: &str) -> f32 {
        if grapheme == "\t" {
            return self.default_width * 4.0;
        }
        // Combining marks ride on their base character
        grapheme.chars().next().map(|c| self.width(c)).unwrap_or(0.0)
    }
}
