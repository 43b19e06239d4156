//! Scan tuning knobs.

use serde::{Deserialize, Serialize};

/// Where `Skipping` hands control back to structured scanning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipLookahead {
    /// Resync at statement separators as well as line ends.
    #[default]
    Statement,
    /// Resync at line ends only.
    Line,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Open contexts kept on the stack; deeper opens are no-ops.
    pub max_depth: usize,
    /// Blank lines tolerated between a comment block and its anchor.
    pub max_blank_lines: usize,
    pub skip_lookahead: SkipLookahead,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            max_depth: 256,
            max_blank_lines: 1,
            skip_lookahead: SkipLookahead::Statement,
        }
    }
}

impl ScanOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_blank_lines(mut self, max_blank_lines: usize) -> Self {
        self.max_blank_lines = max_blank_lines;
        self
    }

    pub fn with_skip_lookahead(mut self, skip_lookahead: SkipLookahead) -> Self {
        self.skip_lookahead = skip_lookahead;
        self
    }
}
