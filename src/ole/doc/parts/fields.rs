//! Field tracking for text extraction.
//!
//! A field in the character stream looks like
//! `0x13 instructions [0x14 result] 0x15`. Fields nest: the instruction or
//! result of one field can contain another. Only result text belongs in the
//! extracted output; instruction text (`HYPERLINK "..."`, `PAGE`, ...) is
//! dropped.
use smallvec::SmallVec;

/// Field boundary markers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldBoundary {
    /// Field begin marker (0x13)
    Begin = 0x13,
    /// Field separator marker (0x14)
    Separator = 0x14,
    /// Field end marker (0x15)
    End = 0x15,
}

impl FieldBoundary {
    /// Classify a character value as a field marker.
    #[inline]
    pub fn from_char_code(code: u32) -> Option<Self> {
        match code {
            0x13 => Some(FieldBoundary::Begin),
            0x14 => Some(FieldBoundary::Separator),
            0x15 => Some(FieldBoundary::End),
            _ => None,
        }
    }
}

/// Nesting state of the fields open at the current position.
///
/// Each open field records whether it is still in its instruction part.
/// Text is suppressed while any open field is, so an instruction nested in
/// a result is hidden and so is everything nested in an instruction.
///
/// # Examples
///
/// ```
/// use doc_text::doc::parts::fields::{FieldBoundary, FieldState};
///
/// let mut state = FieldState::new();
/// state.apply(FieldBoundary::Begin);
/// assert!(state.is_suppressing());
/// state.apply(FieldBoundary::Separator);
/// assert!(!state.is_suppressing());
/// state.apply(FieldBoundary::End);
/// assert_eq!(state.depth(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldState {
    /// One entry per open field, `true` while in the instruction part
    levels: SmallVec<[bool; 4]>,
    /// Number of open fields still in their instruction part
    in_instruction: usize,
}

impl FieldState {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a field in instruction mode.
    pub fn begin(&mut self) {
        self.levels.push(true);
        self.in_instruction += 1;
    }

    /// Move the innermost field to its result part.
    ///
    /// Ignored outside a field or when the field is already in its result.
    pub fn separate(&mut self) {
        if let Some(level) = self.levels.last_mut()
            && *level
        {
            *level = false;
            self.in_instruction -= 1;
        }
    }

    /// Close the innermost field. Ignored outside a field.
    pub fn end(&mut self) {
        if let Some(instruction) = self.levels.pop()
            && instruction
        {
            self.in_instruction -= 1;
        }
    }

    /// Apply a field marker.
    #[inline]
    pub fn apply(&mut self, boundary: FieldBoundary) {
        match boundary {
            FieldBoundary::Begin => self.begin(),
            FieldBoundary::Separator => self.separate(),
            FieldBoundary::End => self.end(),
        }
    }

    /// Whether text at the current position is instruction text.
    #[inline]
    pub fn is_suppressing(&self) -> bool {
        self.in_instruction > 0
    }

    /// Number of open fields.
    #[inline]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Forget every open field.
    #[inline]
    pub fn reset(&mut self) {
        self.levels.clear();
        self.in_instruction = 0;
    }
}
