// span.rs
//
// Source location span for diagnostics.

/// Source location span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Span {
    pub start: usize, // Byte offset
    pub end: usize,   // Byte offset (exclusive)
    pub line: u32,    // 1-indexed
    pub column: u32,  // 1-indexed
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }

    /// Span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        if other.start < self.start {
            return other.merge(self);
        }
        Span {
            start: self.start,
            end: self.end.max(other.end),
            line: self.line,
            column: self.column,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Span> for miette::SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.len()).into()
    }
}

impl From<&Span> for miette::SourceSpan {
    fn from(span: &Span) -> Self {
        (span.start, span.len()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_order_independent() {
        let a = Span::new(4, 9, 1, 5);
        let b = Span::new(12, 20, 2, 3);
        assert_eq!(a.merge(b), b.merge(a));
        assert_eq!(a.merge(b).start, 4);
        assert_eq!(a.merge(b).end, 20);
    }

    #[test]
    fn converts_to_offset_and_length() {
        let source: miette::SourceSpan = Span::new(10, 15, 1, 11).into();
        assert_eq!(source.offset(), 10);
        assert_eq!(source.len(), 5);
    }
}
