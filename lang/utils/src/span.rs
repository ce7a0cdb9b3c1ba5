use std::{
    fmt::{Debug, Display},
    path::PathBuf,
    rc::Rc,
};

/// Line table of one source text, used to turn byte offsets into cursors.
#[derive(Clone, Debug)]
pub struct FileInfo {
    newlines: Vec<usize>,
    path: Option<Rc<PathBuf>>,
}

impl FileInfo {
    pub fn new(s: &str, path: Option<Rc<PathBuf>>) -> Self {
        let newlines = s.char_indices().filter(|(_, c)| *c == '\n').map(|(i, _)| i).collect();
        FileInfo { newlines, path }
    }
    /// 1-based line and column of a byte offset.
    pub fn trans_span2(&self, offset: usize) -> Cursor2 {
        // number of newlines strictly before `offset`
        let line = self.newlines.partition_point(|&nl| nl < offset);
        let line_start = if line == 0 { 0 } else { self.newlines[line - 1] + 1 };
        Cursor2 { line: line + 1, column: offset - line_start + 1 }
    }
    pub fn path(&self) -> PathBuf {
        self.path.as_ref().map(|p| p.to_path_buf()).unwrap_or_default()
    }
    pub fn locate(&self, span: &Span) -> String {
        let start = self.trans_span2(span.start);
        match &self.path {
            | Some(path) => format!("{}:{}", path.display(), start),
            | None => format!("{}", start),
        }
    }
}

pub type Cursor1 = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor2 {
    pub line: usize,
    pub column: usize,
}

impl Display for Cursor2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Cursor2 { line, column } = self;
        write!(f, "{line}:{column}",)
    }
}

/// Byte range in a source text.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Cursor1,
    pub end: Cursor1,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Span {
        Span { start, end }
    }
    pub fn dummy() -> Span {
        Span::new(0, 0)
    }
    pub fn is_dummy(&self) -> bool {
        self.start == 0 && self.end == 0
    }
    pub fn join(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
    pub fn make<T>(&self, inner: T) -> Sp<T> {
        Sp { inner, info: *self }
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Span { start, end } = self;
        write!(f, "{start}-{end}")
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// A value tagged with the span it was read from.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct Sp<T> {
    pub inner: T,
    pub info: Span,
}

impl<T> Sp<T> {
    #[inline]
    pub fn inner_ref(&self) -> &T {
        &self.inner
    }
    #[inline]
    pub fn inner(self) -> T {
        self.inner
    }
    pub fn map<F, U>(self, f: F) -> Sp<U>
    where
        F: FnOnce(T) -> U,
    {
        self.info.make(f(self.inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_become_one_based_cursors() {
        let src = "(a\n  b)\nc";
        let info = FileInfo::new(src, None);
        assert_eq!(info.trans_span2(0), Cursor2 { line: 1, column: 1 });
        assert_eq!(info.trans_span2(5), Cursor2 { line: 2, column: 3 });
        assert_eq!(info.trans_span2(8), Cursor2 { line: 3, column: 1 });
    }
}
