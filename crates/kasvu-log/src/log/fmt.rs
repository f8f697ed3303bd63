use kasvu_mem::{CapacityError, GlobalArray};

use super::*;

/// Color and weight of one segment of a log line.
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Style {
    pub fg: Option<Color>,
    pub bold: bool,
    pub intense: bool,
}

impl Style {

    #[inline(always)]
    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    #[inline(always)]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[inline(always)]
    pub fn intense(mut self) -> Self {
        self.intense = true;
        self
    }

    pub(crate) fn color_spec(&self) -> Option<ColorSpec> {
        if *self == Self::default() {
            return None
        }
        let mut spec = ColorSpec::new();
        spec.set_fg(self.fg)
            .set_bold(self.bold)
            .set_intense(self.intense);
        Some(spec)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SegmentSpec {
    Message(Style),
    Target(Style),
    Text(&'static str, Style),
}

/// Layout of a log line: a sequence of segments written left to right.
#[derive(Default)]
pub struct LogFmt {
    segments: GlobalArray<SegmentSpec>,
}

impl LogFmt {

    /// `[label] target: message`, with `label` in `color`.
    pub fn labeled(label: &'static str, color: Color) -> Self {
        let mut fmt = Self::default();
        let plain = Style::default();
        fmt.segments.push(SegmentSpec::Text("[", plain));
        fmt.segments.push(SegmentSpec::Text(label, plain.fg(color).bold()));
        fmt.segments.push(SegmentSpec::Text("] ", plain));
        fmt.segments.push(SegmentSpec::Target(plain.fg(Color::White).intense()));
        fmt.segments.push(SegmentSpec::Text(": ", plain));
        fmt.segments.push(SegmentSpec::Message(plain));
        fmt
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl<'a> IntoIterator for &'a LogFmt {

    type Item = &'a SegmentSpec;
    type IntoIter = kasvu_mem::Iter<'a, SegmentSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

/// Builds a fresh [`LogFmt`] segment by segment.
#[derive(Default)]
pub struct LogFmtBuilder {
    fmt: LogFmt,
    err: Option<CapacityError>,
}

impl LogFmtBuilder {

    #[inline(always)]
    pub fn new() -> Self {
        Self::default()
    }

    fn segment(&mut self, segment: SegmentSpec) -> &mut Self {
        if let Err(err) = self.fmt.segments.try_push(segment) {
            self.err.get_or_insert(err);
        }
        self
    }

    #[inline(always)]
    pub fn message(&mut self, f: impl FnOnce(Style) -> Style) -> &mut Self {
        self.segment(SegmentSpec::Message(f(Style::default())))
    }

    #[inline(always)]
    pub fn target(&mut self, f: impl FnOnce(Style) -> Style) -> &mut Self {
        self.segment(SegmentSpec::Target(f(Style::default())))
    }

    #[inline(always)]
    pub fn text(&mut self, text: &'static str, f: impl FnOnce(Style) -> Style) -> &mut Self {
        self.segment(SegmentSpec::Text(text, f(Style::default())))
    }

    /// The built format, or the first segment that could not be stored.
    pub fn finish(self) -> Result<LogFmt> {
        match self.err {
            Some(err) => Err(err.into()),
            None => Ok(self.fmt),
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn labeled_has_six_segments() {
        let fmt = LogFmt::labeled("INFO", Color::Green);
        assert_eq!(fmt.len(), 6);
        let first = fmt.into_iter().next().copied();
        assert_eq!(first, Some(SegmentSpec::Text("[", Style::default())));
    }

    #[test]
    fn builder_collects_segments() {
        let mut builder = LogFmtBuilder::new();
        builder
            .text(">> ", |s| s.bold())
            .message(|s| s);
        let fmt = builder.finish().unwrap();
        let segments: Vec<_> = fmt.into_iter().copied().collect();
        assert_eq!(segments, vec![
            SegmentSpec::Text(">> ", Style::default().bold()),
            SegmentSpec::Message(Style::default()),
        ]);
    }

    #[test]
    fn failed_segment_fails_the_build() {
        let mut builder = LogFmtBuilder::new();
        builder.text("a", |s| s);
        builder.err = Some(CapacityError::AllocFailed { new_capacity: 8 });
        builder.message(|s| s);
        assert!(matches!(
            builder.finish(),
            Err(LogError::Capacity(CapacityError::AllocFailed { new_capacity: 8 })),
        ));
    }

    #[test]
    fn plain_style_has_no_color_spec() {
        assert!(Style::default().color_spec().is_none());
        let spec = Style::default().fg(Color::Red).bold().color_spec().unwrap();
        assert_eq!(spec.fg(), Some(&Color::Red));
        assert!(spec.bold());
    }
}
