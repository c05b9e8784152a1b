/// One progress notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub stage: String,
    pub percent: u8,
}

/// Forwards progress to an optional callback, never letting the percentage
/// move backwards within one generation.
pub struct ProgressReporter<'a> {
    sink: Option<&'a mut (dyn FnMut(Progress) + Send)>,
    last: u8,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: Option<&'a mut (dyn FnMut(Progress) + Send)>) -> Self {
        Self { sink, last: 0 }
    }

    pub fn silent() -> Self {
        Self::new(None)
    }

    pub fn report(&mut self, stage: impl Into<String>, percent: u8) {
        let percent = percent.min(100).max(self.last);
        self.last = percent;
        if let Some(sink) = self.sink.as_mut() {
            sink(Progress {
                stage: stage.into(),
                percent,
            });
        }
    }

    /// Reports `done / total` of a stage mapped onto `[from, to]`.
    pub fn report_fraction(&mut self, stage: &str, done: usize, total: usize, from: u8, to: u8) {
        let span = to.saturating_sub(from) as usize;
        let offset = if total == 0 { span } else { span * done.min(total) / total };
        self.report(format!("{stage} ({done}/{total})"), from.saturating_add(offset as u8));
    }

    pub fn last_percent(&self) -> u8 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_never_decreases() {
        let mut seen = Vec::new();
        let mut sink = |p: Progress| seen.push(p.percent);
        {
            let mut reporter = ProgressReporter::new(Some(&mut sink));
            reporter.report("a", 10);
            reporter.report("b", 5);
            reporter.report("c", 250);
        }
        assert_eq!(seen, vec![10, 10, 100]);
    }

    #[test]
    fn fractions_map_into_range() {
        let mut seen = Vec::new();
        let mut sink = |p: Progress| seen.push((p.stage, p.percent));
        {
            let mut reporter = ProgressReporter::new(Some(&mut sink));
            reporter.report_fraction("Preparing images", 1, 4, 0, 40);
            reporter.report_fraction("Preparing images", 4, 4, 0, 40);
        }
        assert_eq!(
            seen,
            vec![
                ("Preparing images (1/4)".to_string(), 10),
                ("Preparing images (4/4)".to_string(), 40)
            ]
        );
    }
}
