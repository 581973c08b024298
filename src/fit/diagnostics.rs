//! Messages collected over the course of a fit.

/// A log of the progress of a fit, split into informational messages and
/// errors. Each message is also emitted at debug level as it is recorded.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FitDiagnostics {
    info: Vec<String>,
    errors: Vec<String>,
}

impl FitDiagnostics {
    pub(crate) fn info(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        log::debug!("{}", msg);
        self.info.push(msg);
    }

    pub(crate) fn error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        log::debug!("error: {}", msg);
        self.errors.push(msg);
    }

    /// Informational messages, in the order they were recorded.
    pub fn info_messages(&self) -> &[String] {
        &self.info
    }

    /// Problems encountered while fitting. Not all of them are fatal; a fit
    /// that does not converge is still usable.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
