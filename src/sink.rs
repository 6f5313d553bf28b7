use log::error;

/// Destination for failures the user should see, such as a shader that did
/// not compile. Reporting never aborts anything by itself.
pub trait ErrorSink {
    fn report_error(&self, text: &str);
}

/// Routes reports to the `log` facade at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ErrorSink for LogSink {
    fn report_error(&self, text: &str) {
        error!("{text}");
    }
}

impl<F> ErrorSink for F
where
    F: Fn(&str),
{
    fn report_error(&self, text: &str) {
        self(text)
    }
}
