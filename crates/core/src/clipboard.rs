use std::error::Error;

/// Somewhere to put copied message text.
///
/// Failures are reported back but the controller only logs them; a
/// message is still marked as copied.
pub trait Clipboard: Send + Sync + 'static {
    /// Replaces the clipboard content with `text`.
    fn write_text(&self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
}
