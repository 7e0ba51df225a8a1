use std::error::Error;

use ragchat_core::Clipboard;

/// The system clipboard.
///
/// A connection is opened for every write, so a clipboard that becomes
/// available later (e.g. a display server starting) is picked up.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        let mut clipboard = arboard::Clipboard::new()?;
        clipboard.set_text(text)?;
        trace!("wrote {} bytes to the clipboard", text.len());
        Ok(())
    }
}
