//! Shell-level concerns around the chat: theme and navigation.

mod nav;
mod theme;

pub use nav::{NavLink, nav_links};
pub use theme::{ParseThemeError, Theme, ThemeStore};
