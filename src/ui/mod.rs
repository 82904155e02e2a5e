pub mod events;
pub mod popup;
pub mod present;
pub mod sidebar;

pub use events::{EventManager, MapEvent, UiEvent};
pub use popup::Popup;
pub use present::{feature_html, html_escape, html_to_text};
pub use sidebar::{Dispatch, SidebarBinding, SidebarController};
