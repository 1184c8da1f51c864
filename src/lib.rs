pub mod adapter;
pub mod config;
pub mod logging;
pub mod presenter;
pub mod view;
pub mod youtube;


pub use adapter::{PlaylistAdapter, Row};
pub use config::Config;
pub use presenter::{LoadEvent, LoadState, Presenter, ReloadPolicy, SelectionError};
pub use view::{PlaylistView, TerminalView};
