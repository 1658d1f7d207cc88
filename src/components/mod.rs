// src/components/mod.rs
//! Presentational pieces of the desk. Rendering is a pure function of the
//! data passed in; the only state lives in the search bar and the status
//! controls.

pub mod brief;
pub mod paper_card;
pub mod search_bar;
pub mod status_panel;

pub use brief::{format_brief_body, render_brief};
pub use paper_card::{render_paper_card, CardOptions};
pub use search_bar::{SearchAction, SearchBar};
pub use status_panel::{ControlAction, StatusControls};
