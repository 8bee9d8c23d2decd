//! floatplay-manager: the window lifecycle authority.
//! Owns the set of active detached windows, runs the admission pipeline
//! (suspension, dedup, cap, cooldown), pauses/resumes original playback,
//! and resynchronizes timelines on close.

pub mod manager;
pub mod record;
pub mod request;
pub mod window;

pub use manager::{PipEvent, PipManager, RequestOutcome};
pub use record::{PipWindowId, PipWindowRecord};
pub use request::parse_detach_request;
pub use window::{CreatedWindow, HostWindowId, WindowError, WindowHost, WindowSpec};

pub use floatplay_core::types;
