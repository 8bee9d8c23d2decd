//! floatplay-surface: the probe bridge to content surfaces.
//! Provides the probe trait and request model, media payload parsing,
//! the content scanner, and surface generation tracking. No business
//! logic beyond scan-side scoring glue — pure IO boundary.

pub mod error;
pub mod media;
pub mod probe;
pub mod scanner;
pub mod tracker;

pub use error::ProbeError;
pub use media::{MediaElementInfo, PageMeta, parse_scan_payload, to_candidate};
pub use probe::{Probe, ProbeClient};
pub use scanner::{ScanGuard, Scanner, find_at, scan_active, scan_all};
pub use tracker::SurfaceTracker;

pub use floatplay_core::types;
