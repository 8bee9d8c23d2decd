//! floatplay-core: pure domain logic for the PiP subsystem.
//! Candidate model, canonical identity, scoring, and the time-boxed
//! admission gates. No IO, no async — all clocks are injected.

pub mod admission;
pub mod identity;
pub mod limits;
pub mod scoring;
pub mod types;

pub use admission::{AdmissionGates, AdmissionRejection};
pub use identity::{CanonicalKey, normalize};
pub use types::{Candidate, MediaKind, Rect, SurfaceId};
