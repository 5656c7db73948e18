pub mod controller;
pub mod download_coordinator;
pub mod renderer;

pub use controller::{Controller, Effect, Status, StatusKind, Surface};
pub use download_coordinator::{DownloadCoordinator, RequestOutcome};
pub use renderer::{LoadOutcome, PreviewItem, Visual, PLACEHOLDER_SVG};
