pub mod animation;
pub mod manager;
pub mod surface;
pub mod window;

pub use manager::OverlayManager;
pub use surface::{OverlaySurface, SurfaceBackend, SurfaceBackendFactory};
pub use window::DefaultSurfaceBackendFactory;
