//! Runtime orchestration.

pub mod component_registry;
pub mod compositor;
pub mod events;
mod wake;

pub use component_registry::{ComponentHandle, ComponentId, ComponentRegistry, Interactive};
pub use compositor::{Compositor, CompositorOptions, TerminalModes, VirtualCursor};
pub use events::{ResizeEvent, SubscriptionId};
