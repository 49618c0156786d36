pub mod composite;
pub mod present;
pub mod trace;

pub use composite::CompositePass;
pub use present::PresentPass;
pub use trace::{TraceBindings, TracePass};
