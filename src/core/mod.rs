pub mod sections;
pub mod session;
pub mod view;

pub use sections::{ClearScope, Section, SectionStore, SharedSectionStore};
pub use session::{Session, SessionRecord};
pub use view::{ViewState, ZoomLimits};
