pub mod registration;
pub mod supplier;

pub use registration::apply_local_tag;
pub use supplier::{InstanceSupplier, StaticInstanceSupplier, SyncInstanceSupplier};
