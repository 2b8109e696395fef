mod manager;
mod phase;
#[cfg(test)]
pub(crate) mod testing;

pub use manager::{ContextManager, DocumentChanged};
pub use phase::{OperationTrace, Phase};
