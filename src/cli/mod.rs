pub mod dissociate;
pub mod stats;
