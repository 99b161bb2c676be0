mod invariants;
mod outline;

pub use invariants::invariants;
pub use outline::outline;
