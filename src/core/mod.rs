pub mod clock;
pub mod holder;
pub mod prefetch;
pub mod resolver;
pub mod scheduler;
pub mod trigger;
