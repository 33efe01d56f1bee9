pub(crate) mod blink;
pub(crate) mod breathing;
pub(crate) mod rng;
