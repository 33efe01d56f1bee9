pub(crate) mod blend;
pub(crate) mod cache;
pub(crate) mod layers;
pub(crate) mod region;
