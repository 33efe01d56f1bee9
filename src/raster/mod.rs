pub(crate) mod buffer;
pub(crate) mod readable;
pub(crate) mod target;
