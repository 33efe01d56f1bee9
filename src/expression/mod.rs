pub(crate) mod category;
pub(crate) mod source;
