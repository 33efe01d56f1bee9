pub(crate) mod smart;
