pub(crate) mod browse;
pub(crate) mod check;
pub(crate) mod courses;
pub(crate) mod login;
pub(crate) mod upload;
