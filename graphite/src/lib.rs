pub mod catalog;
pub mod domain;
pub mod planes;
pub mod ports;

#[cfg(test)]
pub(crate) mod test_support;
