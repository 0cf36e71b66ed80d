pub(crate) mod constituents;
pub(crate) mod health;
pub(crate) mod stocks;
