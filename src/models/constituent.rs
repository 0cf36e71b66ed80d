use serde::Serialize;

// One row of the index constituent table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConstituentRecord {
    pub symbol: String,
    pub name: String,
    pub sector: String,
}
