//! Safe SQL builder: identifiers from the catalog only, values as parameters.

pub mod builder;
