//! Port traits: the collaborators the domain reads from and writes to.

pub mod config_port;
pub mod price_port;
pub mod quote_port;
pub mod report_port;
