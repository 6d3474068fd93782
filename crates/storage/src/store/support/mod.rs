#![forbid(unsafe_code)]

mod codec;
mod counters;
mod ddl;
mod time;

pub(super) use codec::*;
pub(super) use counters::*;
pub(super) use ddl::install_schema;
pub(super) use time::now_ms;
