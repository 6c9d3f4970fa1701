//! End-to-end import runs against a mock download server

mod ccew;
mod chd;
mod companies;
