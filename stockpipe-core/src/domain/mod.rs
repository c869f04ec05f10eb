//! Domain types for stockpipe

pub mod bar;

pub use bar::PriceBar;
