pub mod config;
pub mod document;
pub mod element;
pub mod options;
pub mod selection;
pub mod style;
pub mod tagref;
pub mod units;
