//! Jeux : table des ROMs arcade connues et catalogue des contenus

pub mod database;
pub mod scanner;

pub use database::*;
pub use scanner::*;
