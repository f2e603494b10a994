pub mod pages;
pub mod product;
pub mod questions;
