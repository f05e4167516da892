pub mod document;
pub mod product;
