pub mod decision;
pub mod lead;
pub mod product;
