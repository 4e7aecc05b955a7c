pub mod embedder;
pub mod product;
pub mod product_index;
