pub mod names;
pub mod whitespace;
