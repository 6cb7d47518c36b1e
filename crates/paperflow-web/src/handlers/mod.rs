pub mod cards;
pub mod export;
pub mod index;
pub mod stream;
