pub mod kale;
pub mod pix;
pub mod quote;
