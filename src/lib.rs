pub mod models;
pub mod pix;
pub mod repositories;
pub mod services;
pub mod settings;
