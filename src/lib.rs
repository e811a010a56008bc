pub mod config;
pub mod errors;
pub mod logging;
pub mod utils;
pub mod ui;

// MVC layout
pub mod model;
pub mod view;
pub mod controller;
