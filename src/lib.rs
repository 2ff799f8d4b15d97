pub mod api;
pub mod config;
pub mod db;
pub mod model;
pub mod repository;
pub mod shell;
pub mod ui;
