pub mod catalog;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod payment_log;
pub mod response;
pub mod routes;
pub mod services;
pub mod staging;
pub mod state;
