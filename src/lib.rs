// Core game logic modules
pub mod core;

// Authentication
pub mod auth;

// Environment configuration
pub mod config;

// Error types
pub mod error;

// Middleware
pub mod middleware;

// Services (business logic)
pub mod services;

// API and socket message models
pub mod models;

// HTTP routes
pub mod routes;

// Application state
pub mod state;
