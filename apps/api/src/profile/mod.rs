// Profile documents: model, merge engine, mutations and HTTP handlers.

pub mod handlers;
pub mod merge;
pub mod models;
pub mod service;
