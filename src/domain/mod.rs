pub mod application_store;
pub mod dag;
pub mod engine;
pub mod event;
pub mod handler;
pub mod job_helper;
pub mod model;
pub mod processor;
pub mod scatter;
pub mod utils;
