pub mod accounts;
pub mod bundler;
pub mod catalog;
pub mod registry;
