pub mod constituent_service;
pub mod ticker_service;
