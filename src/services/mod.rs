pub mod meeting_service;
pub mod participant_service;
