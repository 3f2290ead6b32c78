pub mod ollama_description_service;
pub mod retrying_description_service;
