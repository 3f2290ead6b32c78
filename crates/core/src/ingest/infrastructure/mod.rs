pub mod directory_frame_cache;
pub mod frame_decoder;
pub mod in_memory_frame_cache;
pub mod json_lines_event_source;
