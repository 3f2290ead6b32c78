pub mod fs_artifact_store;
pub mod jpeg;
