pub mod enrichment_worker_pool;
pub mod threaded_ingest_executor;
