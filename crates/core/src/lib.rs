pub mod config;

pub mod capture {
    pub mod domain {
        pub mod artifact_store;
        pub mod capture_recorder;
    }
    pub mod infrastructure;
}

pub mod enrichment {
    pub mod domain {
        pub mod composite;
        pub mod consolidator;
        pub mod description_service;
        pub mod prompts;
        pub mod response_repair;
        pub mod sample_batcher;
    }
    pub mod infrastructure;
}

pub mod identity {
    pub mod domain {
        pub mod bounded_identity_store;
        pub mod description;
        pub mod identity_record;
        pub mod record_store;
    }
    pub mod infrastructure;
}

pub mod ingest {
    pub mod domain {
        pub mod frame_cache;
        pub mod tracking_event;
    }
    pub mod infrastructure;
}

pub mod recognition {
    pub mod domain {
        pub mod embedding;
        pub mod face_analyzer;
        pub mod face_gallery;
        pub mod gallery_matcher;
        pub mod orientation;
        pub mod orientation_classifier;
        pub mod pose_estimator;
        pub mod track_registry;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod capture_event_use_case;
    pub mod enrich_identity_use_case;
    pub mod infrastructure;
    pub mod ingest_executor;
}

pub mod shared {
    pub mod constants;
    pub mod face_box;
    pub mod frame;
    pub mod model_resolver;
}
