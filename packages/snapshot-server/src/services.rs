pub mod snapshot_service;
