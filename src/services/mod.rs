/// Historical aggregation into club pace reports.
pub mod analytics_service;
/// Port to the background location capture service on player devices.
pub mod capture;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Server-Sent Events message generation.
pub mod notifications;
/// Pace configuration loading and persistence.
pub mod pace_config_service;
/// Round lifecycle operations for flights.
pub mod round_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage reconnection loop and degraded mode handling.
pub mod storage_supervisor;
/// GPS position ingestion with throttling.
pub mod telemetry_service;
/// Hole timing reduction and pace alerts.
pub mod timing_service;
