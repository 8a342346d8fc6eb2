/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Public service for read-only game information.
pub mod public_service;
/// Game session event loop and message delivery.
pub mod session_service;
/// Cancellable countdown of the drawing turn.
pub mod turn_timer;
/// WebSocket connection and message handling service.
pub mod websocket_service;
