/// Admin service for game control operations.
pub mod admin_service;
/// One-second countdown feeding the admin controller.
pub mod countdown;
/// OpenAPI documentation generation.
pub mod documentation;
/// Admin controller task driving the game state machine.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Player view projection.
pub mod player_service;
/// Player joins and answer scoring.
pub mod scoring_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
