//! Conversational hospital assistant: intent classification, slot-filling
//! appointment flows and the backend calls that fulfil them.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

pub use models::{ConversationContext, FlowStep, Intent, Response, User};
pub use services::api::ApiClient;
pub use services::conversation::ChatEngine;
