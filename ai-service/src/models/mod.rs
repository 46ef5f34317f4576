//! Request/response models for the SnaKTox AI service.

pub mod chat;
pub mod detection;

pub use chat::{ChatContext, ChatQuery, ChatReply, ContextAck, QueryType};
pub use detection::{
    DetectionRequest, DetectionResponse, DetectionResult, FailureKind, SeverityLevel,
    SnakeSpecies, VenomType, API_VERSION,
};
