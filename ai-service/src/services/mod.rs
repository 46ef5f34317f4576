pub mod catalog;
pub mod chatbot;
pub mod detection;
pub mod image;
pub mod metrics;
pub mod providers;

pub use chatbot::ChatbotService;
pub use detection::SnakeDetectionService;
pub use image::ImageFetcher;
pub use metrics::{get_metrics, init_metrics};
