//! Feature extraction
//!
//! Converts a team's completed games before a cutoff into model-ready values.

pub mod defense;
pub mod extractor;
pub mod offense;
pub mod situational;
pub mod trend;
pub mod window;

pub use defense::DefensiveFeatures;
pub use extractor::{
    feature_names, FeatureExtractor, FeatureVector, GameFeatures, TeamFeatures, FEATURE_DIM,
};
pub use offense::OffensiveFeatures;
pub use situational::SituationalFeatures;
pub use trend::{Outcome, TrendFeatures};
pub use window::GameWindow;
