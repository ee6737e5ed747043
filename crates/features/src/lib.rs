//! Feature engineering for the conversion model: calendar features derived
//! from the session timestamp, one-hot encoding of the creative and traffic
//! categoricals, and alignment of feature matrices to a persisted feature
//! list.

pub mod align;
pub mod calendar;
pub mod encoder;
pub mod matrix;

pub use align::align_to;
pub use calendar::CalendarFeatures;
pub use encoder::{OneHotEncoder, CATEGORICAL_COLUMNS, NUMERIC_COLUMNS};
pub use matrix::FeatureMatrix;
