// Text preparation and label normalisation for the sentiment classifier
pub mod cleaner;
pub mod labels;

pub use cleaner::{BasicCleaner, TextCleaner};
pub use labels::LabelMap;
