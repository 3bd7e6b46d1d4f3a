pub mod window;

pub use window::FeatureWindow;
