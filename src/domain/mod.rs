// Domain layer - Joint model, motion commands and error taxonomy
pub mod error;
pub mod joint;
pub mod motion;
