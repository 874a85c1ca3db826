pub mod canvas;
pub mod document;
pub mod error;
pub mod id;
pub mod model;
pub mod template;
pub mod variables;
pub mod viewport;

pub use canvas::{CanvasSettings, GridSettings, Guide, GuideAxis, GuideSettings};
pub use document::Document;
pub use error::{DocError, DocResult};
pub use id::{BlockId, LayerId};
pub use model::*;
pub use template::{
    BrandingRules, Margins, Orientation, PageSize, Template, TemplateMetadata, VariableDefinition,
};
pub use viewport::Viewport;

// Re-export kurbo geometry so downstream crates share one version.
pub use kurbo::{Affine, Point, Rect, Size, Vec2};
