pub mod draw;
pub mod hit;
pub mod renderer;

pub use draw::{DrawContent, DrawInstruction, build_draw_list, grid_lines};
pub use hit::{hit_test, hit_test_rect};
pub use renderer::{
    HeadlessSurface, RenderError, RenderState, RenderSurface, Renderer, SurfaceOp, SyncOutcome,
};
