//! Region reports built from pre-rendered HTML fragments.

mod fragment;
mod generator;
mod paginate;
mod request;

pub use fragment::{DirFragmentSource, FragmentBase, FragmentSource, HttpFragmentSource};
pub use generator::{
    ControlState, DocumentWriter, GeneratedReport, RasterImage, Rasterizer, RenderOptions,
    ReportGenerator,
};
pub use paginate::{paginate, PageLayout, PageSize, MAX_PAGES};
pub use request::{fragment_path, ReportRequest};
