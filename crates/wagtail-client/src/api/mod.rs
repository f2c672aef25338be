//! Per-family API accessors.

mod documents;
mod images;
mod pages;

pub use documents::DocumentsApi;
pub use images::ImagesApi;
pub use pages::PagesApi;
