pub mod intrinsic;
pub mod template;

pub use template::{DeletionPolicy, Output, Parameter, Resource, Template, TemplateError};
