//! Document layer - draft schemas, receipts and the interactive wizard

pub mod registry;
pub mod template;
pub mod validator;
pub mod wizard;

pub use registry::{SchemaKind, SchemaRegistry};
pub use template::{ReceiptGenerator, TemplateError};
pub use validator::{ValidationError, Validator};
pub use wizard::BookingWizard;
