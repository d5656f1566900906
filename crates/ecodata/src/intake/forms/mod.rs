//! Schema-bound forms; only drafts may be deleted.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    CreateFormRequest, CreatorSummary, Form, FormDetail, FormFilter, FormListItem, FormPage,
    FormQuery, FormStatus, UpdateFormRequest,
};
pub use repository::FormRepository;
pub use router::form_router;
pub use service::FormService;
