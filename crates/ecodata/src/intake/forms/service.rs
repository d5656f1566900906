use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::domain::{
    CreateFormRequest, CreatorSummary, Form, FormDetail, FormFilter, FormListItem, FormPage,
    FormQuery, FormStatus, UpdateFormRequest,
};
use super::repository::FormRepository;
use crate::audit::{AuditAction, AuditEvent, AuditResource, AuditTrail, ClientInfo};
use crate::auth::{authorize, Permission, UserSession};
use crate::error::ServiceError;
use crate::intake::accounts::UserRepository;
use crate::intake::present;
use crate::intake::schemas::SchemaRepository;
use crate::pagination::PageRequest;

pub struct FormService {
    forms: Arc<dyn FormRepository>,
    schemas: Arc<dyn SchemaRepository>,
    users: Arc<dyn UserRepository>,
    audit: AuditTrail,
}

impl FormService {
    pub fn new(
        forms: Arc<dyn FormRepository>,
        schemas: Arc<dyn SchemaRepository>,
        users: Arc<dyn UserRepository>,
        audit: AuditTrail,
    ) -> Self {
        Self {
            forms,
            schemas,
            users,
            audit,
        }
    }

    pub fn list(&self, session: &UserSession, query: &FormQuery) -> Result<FormPage, ServiceError> {
        let filter = FormFilter {
            owner: Some(session.user_id),
            status: present(query.status.as_deref())
                .map(FormStatus::parse_required)
                .transpose()?,
        };
        let window = PageRequest::from_params(query.page.as_deref(), query.limit.as_deref(), 20, 50);

        let forms = self
            .forms
            .list_forms(&filter, window.offset(), window.limit)?
            .into_iter()
            .map(|form| {
                let schema = self
                    .schemas
                    .fetch_schema(form.schema_id)?
                    .map(|schema| schema.summary());
                Ok(FormListItem { form, schema })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;
        let total = self.forms.count_forms(&filter)?;

        Ok(FormPage {
            forms,
            pagination: window.describe(total),
        })
    }

    pub fn get(&self, id: Uuid) -> Result<FormDetail, ServiceError> {
        let form = self.fetch(id)?;
        let schema = self.schemas.fetch_schema(form.schema_id)?;
        let user = self
            .users
            .fetch_user(form.created_by)?
            .map(|user| CreatorSummary {
                full_name: user.full_name,
                email: user.email,
            });

        Ok(FormDetail { form, schema, user })
    }

    pub fn create(
        &self,
        session: &UserSession,
        client: &ClientInfo,
        request: CreateFormRequest,
    ) -> Result<Form, ServiceError> {
        let (Some(title), Some(schema_id)) = (
            present(request.title.as_deref()),
            present(request.schema_id.as_deref()),
        ) else {
            return Err(ServiceError::validation("title and schemaId are required"));
        };

        let schema_id = Uuid::parse_str(schema_id).map_err(|_| ServiceError::NotFound("schema"))?;
        if self.schemas.fetch_schema(schema_id)?.is_none() {
            return Err(ServiceError::NotFound("schema"));
        }

        let data = object_or_default(request.data)?;
        let form = self
            .forms
            .insert_form(Form::new(title, schema_id, session.user_id, data))?;

        self.audit.record(
            session.user_id,
            client,
            AuditEvent::new(AuditAction::Create, AuditResource::Form, form.id)
                .with_details(json!({ "title": form.title, "schemaId": form.schema_id })),
        )?;

        info!(form_id = %form.id, "form created");
        Ok(form)
    }

    pub fn update(
        &self,
        session: &UserSession,
        client: &ClientInfo,
        id: Uuid,
        request: UpdateFormRequest,
    ) -> Result<Form, ServiceError> {
        let mut form = self.fetch(id)?;
        let changes = request.changed_keys();

        let status = request
            .status
            .as_deref()
            .map(FormStatus::parse_required)
            .transpose()?;

        let reviewing = status.is_some_and(FormStatus::is_review);
        if reviewing {
            authorize(session, Permission::FormReview)?;
        }
        if !(reviewing && changes == ["status"]) {
            self.ensure_owner_or_moderator(session, &form)?;
        }
        if let Some(next) = status {
            if !form.status.can_transition_to(next) {
                return Err(ServiceError::conflict(format!(
                    "cannot move form from {} to {}",
                    form.status.label(),
                    next.label()
                )));
            }
        }

        if let Some(title) = request.title.as_deref() {
            form.title = present(Some(title))
                .ok_or_else(|| ServiceError::validation("title cannot be empty"))?
                .to_string();
        }
        if let Some(data) = request.data {
            form.data = object_or_default(Some(data))?;
        }

        if let Some(status) = status {
            if status == FormStatus::Submitted {
                if let Some(schema) = self.schemas.fetch_schema(form.schema_id)? {
                    let missing = schema.missing_required(&form.data);
                    if !missing.is_empty() {
                        return Err(ServiceError::validation(format!(
                            "missing required fields: {}",
                            missing.join(", ")
                        )));
                    }
                }
            }
            form.status = status;
        }

        form.updated_at = Utc::now();
        self.forms.update_form(form.clone())?;

        self.audit.record(
            session.user_id,
            client,
            AuditEvent::new(AuditAction::Update, AuditResource::Form, form.id)
                .with_details(json!({ "changes": changes })),
        )?;

        Ok(form)
    }

    pub fn delete(
        &self,
        session: &UserSession,
        client: &ClientInfo,
        id: Uuid,
    ) -> Result<(), ServiceError> {
        let form = self.fetch(id)?;
        self.ensure_owner_or_moderator(session, &form)?;

        if form.status != FormStatus::Draft {
            return Err(ServiceError::forbidden("only draft forms can be deleted"));
        }

        self.forms.delete_form(form.id)?;

        self.audit.record(
            session.user_id,
            client,
            AuditEvent::new(AuditAction::Delete, AuditResource::Form, form.id)
                .with_details(json!({ "title": form.title })),
        )?;

        info!(form_id = %form.id, "form deleted");
        Ok(())
    }

    fn fetch(&self, id: Uuid) -> Result<Form, ServiceError> {
        self.forms
            .fetch_form(id)?
            .ok_or(ServiceError::NotFound("form"))
    }

    fn ensure_owner_or_moderator(&self, session: &UserSession, form: &Form) -> Result<(), ServiceError> {
        if form.created_by == session.user_id {
            Ok(())
        } else {
            authorize(session, Permission::FormModerate)
        }
    }
}

fn object_or_default(data: Option<Value>) -> Result<Value, ServiceError> {
    match data {
        None | Some(Value::Null) => Ok(Value::Object(Default::default())),
        Some(value @ Value::Object(_)) => Ok(value),
        Some(_) => Err(ServiceError::validation("data must be a JSON object")),
    }
}
