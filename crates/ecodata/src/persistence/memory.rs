use std::cmp::Reverse;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use super::{RecordStore, RepositoryError};
use crate::audit::{AuditFilter, AuditRecord, AuditRepository};
use crate::intake::accounts::{User, UserRepository};
use crate::intake::documents::{
    Document, DocumentFilter, DocumentRepository, Extraction, ExtractionRepository,
};
use crate::intake::forms::{Form, FormFilter, FormRepository};
use crate::intake::marketplace::{MarketplaceProduct, ProductRepository};
use crate::intake::notifications::{Notification, NotificationRepository};
use crate::intake::schemas::{Schema, SchemaFilter, SchemaRepository, SchemaVersion};

/// Process-local store backing every repository trait. Tables keep insertion order so
/// equal timestamps still list newest first.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    users: Arc<Mutex<Vec<User>>>,
    documents: Arc<Mutex<Vec<Document>>>,
    extractions: Arc<Mutex<Vec<Extraction>>>,
    schemas: Arc<Mutex<Vec<Schema>>>,
    schema_versions: Arc<Mutex<Vec<SchemaVersion>>>,
    forms: Arc<Mutex<Vec<Form>>>,
    notifications: Arc<Mutex<Vec<Notification>>>,
    products: Arc<Mutex<Vec<MarketplaceProduct>>>,
    audit: Arc<Mutex<Vec<AuditRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(table: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    table
        .lock()
        .map_err(|_| RepositoryError::Unavailable("in-memory table lock poisoned".to_string()))
}

/// Newest-inserted first, then stably sorted by `key` descending.
fn newest_first<T, K, F>(rows: &[T], keep: impl Fn(&T) -> bool, key: F) -> Vec<T>
where
    T: Clone,
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut selected: Vec<T> = rows.iter().rev().filter(|row| keep(row)).cloned().collect();
    selected.sort_by_key(|row| Reverse(key(row)));
    selected
}

fn window<T>(rows: Vec<T>, offset: usize, limit: usize) -> Vec<T> {
    rows.into_iter().skip(offset).take(limit).collect()
}

fn replace<T>(
    rows: &mut [T],
    record: T,
    same: impl Fn(&T, &T) -> bool,
) -> Result<(), RepositoryError> {
    match rows.iter_mut().find(|row| same(row, &record)) {
        Some(slot) => {
            *slot = record;
            Ok(())
        }
        None => Err(RepositoryError::NotFound),
    }
}

impl UserRepository for InMemoryStore {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = lock(&self.users)?;
        if users
            .iter()
            .any(|existing| existing.id == user.id || existing.email == user.email)
        {
            return Err(RepositoryError::Conflict);
        }
        users.push(user.clone());
        Ok(user)
    }

    fn fetch_user(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.users)?.iter().find(|user| user.id == id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(lock(&self.users)?
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    fn update_user(&self, user: User) -> Result<(), RepositoryError> {
        replace(&mut lock(&self.users)?, user, |a, b| a.id == b.id)
    }
}

impl DocumentRepository for InMemoryStore {
    fn insert_document(&self, document: Document) -> Result<Document, RepositoryError> {
        let mut documents = lock(&self.documents)?;
        if documents.iter().any(|existing| existing.id == document.id) {
            return Err(RepositoryError::Conflict);
        }
        documents.push(document.clone());
        Ok(document)
    }

    fn fetch_document(&self, id: Uuid) -> Result<Option<Document>, RepositoryError> {
        Ok(lock(&self.documents)?
            .iter()
            .find(|document| document.id == id)
            .cloned())
    }

    fn update_document(&self, document: Document) -> Result<(), RepositoryError> {
        replace(&mut lock(&self.documents)?, document, |a, b| a.id == b.id)
    }

    fn list_documents(
        &self,
        filter: &DocumentFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Document>, RepositoryError> {
        let documents = lock(&self.documents)?;
        let rows = newest_first(&documents, |doc| filter.matches(doc), |doc| doc.created_at);
        Ok(window(rows, offset, limit))
    }

    fn count_documents(&self, filter: &DocumentFilter) -> Result<usize, RepositoryError> {
        Ok(lock(&self.documents)?
            .iter()
            .filter(|document| filter.matches(document))
            .count())
    }

    fn count_documents_for_schema(&self, schema_id: Uuid) -> Result<usize, RepositoryError> {
        Ok(lock(&self.documents)?
            .iter()
            .filter(|document| document.schema_id == Some(schema_id))
            .count())
    }
}

impl ExtractionRepository for InMemoryStore {
    fn insert_extraction(&self, extraction: Extraction) -> Result<Extraction, RepositoryError> {
        let documents = lock(&self.documents)?;
        if !documents
            .iter()
            .any(|document| document.id == extraction.document_id)
        {
            return Err(RepositoryError::NotFound);
        }
        lock(&self.extractions)?.push(extraction.clone());
        Ok(extraction)
    }

    fn extractions_for_document(
        &self,
        document_id: Uuid,
    ) -> Result<Vec<Extraction>, RepositoryError> {
        let extractions = lock(&self.extractions)?;
        Ok(newest_first(
            &extractions,
            |extraction| extraction.document_id == document_id,
            |extraction| extraction.created_at,
        ))
    }

    fn count_extractions(&self, document_id: Uuid) -> Result<usize, RepositoryError> {
        Ok(lock(&self.extractions)?
            .iter()
            .filter(|extraction| extraction.document_id == document_id)
            .count())
    }
}

impl SchemaRepository for InMemoryStore {
    fn insert_schema(&self, schema: Schema) -> Result<Schema, RepositoryError> {
        let mut schemas = lock(&self.schemas)?;
        if schemas
            .iter()
            .any(|existing| existing.id == schema.id || existing.slug == schema.slug)
        {
            return Err(RepositoryError::Conflict);
        }
        schemas.push(schema.clone());
        Ok(schema)
    }

    fn fetch_schema(&self, id: Uuid) -> Result<Option<Schema>, RepositoryError> {
        Ok(lock(&self.schemas)?
            .iter()
            .find(|schema| schema.id == id)
            .cloned())
    }

    fn find_schema_by_slug(&self, slug: &str) -> Result<Option<Schema>, RepositoryError> {
        Ok(lock(&self.schemas)?
            .iter()
            .find(|schema| schema.slug == slug)
            .cloned())
    }

    fn update_schema(&self, schema: Schema) -> Result<(), RepositoryError> {
        replace(&mut lock(&self.schemas)?, schema, |a, b| a.id == b.id)
    }

    fn list_schemas(&self, filter: &SchemaFilter) -> Result<Vec<Schema>, RepositoryError> {
        let schemas = lock(&self.schemas)?;
        Ok(newest_first(
            &schemas,
            |schema| filter.matches(schema),
            |schema| schema.updated_at,
        ))
    }

    fn push_schema_version(&self, version: SchemaVersion) -> Result<(), RepositoryError> {
        lock(&self.schema_versions)?.push(version);
        Ok(())
    }

    fn schema_versions(
        &self,
        schema_id: Uuid,
        limit: usize,
    ) -> Result<Vec<SchemaVersion>, RepositoryError> {
        let versions = lock(&self.schema_versions)?;
        let rows = newest_first(
            &versions,
            |version| version.schema_id == schema_id,
            |version| version.created_at,
        );
        Ok(window(rows, 0, limit))
    }

    fn count_schema_versions(&self, schema_id: Uuid) -> Result<usize, RepositoryError> {
        Ok(lock(&self.schema_versions)?
            .iter()
            .filter(|version| version.schema_id == schema_id)
            .count())
    }
}

impl FormRepository for InMemoryStore {
    fn insert_form(&self, form: Form) -> Result<Form, RepositoryError> {
        let mut forms = lock(&self.forms)?;
        if forms.iter().any(|existing| existing.id == form.id) {
            return Err(RepositoryError::Conflict);
        }
        forms.push(form.clone());
        Ok(form)
    }

    fn fetch_form(&self, id: Uuid) -> Result<Option<Form>, RepositoryError> {
        Ok(lock(&self.forms)?.iter().find(|form| form.id == id).cloned())
    }

    fn update_form(&self, form: Form) -> Result<(), RepositoryError> {
        replace(&mut lock(&self.forms)?, form, |a, b| a.id == b.id)
    }

    fn delete_form(&self, id: Uuid) -> Result<(), RepositoryError> {
        let mut forms = lock(&self.forms)?;
        let before = forms.len();
        forms.retain(|form| form.id != id);
        if forms.len() == before {
            Err(RepositoryError::NotFound)
        } else {
            Ok(())
        }
    }

    fn list_forms(
        &self,
        filter: &FormFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Form>, RepositoryError> {
        let forms = lock(&self.forms)?;
        let rows = newest_first(&forms, |form| filter.matches(form), |form| form.updated_at);
        Ok(window(rows, offset, limit))
    }

    fn count_forms(&self, filter: &FormFilter) -> Result<usize, RepositoryError> {
        Ok(lock(&self.forms)?
            .iter()
            .filter(|form| filter.matches(form))
            .count())
    }

    fn count_forms_for_schema(&self, schema_id: Uuid) -> Result<usize, RepositoryError> {
        Ok(lock(&self.forms)?
            .iter()
            .filter(|form| form.schema_id == schema_id)
            .count())
    }
}

impl NotificationRepository for InMemoryStore {
    fn insert_notification(
        &self,
        notification: Notification,
    ) -> Result<Notification, RepositoryError> {
        lock(&self.notifications)?.push(notification.clone());
        Ok(notification)
    }

    fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: usize,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let notifications = lock(&self.notifications)?;
        let rows = newest_first(
            &notifications,
            |notification| {
                notification.user_id == user_id && (!unread_only || !notification.read)
            },
            |notification| notification.created_at,
        );
        Ok(window(rows, 0, limit))
    }

    fn count_unread(&self, user_id: Uuid) -> Result<usize, RepositoryError> {
        Ok(lock(&self.notifications)?
            .iter()
            .filter(|notification| notification.user_id == user_id && !notification.read)
            .count())
    }

    fn mark_read(&self, user_id: Uuid, ids: Option<&[Uuid]>) -> Result<usize, RepositoryError> {
        let mut notifications = lock(&self.notifications)?;
        let mut updated = 0;
        for notification in notifications.iter_mut().filter(|notification| {
            notification.user_id == user_id
                && !notification.read
                && ids.map_or(true, |ids| ids.contains(&notification.id))
        }) {
            notification.read = true;
            updated += 1;
        }
        Ok(updated)
    }
}

impl ProductRepository for InMemoryStore {
    fn insert_product(
        &self,
        product: MarketplaceProduct,
    ) -> Result<MarketplaceProduct, RepositoryError> {
        let mut products = lock(&self.products)?;
        if products.iter().any(|existing| existing.id == product.id) {
            return Err(RepositoryError::Conflict);
        }
        products.push(product.clone());
        Ok(product)
    }

    fn fetch_product(&self, id: Uuid) -> Result<Option<MarketplaceProduct>, RepositoryError> {
        Ok(lock(&self.products)?
            .iter()
            .find(|product| product.id == id)
            .cloned())
    }

    fn list_active_products(
        &self,
        category: Option<&str>,
    ) -> Result<Vec<MarketplaceProduct>, RepositoryError> {
        let mut products: Vec<MarketplaceProduct> = lock(&self.products)?
            .iter()
            .filter(|product| product.is_active)
            .filter(|product| category.map_or(true, |category| product.category == category))
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }
}

impl AuditRepository for InMemoryStore {
    fn append(&self, record: AuditRecord) -> Result<AuditRecord, RepositoryError> {
        lock(&self.audit)?.push(record.clone());
        Ok(record)
    }

    fn list_audit(
        &self,
        filter: &AuditFilter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<AuditRecord>, RepositoryError> {
        let records = lock(&self.audit)?;
        let rows = newest_first(&records, |record| filter.matches(record), |record| record.created_at);
        Ok(window(rows, offset, limit))
    }

    fn count_audit(&self, filter: &AuditFilter) -> Result<usize, RepositoryError> {
        Ok(lock(&self.audit)?
            .iter()
            .filter(|record| filter.matches(record))
            .count())
    }
}

impl RecordStore for InMemoryStore {
    fn ping(&self) -> Result<(), RepositoryError> {
        lock(&self.users).map(|_| ())
    }
}
