//! Demo accounts, document schemas and marketplace products loaded at startup.
//!
//! Seeding is idempotent: records whose email, slug or product name already exist are skipped.

use ecodata::auth::{PasswordHasher, Role};
use ecodata::error::AppError;
use ecodata::intake::accounts::{normalize_email, User, UserRepository};
use ecodata::intake::marketplace::{MarketplaceProduct, ProductRepository};
use ecodata::intake::notifications::{Notification, NotificationKind, NotificationRepository};
use ecodata::intake::schemas::{Schema, SchemaField, SchemaRepository, SchemaStatus};
use ecodata::persistence::InMemoryStore;

struct SeedUser {
    email: &'static str,
    password: &'static str,
    full_name: &'static str,
    role: Role,
}

const USERS: [SeedUser; 3] = [
    SeedUser {
        email: "admin@ecodata.io",
        password: "admin123",
        full_name: "Administrador Soberano",
        role: Role::SecurityAdmin,
    },
    SeedUser {
        email: "broker@ecodata.io",
        password: "broker123",
        full_name: "Carlos Corretor",
        role: Role::Broker,
    },
    SeedUser {
        email: "analyst@ecodata.io",
        password: "analyst123",
        full_name: "Ana Analista de Docs",
        role: Role::DocAnalyst,
    },
];

struct SeedSchema {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    status: SchemaStatus,
    version: &'static str,
    /// `(id, label, type, required)`
    fields: &'static [(&'static str, &'static str, &'static str, bool)],
}

const SCHEMAS: [SeedSchema; 3] = [
    SeedSchema {
        name: "RG Nacional",
        slug: "rg-nacional",
        description: "Registro Geral emitido pelas secretarias estaduais",
        status: SchemaStatus::Active,
        version: "1.2.0",
        fields: &[
            ("nome", "Nome completo", "text", true),
            ("rg_numero", "Número do RG", "text", true),
            ("data_nascimento", "Data de nascimento", "date", true),
            ("filiacao_mae", "Filiação (mãe)", "text", true),
            ("filiacao_pai", "Filiação (pai)", "text", true),
            ("naturalidade", "Naturalidade", "text", true),
            ("orgao_emissor", "Órgão emissor", "text", true),
            ("data_emissao", "Data de emissão", "date", true),
        ],
    },
    SeedSchema {
        name: "CNH Digital",
        slug: "cnh-digital",
        description: "Carteira Nacional de Habilitação no formato digital",
        status: SchemaStatus::Active,
        version: "2.1.0",
        fields: &[
            ("nome", "Nome completo", "text", true),
            ("cpf", "CPF", "text", true),
            ("data_nascimento", "Data de nascimento", "date", true),
            ("registro", "Nº de registro", "text", true),
            ("validade", "Validade", "date", true),
            ("categoria", "Categoria", "text", true),
            ("primeira_habilitacao", "Primeira habilitação", "date", false),
            ("observacoes", "Observações", "text", false),
            ("renach", "RENACH", "text", false),
            ("espelho", "Nº do espelho", "text", false),
            ("local", "Local de emissão", "text", false),
            ("foto_base64", "Foto", "text", false),
        ],
    },
    SeedSchema {
        name: "Apólice Saúde",
        slug: "apolice-saude",
        description: "Apólice de seguro saúde individual ou familiar",
        status: SchemaStatus::Draft,
        version: "0.5.0",
        fields: &[
            ("segurado_nome", "Nome do segurado", "text", true),
            ("segurado_cpf", "CPF do segurado", "text", true),
            ("plano", "Plano", "select", true),
            ("valor_mensal", "Valor mensal", "number", true),
            ("vigencia_inicio", "Início da vigência", "date", true),
            ("vigencia_fim", "Fim da vigência", "date", true),
            ("beneficiarios", "Beneficiários", "text", false),
            ("carencia", "Carência", "text", false),
            ("cobertura", "Cobertura", "text", false),
            ("exclusoes", "Exclusões", "text", false),
        ],
    },
];

/// `(name, description, category, price in cents)`, all priced in BRL.
const PRODUCTS: [(&str, &str, &str, i64); 3] = [
    (
        "Motor OCR Premium",
        "Reconhecimento de texto com modelos treinados para documentos brasileiros",
        "ocr",
        29_990,
    ),
    (
        "Validador de CNH",
        "Conferência automática de campos e validade da CNH",
        "validation",
        14_990,
    ),
    (
        "Assinatura Digital ICP-Brasil",
        "Assinatura de documentos com certificado ICP-Brasil",
        "security",
        49_990,
    ),
];

/// Number of records created by one seeding pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SeedSummary {
    pub(crate) users: usize,
    pub(crate) schemas: usize,
    pub(crate) products: usize,
}

pub(crate) async fn seed_demo_data(
    store: &InMemoryStore,
    hasher: &PasswordHasher,
) -> Result<SeedSummary, AppError> {
    let mut summary = SeedSummary::default();

    for seed in &USERS {
        if store.find_user_by_email(&normalize_email(seed.email))?.is_some() {
            continue;
        }
        let hash = hasher.hash(seed.password).await?;
        let user = store.insert_user(User::new(seed.email, hash, seed.full_name, seed.role))?;
        summary.users += 1;

        if user.role == Role::SecurityAdmin {
            welcome_admin(store, &user)?;
        }
    }

    for seed in &SCHEMAS {
        if store.find_schema_by_slug(seed.slug)?.is_some() {
            continue;
        }
        let fields = seed
            .fields
            .iter()
            .map(|(id, label, kind, required)| SchemaField::new(id, label, kind, *required))
            .collect();
        let mut schema = Schema::new(seed.name, seed.slug, fields, seed.status);
        schema.description = Some(seed.description.to_string());
        schema.version = seed.version.to_string();
        store.insert_schema(schema)?;
        summary.schemas += 1;
    }

    let existing: Vec<String> = store
        .list_active_products(None)?
        .into_iter()
        .map(|product| product.name)
        .collect();
    for (name, description, category, price_cents) in PRODUCTS {
        if existing.iter().any(|known| known == name) {
            continue;
        }
        store.insert_product(MarketplaceProduct::new(
            name,
            description,
            category,
            price_cents,
            "BRL",
        ))?;
        summary.products += 1;
    }

    Ok(summary)
}

fn welcome_admin(store: &InMemoryStore, admin: &User) -> Result<(), AppError> {
    store.insert_notification(
        Notification::new(
            admin.id,
            NotificationKind::Info,
            "Bem-vindo ao EcoData",
            "Sua plataforma de extração de documentos está pronta.",
        )
        .with_link("/dashboard/settings"),
    )?;
    store.insert_notification(Notification::new(
        admin.id,
        NotificationKind::Warning,
        "Configurar API Key",
        "Configure as chaves de integração antes de processar documentos em produção.",
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeds_accounts_schemas_and_products_once() {
        let store = InMemoryStore::new();
        let hasher = PasswordHasher::new(4);

        let first = seed_demo_data(&store, &hasher).await.expect("seed");
        assert_eq!(
            first,
            SeedSummary {
                users: 3,
                schemas: 3,
                products: 3
            }
        );

        let admin = store
            .find_user_by_email("admin@ecodata.io")
            .expect("lookup")
            .expect("admin seeded");
        assert_eq!(admin.role, Role::SecurityAdmin);
        assert!(hasher
            .verify("admin123", &admin.password_hash)
            .await
            .expect("verify"));
        assert_eq!(store.count_unread(admin.id).expect("count"), 2);

        let cnh = store
            .find_schema_by_slug("cnh-digital")
            .expect("lookup")
            .expect("schema seeded");
        assert_eq!(cnh.version, "2.1.0");
        assert_eq!(cnh.fields.len(), 12);
        assert_eq!(cnh.fields.iter().filter(|field| field.required).count(), 6);

        let draft = store
            .find_schema_by_slug("apolice-saude")
            .expect("lookup")
            .expect("schema seeded");
        assert_eq!(draft.status, SchemaStatus::Draft);

        let again = seed_demo_data(&store, &hasher).await.expect("reseed");
        assert_eq!(again, SeedSummary::default());
        assert_eq!(store.list_active_products(None).expect("products").len(), 3);
    }
}
