use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of platform roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Insured,
    Broker,
    DocAnalyst,
    TemplateCreator,
    Validator,
    SecurityAdmin,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Insured,
        Role::Broker,
        Role::DocAnalyst,
        Role::TemplateCreator,
        Role::Validator,
        Role::SecurityAdmin,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Role::Insured => "insured",
            Role::Broker => "broker",
            Role::DocAnalyst => "doc_analyst",
            Role::TemplateCreator => "template_creator",
            Role::Validator => "validator",
            Role::SecurityAdmin => "security_admin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.label() == raw.trim())
    }

    /// Registration falls back to the least privileged role for unknown input.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or(Role::Insured)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_label() {
        for role in Role::ALL {
            assert_eq!(Role::parse(role.label()), Some(role));
        }
    }

    #[test]
    fn unknown_roles_default_to_insured() {
        assert_eq!(Role::parse_or_default(Some("root")), Role::Insured);
        assert_eq!(Role::parse_or_default(None), Role::Insured);
        assert_eq!(Role::parse_or_default(Some("broker")), Role::Broker);
    }

    #[test]
    fn serializes_as_snake_case() {
        let encoded = serde_json::to_string(&Role::TemplateCreator).expect("serializes");
        assert_eq!(encoded, "\"template_creator\"");
    }
}
