//! Structural, enum and type definition records

use super::default_true;
use octofhir_odata_types::{Facets, FullQualifiedName};
use serde::{Deserialize, Serialize};

/// Entity type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlEntityType {
    pub name: String,
    #[serde(default)]
    pub base_type: Option<FullQualifiedName>,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub open_type: bool,
    #[serde(default)]
    pub has_stream: bool,
    /// Ordered key; empty when the key is inherited
    #[serde(default)]
    pub key: Vec<CsdlPropertyRef>,
    #[serde(default)]
    pub properties: Vec<CsdlProperty>,
    #[serde(default)]
    pub navigation_properties: Vec<CsdlNavigationProperty>,
}

impl CsdlEntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_type: None,
            is_abstract: false,
            open_type: false,
            has_stream: false,
            key: Vec::new(),
            properties: Vec::new(),
            navigation_properties: Vec::new(),
        }
    }

    pub fn with_base_type(mut self, base_type: FullQualifiedName) -> Self {
        self.base_type = Some(base_type);
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn with_open_type(mut self, open_type: bool) -> Self {
        self.open_type = open_type;
        self
    }

    pub fn with_has_stream(mut self, has_stream: bool) -> Self {
        self.has_stream = has_stream;
        self
    }

    pub fn with_key(mut self, key: Vec<CsdlPropertyRef>) -> Self {
        self.key = key;
        self
    }

    pub fn with_properties(mut self, properties: Vec<CsdlProperty>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_navigation_properties(mut self, navigation: Vec<CsdlNavigationProperty>) -> Self {
        self.navigation_properties = navigation;
        self
    }
}

/// Complex type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlComplexType {
    pub name: String,
    #[serde(default)]
    pub base_type: Option<FullQualifiedName>,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub open_type: bool,
    #[serde(default)]
    pub properties: Vec<CsdlProperty>,
    #[serde(default)]
    pub navigation_properties: Vec<CsdlNavigationProperty>,
}

impl CsdlComplexType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_type: None,
            is_abstract: false,
            open_type: false,
            properties: Vec::new(),
            navigation_properties: Vec::new(),
        }
    }

    pub fn with_base_type(mut self, base_type: FullQualifiedName) -> Self {
        self.base_type = Some(base_type);
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn with_open_type(mut self, open_type: bool) -> Self {
        self.open_type = open_type;
        self
    }

    pub fn with_properties(mut self, properties: Vec<CsdlProperty>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_navigation_properties(mut self, navigation: Vec<CsdlNavigationProperty>) -> Self {
        self.navigation_properties = navigation;
        self
    }
}

/// Structural property of an entity or complex type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: FullQualifiedName,
    #[serde(default)]
    pub collection: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(flatten)]
    pub facets: Facets,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub mapping: Option<CsdlMapping>,
}

impl CsdlProperty {
    pub fn new(name: impl Into<String>, type_name: FullQualifiedName) -> Self {
        Self {
            name: name.into(),
            type_name,
            collection: false,
            nullable: true,
            facets: Facets::default(),
            default_value: None,
            mime_type: None,
            mapping: None,
        }
    }

    pub fn with_collection(mut self, collection: bool) -> Self {
        self.collection = collection;
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_facets(mut self, facets: Facets) -> Self {
        self.facets = facets;
        self
    }

    pub fn with_default_value(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    pub fn with_mapping(mut self, mapping: CsdlMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }
}

/// Hint connecting a property to its backing storage
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CsdlMapping {
    pub internal_name: Option<String>,
    pub mapped_type: Option<String>,
}

/// Navigation property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlNavigationProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: FullQualifiedName,
    #[serde(default)]
    pub collection: bool,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub partner: Option<String>,
    #[serde(default)]
    pub contains_target: bool,
    #[serde(default)]
    pub referential_constraints: Vec<CsdlReferentialConstraint>,
}

impl CsdlNavigationProperty {
    pub fn new(name: impl Into<String>, type_name: FullQualifiedName) -> Self {
        Self {
            name: name.into(),
            type_name,
            collection: false,
            nullable: true,
            partner: None,
            contains_target: false,
            referential_constraints: Vec::new(),
        }
    }

    pub fn with_collection(mut self, collection: bool) -> Self {
        self.collection = collection;
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_partner(mut self, partner: impl Into<String>) -> Self {
        self.partner = Some(partner.into());
        self
    }

    pub fn with_contains_target(mut self, contains_target: bool) -> Self {
        self.contains_target = contains_target;
        self
    }

    pub fn with_referential_constraints(mut self, constraints: Vec<CsdlReferentialConstraint>) -> Self {
        self.referential_constraints = constraints;
        self
    }
}

/// `(dependent property, principal property)` pair of a navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlReferentialConstraint {
    pub property: String,
    pub referenced_property: String,
}

impl CsdlReferentialConstraint {
    pub fn new(property: impl Into<String>, referenced_property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            referenced_property: referenced_property.into(),
        }
    }
}

/// Key entry: a `/`-separated property path plus an optional alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlPropertyRef {
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl CsdlPropertyRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// Enum type definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlEnumType {
    pub name: String,
    /// Defaults to `Edm.Int32`
    #[serde(default)]
    pub underlying_type: Option<FullQualifiedName>,
    #[serde(default)]
    pub is_flags: bool,
    #[serde(default)]
    pub members: Vec<CsdlEnumMember>,
}

impl CsdlEnumType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            underlying_type: None,
            is_flags: false,
            members: Vec::new(),
        }
    }

    pub fn with_underlying_type(mut self, underlying_type: FullQualifiedName) -> Self {
        self.underlying_type = Some(underlying_type);
        self
    }

    pub fn with_flags(mut self, is_flags: bool) -> Self {
        self.is_flags = is_flags;
        self
    }

    pub fn with_members(mut self, members: Vec<CsdlEnumMember>) -> Self {
        self.members = members;
        self
    }
}

/// Enum member; a missing value continues from the previous member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlEnumMember {
    pub name: String,
    #[serde(default)]
    pub value: Option<i64>,
}

impl CsdlEnumMember {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
        }
    }

    pub fn implicit(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// Named primitive type with facets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsdlTypeDefinition {
    pub name: String,
    pub underlying_type: FullQualifiedName,
    #[serde(flatten)]
    pub facets: Facets,
}

impl CsdlTypeDefinition {
    pub fn new(name: impl Into<String>, underlying_type: FullQualifiedName) -> Self {
        Self {
            name: name.into(),
            underlying_type,
            facets: Facets::default(),
        }
    }

    pub fn with_facets(mut self, facets: Facets) -> Self {
        self.facets = facets;
        self
    }
}
