use serde::{Deserialize, Serialize};

/// Reference from a resource back to its owning dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRef {
    pub id: String,
}

/// A dataset resource as consumed by the transcription pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub url: String,
    pub name: String,
    pub dataset: DatasetRef,
}

impl Resource {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        name: impl Into<String>,
        dataset_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            name: name.into(),
            dataset: DatasetRef { id: dataset_id.into() },
        }
    }

    /// Combine a catalog resource with the package that owns it.
    /// Unnamed resources fall back to the last URL segment.
    pub fn from_catalog(package: &Package, resource: &CatalogResource) -> Self {
        let name = resource
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| {
                resource.url.rsplit('/').next().unwrap_or(resource.url.as_str()).to_string()
            });

        Self::new(&resource.id, &resource.url, name, &package.id)
    }
}

/// Resource record as stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogResource {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

/// Catalog dataset ("package"); its `notes` field holds the story text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_modified: Option<String>,
    #[serde(default)]
    pub num_resources: usize,
    #[serde(default)]
    pub resources: Vec<CatalogResource>,
}

impl Package {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(&self.name)
    }

    pub fn resource(&self, resource_id: &str) -> Option<&CatalogResource> {
        self.resources.iter().find(|r| r.id == resource_id)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PackageSearchResult {
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub results: Vec<Package>,
}

/// Partial metadata update for a package
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PackageChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl PackageChanges {
    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            notes: Some(notes.into()),
            ..Self::default()
        }
    }
}

/// Link-style resource creation (no file upload)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewResource {
    pub package_id: String,
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResourceChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Error object inside a catalog envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogErrorBody {
    #[serde(rename = "__type", default)]
    pub error_type: String,
    #[serde(default)]
    pub message: String,
}

/// Envelope wrapped around every catalog action response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogResponse<T> {
    #[serde(default)]
    pub help: String,
    pub success: bool,
    pub result: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<CatalogErrorBody>,
}
