use serde::{Deserialize, Serialize};

/// Resource reference handed to a model's input slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetResource {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DataItemDataset {
    pub id: String,
    #[serde(default)]
    pub resources: Vec<DatasetResource>,
}

/// One input-data slot of a model configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataItem {
    pub id: String,
    pub dataset: DataItemDataset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupParameter {
    pub id: String,
    pub value: String,
}

/// Model configuration sent to the `setup` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupRequest {
    pub model_id: String,
    #[serde(default)]
    pub parameters: Vec<SetupParameter>,
    #[serde(default)]
    pub data: Vec<DataItem>,
}

impl SetupRequest {
    /// Point the input slot `slot_id` at a single resource of `dataset_id`.
    ///
    /// Returns `false` when the request has no slot with that id.
    pub fn bind_input(&mut self, slot_id: &str, dataset_id: &str, resource: DatasetResource) -> bool {
        match self.data.iter_mut().find(|item| item.id == slot_id) {
            Some(item) => {
                item.dataset = DataItemDataset {
                    id: dataset_id.to_string(),
                    resources: vec![resource],
                };
                true
            }
            None => false,
        }
    }
}
