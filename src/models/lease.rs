use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseDocument {
    pub text: String,
    pub metadata: LeaseMetadata,
    pub source: DocumentSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DocumentSource {
    File(PathBuf),
    Bytes { name: String, bytes: Vec<u8> },
    Text(String),
}

/// Facts about the tenancy, supplied by the caller or extracted by the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaseMetadata {
    #[serde(default)]
    pub property_address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub monthly_rent: Option<f64>,
    #[serde(default)]
    pub security_deposit: Option<f64>,
    #[serde(default)]
    pub lease_start_date: Option<String>,
    #[serde(default)]
    pub lease_end_date: Option<String>,
    #[serde(default)]
    pub landlord_name: Option<String>,
    #[serde(default, alias = "number_of_bedrooms")]
    pub bedrooms: Option<u32>,
    #[serde(default, alias = "number_of_bathrooms")]
    pub bathrooms: Option<f32>,
    #[serde(default)]
    pub location: Option<String>,
}

impl LeaseDocument {
    pub fn new(text: String, source: DocumentSource) -> Self {
        Self {
            text,
            metadata: LeaseMetadata::default(),
            source,
        }
    }

    pub fn from_text<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        Self::new(text.clone(), DocumentSource::Text(text))
    }

    pub fn with_metadata(mut self, metadata: LeaseMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn location(&self) -> Option<String> {
        self.metadata.location_label()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

impl DocumentSource {
    pub fn display_name(&self) -> String {
        match self {
            DocumentSource::File(path) => path.display().to_string(),
            DocumentSource::Bytes { name, .. } => name.clone(),
            DocumentSource::Text(_) => "<text>".to_string(),
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name())
    }
}

impl LeaseMetadata {
    pub fn with_location<S: Into<String>>(mut self, location: S) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_monthly_rent(mut self, rent: f64) -> Self {
        self.monthly_rent = Some(rent);
        self
    }

    pub fn with_bedrooms(mut self, bedrooms: u32) -> Self {
        self.bedrooms = Some(bedrooms);
        self
    }

    pub fn with_address<S: Into<String>>(mut self, address: S) -> Self {
        self.property_address = Some(address.into());
        self
    }

    /// Explicit location first, then "city, state", then whichever of the two exists.
    pub fn location_label(&self) -> Option<String> {
        if let Some(location) = non_blank(&self.location) {
            return Some(location.to_string());
        }

        match (non_blank(&self.city), non_blank(&self.state)) {
            (Some(city), Some(state)) => Some(format!("{}, {}", city, state)),
            (Some(city), None) => Some(city.to_string()),
            (None, Some(state)) => Some(state.to_string()),
            (None, None) => None,
        }
    }

    /// Fill fields that are still empty from `other`; values already present win.
    pub fn merge_missing(mut self, other: LeaseMetadata) -> Self {
        fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
            if slot.is_none() {
                *slot = value;
            }
        }

        fill(&mut self.property_address, other.property_address);
        fill(&mut self.city, other.city);
        fill(&mut self.state, other.state);
        fill(&mut self.zip_code, other.zip_code);
        fill(&mut self.monthly_rent, other.monthly_rent);
        fill(&mut self.security_deposit, other.security_deposit);
        fill(&mut self.lease_start_date, other.lease_start_date);
        fill(&mut self.lease_end_date, other.lease_end_date);
        fill(&mut self.landlord_name, other.landlord_name);
        fill(&mut self.bedrooms, other.bedrooms);
        fill(&mut self.bathrooms, other.bathrooms);
        fill(&mut self.location, other.location);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == LeaseMetadata::default()
    }

    /// One line per known field, used as prompt context.
    pub fn describe(&self) -> String {
        let mut lines = Vec::new();

        if let Some(ref address) = self.property_address {
            lines.push(format!("Address: {}", address));
        }
        if let Some(location) = self.location_label() {
            lines.push(format!("Location: {}", location));
        }
        if let Some(ref zip) = self.zip_code {
            lines.push(format!("ZIP code: {}", zip));
        }
        if let Some(rent) = self.monthly_rent {
            lines.push(format!("Monthly rent: ${:.2}", rent));
        }
        if let Some(deposit) = self.security_deposit {
            lines.push(format!("Security deposit: ${:.2}", deposit));
        }
        if let Some(bedrooms) = self.bedrooms {
            lines.push(format!("Bedrooms: {}", bedrooms));
        }
        if let Some(bathrooms) = self.bathrooms {
            lines.push(format!("Bathrooms: {}", bathrooms));
        }

        if lines.is_empty() {
            "No property details provided.".to_string()
        } else {
            lines.join("\n")
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}
