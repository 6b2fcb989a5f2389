use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Placeholder for a field whose selector matched nothing.
pub const NOT_AVAILABLE: &str = "N/A";

/// A count pulled from the listing's fact list: parsed, or kept as the sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FactValue {
    Count(u32),
    Text(String),
}

impl FactValue {
    pub fn not_available() -> Self {
        FactValue::Text(NOT_AVAILABLE.to_string())
    }
}

impl std::fmt::Display for FactValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FactValue::Count(n) => write!(f, "{}", n),
            FactValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRecord {
    pub url: String,
    pub title: String,
    pub price: String,
    pub location: String,
    pub description: String,
    pub amenities: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guests: Option<FactValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<FactValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beds: Option<FactValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baths: Option<FactValue>,
}

/// What is left of a listing when its page could not be scraped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub url: String,
    pub error: String,
}

/// One output slot per discovered URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ScrapeOutcome {
    Listing(ListingRecord),
    Failed(ErrorRecord),
}

impl ScrapeOutcome {
    pub fn url(&self) -> &str {
        match self {
            ScrapeOutcome::Listing(record) => &record.url,
            ScrapeOutcome::Failed(record) => &record.url,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ScrapeOutcome::Failed(_))
    }

    pub fn csv_headers() -> [&'static str; 11] {
        [
            "url",
            "title",
            "price",
            "location",
            "description",
            "amenities",
            "guests",
            "bedrooms",
            "beds",
            "baths",
            "error",
        ]
    }

    pub fn to_csv_record(&self) -> Vec<String> {
        match self {
            ScrapeOutcome::Listing(record) => {
                let fact = |value: &Option<FactValue>| {
                    value
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
                };
                vec![
                    record.url.clone(),
                    record.title.clone(),
                    record.price.clone(),
                    record.location.clone(),
                    record.description.clone(),
                    record.amenities.join("; "),
                    fact(&record.guests),
                    fact(&record.bedrooms),
                    fact(&record.beds),
                    fact(&record.baths),
                    String::new(),
                ]
            }
            ScrapeOutcome::Failed(record) => vec![
                record.url.clone(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                record.error.clone(),
            ],
        }
    }
}

/// Summary of a classifieds post as it appears on the results page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostHeader {
    pub title: String,
    pub url: String,
    pub advert_label: String,
    pub price: String,
}

/// Fields only available on a post's own page.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostDetail {
    pub description: String,
    pub location: String,
    pub transmission_type: String,
    pub condition: String,
    pub advert: String,
    pub image: Option<String>,
}

/// A header record, enriched with its detail fields when the fan-out succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRecord {
    pub header: PostHeader,
    pub detail: Option<PostDetail>,
}

impl ClassifiedRecord {
    pub fn header_only(header: PostHeader) -> Self {
        Self {
            header,
            detail: None,
        }
    }

    pub fn csv_headers() -> [&'static str; 10] {
        [
            "title",
            "url",
            "advertLabel_1",
            "price",
            "description",
            "location",
            "transmissionType",
            "condition",
            "advert",
            "image",
        ]
    }

    pub fn to_csv_record(&self) -> Vec<String> {
        let mut row = vec![
            self.header.title.clone(),
            self.header.url.clone(),
            self.header.advert_label.clone(),
            self.header.price.clone(),
        ];
        match &self.detail {
            Some(detail) => row.extend([
                detail.description.clone(),
                detail.location.clone(),
                detail.transmission_type.clone(),
                detail.condition.clone(),
                detail.advert.clone(),
                detail.image.clone().unwrap_or_default(),
            ]),
            None => row.extend(std::iter::repeat(String::new()).take(6)),
        }
        row
    }
}

// Header-only records serialize without any detail keys
impl Serialize for ClassifiedRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let len = if self.detail.is_some() { 10 } else { 4 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("title", &self.header.title)?;
        map.serialize_entry("url", &self.header.url)?;
        map.serialize_entry("advertLabel_1", &self.header.advert_label)?;
        map.serialize_entry("price", &self.header.price)?;

        if let Some(detail) = &self.detail {
            map.serialize_entry("description", &detail.description)?;
            map.serialize_entry("location", &detail.location)?;
            map.serialize_entry("transmissionType", &detail.transmission_type)?;
            map.serialize_entry("condition", &detail.condition)?;
            map.serialize_entry("advert", &detail.advert)?;
            map.serialize_entry("image", &detail.image)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loft() -> ListingRecord {
        ListingRecord {
            url: "https://example.com/rooms/1".to_string(),
            title: "Loft".to_string(),
            price: NOT_AVAILABLE.to_string(),
            location: "Lekki, Lagos".to_string(),
            description: NOT_AVAILABLE.to_string(),
            amenities: vec!["Wifi".to_string(), "Kitchen".to_string()],
            guests: Some(FactValue::Count(2)),
            bedrooms: None,
            beds: Some(FactValue::not_available()),
            baths: None,
        }
    }

    #[test]
    fn listing_omits_unmatched_facts_in_json() {
        let value = serde_json::to_value(ScrapeOutcome::Listing(loft())).unwrap();
        assert_eq!(value["guests"], json!(2));
        assert_eq!(value["beds"], json!("N/A"));
        assert!(value.get("bedrooms").is_none());
        assert!(value.get("error").is_none());
    }

    #[test]
    fn failed_outcome_serializes_flat() {
        let outcome = ScrapeOutcome::Failed(ErrorRecord {
            url: "https://example.com/rooms/9".to_string(),
            error: "boom".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"url": "https://example.com/rooms/9", "error": "boom"})
        );
        assert!(outcome.is_failed());
    }

    #[test]
    fn csv_rows_match_header_width() {
        let listing = ScrapeOutcome::Listing(loft());
        let row = listing.to_csv_record();
        assert_eq!(row.len(), ScrapeOutcome::csv_headers().len());
        assert_eq!(row[5], "Wifi; Kitchen");
        assert_eq!(row[7], "N/A");

        let failed = ScrapeOutcome::Failed(ErrorRecord {
            url: "u".to_string(),
            error: "e".to_string(),
        });
        let row = failed.to_csv_record();
        assert_eq!(row.len(), ScrapeOutcome::csv_headers().len());
        let column = |name: &str| {
            let index = ScrapeOutcome::csv_headers().iter().position(|h| *h == name).unwrap();
            row[index].as_str()
        };
        assert_eq!(column("url"), "u");
        assert_eq!(column("error"), "e");
        assert_eq!(column("title"), "");
        assert_eq!(column("baths"), "");
    }

    #[test]
    fn header_only_classified_has_no_detail_keys() {
        let record = ClassifiedRecord::header_only(PostHeader {
            title: "Toyota Camry".to_string(),
            url: "https://jiji.ng/cars/1".to_string(),
            advert_label: "Popular".to_string(),
            price: "₦ 5,000,000".to_string(),
        });
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 4);
        assert_eq!(value["advertLabel_1"], json!("Popular"));
        assert_eq!(record.to_csv_record().len(), ClassifiedRecord::csv_headers().len());
    }
}
