use serde_json::Value;

use crate::catalog::SourceCollection;
use crate::data_models::{RawRecord, SearchResult, make_preview};
use crate::source::value_as_text;

const AREA_FIELDS: [&str; 6] = ["area", "Área", "Area", "área", "area_direito", "Área do Direito"];
const DEFAULT_AREA: &str = "Geral";

const AUTHOR_FIELDS: [&str; 3] = ["autor", "Autor", "author"];
const COVER_FIELDS: [&str; 6] = ["capa", "Capa", "imagem", "Imagem", "thumbnail", "cover"];
const LINK_FIELDS: [&str; 4] = ["link", "Link", "url", "URL"];
const DOWNLOAD_FIELDS: [&str; 4] = ["download", "Download", "pdf", "link_download"];

/// Identifier of a record, falling back to `#<position>` in the result set.
/// The `#` keeps positional ids apart from stored numeric ids.
pub fn record_id(record: &RawRecord, position: usize) -> String {
    for key in ["id", "_id"] {
        let id = match record.get(key) {
            // relaxed extended JSON ObjectId
            Some(Value::Object(obj)) => obj.get("$oid").map(value_as_text).unwrap_or_default(),
            Some(value) => value_as_text(value),
            None => String::new(),
        };
        if !id.is_empty() {
            return id;
        }
    }
    format!("#{position}")
}

fn first_non_empty(record: &RawRecord, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| record.get(*key))
        .map(value_as_text)
        .find(|text| !text.trim().is_empty())
}

fn field_text(record: &RawRecord, field: &str) -> String {
    record.get(field).map(value_as_text).unwrap_or_default()
}

/// Maps a raw row onto the uniform result shape. Never fails; missing
/// fields become empty strings.
pub fn normalize(collection: &SourceCollection, record: RawRecord, position: usize) -> SearchResult {
    let id = format!("{}-{}", collection.name, record_id(&record, position));
    let title = field_text(&record, &collection.title_field);
    let content = field_text(&record, &collection.body_field);

    let area = collection
        .category_field
        .as_deref()
        .and_then(|field| first_non_empty(&record, &[field]))
        .or_else(|| first_non_empty(&record, &AREA_FIELDS))
        .unwrap_or_else(|| DEFAULT_AREA.to_string());

    let author = first_non_empty(&record, &AUTHOR_FIELDS).unwrap_or_default();
    let cover = first_non_empty(&record, &COVER_FIELDS).unwrap_or_default();
    let link = first_non_empty(&record, &LINK_FIELDS).unwrap_or_default();
    let download = first_non_empty(&record, &DOWNLOAD_FIELDS).unwrap_or_default();

    let mut metadata = record;
    metadata.insert("author".to_string(), Value::String(author));
    metadata.insert("subject_area".to_string(), Value::String(area.clone()));
    metadata.insert("cover_image".to_string(), Value::String(cover));
    metadata.insert("external_link".to_string(), Value::String(link));
    metadata.insert("download_link".to_string(), Value::String(download));

    SearchResult {
        id,
        collection: collection.name.clone(),
        preview: make_preview(&content),
        title,
        content,
        category: collection.category,
        category_label: collection.label.clone(),
        area,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_models::Category;
    use serde_json::json;

    fn books() -> SourceCollection {
        SourceCollection::new("biblioteca", Category::Book, "Biblioteca")
            .title("livro")
            .body("sobre")
            .category_field("área")
    }

    fn record(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_maps_configured_fields() {
        let result = normalize(
            &books(),
            record(json!({
                "id": 7,
                "livro": "Manual de Direito Civil",
                "sobre": "Obra de referência",
                "área": "Civil",
                "Autor": "Fulano",
                "pdf": "https://example.com/a.pdf",
            })),
            0,
        );

        assert_eq!(result.id, "biblioteca-7");
        assert_eq!(result.title, "Manual de Direito Civil");
        assert_eq!(result.content, "Obra de referência");
        assert_eq!(result.area, "Civil");
        assert_eq!(result.category, Category::Book);
        assert_eq!(result.category_label, "Biblioteca");
        assert_eq!(result.metadata["author"], "Fulano");
        assert_eq!(result.metadata["download_link"], "https://example.com/a.pdf");
        assert_eq!(result.metadata["livro"], "Manual de Direito Civil");
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let result = normalize(&books(), record(json!({})), 3);
        assert_eq!(result.id, "biblioteca-#3");
        assert_eq!(result.title, "");
        assert_eq!(result.content, "");
        assert_eq!(result.preview, "");
        assert_eq!(result.area, "Geral");
        assert_eq!(result.metadata["cover_image"], "");
    }

    #[test]
    fn test_area_falls_back_through_variants() {
        let result = normalize(&books(), record(json!({ "Área do Direito": "Penal" })), 0);
        assert_eq!(result.area, "Penal");
        assert_eq!(result.metadata["subject_area"], "Penal");

        let result = normalize(&books(), record(json!({ "área": "", "area": "Tributário" })), 0);
        assert_eq!(result.area, "Tributário");
    }

    #[test]
    fn test_object_id_is_unwrapped() {
        let rec = record(json!({ "_id": { "$oid": "65f0c0ffee" } }));
        assert_eq!(record_id(&rec, 9), "65f0c0ffee");
    }

    #[test]
    fn test_positional_id_never_collides_with_stored_id() {
        let stored = normalize(&books(), record(json!({ "id": 1, "livro": "Contrato A" })), 0);
        let unkeyed = normalize(&books(), record(json!({ "livro": "Contrato B" })), 1);
        assert_eq!(stored.id, "biblioteca-1");
        assert_eq!(unkeyed.id, "biblioteca-#1");

        let blank = record(json!({ "id": "", "_id": null }));
        assert_eq!(record_id(&blank, 4), "#4");
    }

    #[test]
    fn test_long_body_is_previewed() {
        let body = "x".repeat(400);
        let result = normalize(&books(), record(json!({ "sobre": body })), 0);
        assert_eq!(result.content.len(), 400);
        assert_eq!(result.preview.chars().count(), 153);
    }
}
