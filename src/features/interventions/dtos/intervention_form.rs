//! Multipart form shared by the create and update endpoints.

use axum::extract::{FromRequest, Multipart, Request};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::AppError;
use crate::features::interventions::models::DocumentKind;

/// Allowed MIME types for intervention attachments
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "application/pdf",
];

/// Maximum size of a single attachment in bytes (10MB)
pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Intervention form for OpenAPI documentation.
/// The handlers read the multipart body field by field.
#[derive(Debug, Deserialize, ToSchema)]
#[allow(dead_code)]
pub struct InterventionFormDto {
    /// Intervention title (required)
    #[schema(example = "Remplacement tuiles faîtage")]
    pub titre: String,
    pub description: Option<String>,
    /// Planned start; empty to unschedule
    #[schema(example = "2025-03-10T07:30")]
    #[serde(rename = "dateDebut")]
    pub date_debut: Option<String>,
    #[schema(example = "2025-03-12T17:00")]
    #[serde(rename = "dateFin")]
    pub date_fin: Option<String>,
    /// Job site the intervention belongs to (required)
    #[serde(rename = "chantierId")]
    pub chantier_id: Uuid,
    /// JSON array of `{salarieId, role, dateDebut, dateFin?}`
    #[schema(example = r#"[{"salarieId":"6f1c...","role":"chef_equipe","dateDebut":"2025-03-10"}]"#)]
    pub affectations: Option<String>,
    /// Document attachments (repeatable)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub documents: Option<Vec<String>>,
    /// Photo attachments (repeatable)
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub photos: Option<Vec<String>>,
}

/// Raw text fields as received, blank values already dropped
#[derive(Debug, Default, Validate)]
struct FormFields {
    #[validate(
        required(message = "titre is required"),
        length(max = 255, message = "titre must be at most 255 characters")
    )]
    titre: Option<String>,
    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    description: Option<String>,
    date_debut: Option<String>,
    date_fin: Option<String>,
    #[validate(required(message = "chantierId is required"))]
    chantier_id: Option<String>,
    affectations: Option<String>,
}

/// File part of the form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub kind: DocumentKind,
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Validated create/update input
#[derive(Debug, Clone)]
pub struct InterventionInput {
    pub title: String,
    pub description: Option<String>,
    pub planned_start: Option<DateTime<Utc>>,
    pub planned_end: Option<DateTime<Utc>>,
    pub chantier_id: Uuid,
    /// Raw crew payload; `None` leaves assignments untouched
    pub affectations: Option<String>,
    pub attachments: Vec<UploadedFile>,
}

impl InterventionInput {
    /// Read and validate the multipart body.
    ///
    /// Every validation failure is reported before anything is persisted.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut fields = FormFields::default();
        let mut attachments = Vec::new();

        while let Some(field) = multipart.next_field().await.map_err(|e| {
            debug!("Failed to read multipart field: {}", e);
            AppError::BadRequest(format!("Failed to read multipart data: {}", e))
        })? {
            let field_name = field.name().unwrap_or("").to_string();

            let kind = match field_name.as_str() {
                "documents" => Some(DocumentKind::Document),
                "photos" => Some(DocumentKind::Photo),
                _ => None,
            };

            if let Some(kind) = kind {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let file_name = field
                    .file_name()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unnamed".to_string());
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read file data: {}", e))
                })?;

                // Browsers send an empty part for an untouched file input
                if data.is_empty() {
                    continue;
                }

                attachments.push(UploadedFile {
                    kind,
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
                continue;
            }

            let text = field.text().await.map_err(|e| {
                AppError::BadRequest(format!("Failed to read field '{}': {}", field_name, e))
            })?;
            let value = non_blank(text);

            match field_name.as_str() {
                "titre" => fields.titre = value,
                "description" => fields.description = value,
                "dateDebut" => fields.date_debut = value,
                "dateFin" => fields.date_fin = value,
                "chantierId" => fields.chantier_id = value,
                "affectations" => fields.affectations = value,
                _ => debug!("Ignoring unknown field: {}", field_name),
            }
        }

        Self::from_parts(fields, attachments)
    }

    fn from_parts(fields: FormFields, attachments: Vec<UploadedFile>) -> Result<Self, AppError> {
        fields
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        for file in &attachments {
            validate_attachment(file)?;
        }

        let chantier_id = fields
            .chantier_id
            .as_deref()
            .map(Uuid::parse_str)
            .transpose()
            .map_err(|_| AppError::Validation("chantierId must be a valid UUID".to_string()))?
            .ok_or_else(|| AppError::Validation("chantierId is required".to_string()))?;

        let planned_start = parse_date_input("dateDebut", fields.date_debut.as_deref())?;
        let planned_end = parse_date_input("dateFin", fields.date_fin.as_deref())?;

        if let (Some(start), Some(end)) = (planned_start, planned_end) {
            if end < start {
                return Err(AppError::Validation(
                    "dateFin must not be before dateDebut".to_string(),
                ));
            }
        }

        Ok(Self {
            title: fields.titre.unwrap_or_default(),
            description: fields.description,
            planned_start,
            planned_end,
            chantier_id,
            affectations: fields.affectations,
            attachments,
        })
    }
}

impl<S> FromRequest<S> for InterventionInput
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await.map_err(|e| {
            debug!("Rejected intervention form: {}", e);
            AppError::BadRequest(format!("Expected multipart/form-data: {}", e.body_text()))
        })?;

        Self::from_multipart(multipart).await
    }
}

fn non_blank(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn validate_attachment(file: &UploadedFile) -> Result<(), AppError> {
    if file.data.len() > MAX_FILE_SIZE {
        return Err(AppError::Validation(format!(
            "File '{}' too large. Maximum size is {} MB",
            file.file_name,
            MAX_FILE_SIZE / 1024 / 1024
        )));
    }

    if !ALLOWED_MIME_TYPES.contains(&file.content_type.as_str()) {
        return Err(AppError::Validation(format!(
            "File type '{}' is not allowed. Allowed types: {}",
            file.content_type,
            ALLOWED_MIME_TYPES.join(", ")
        )));
    }

    Ok(())
}

/// Parse a date field from the form.
///
/// Accepts RFC 3339, `datetime-local` values (`2025-03-10T07:30`, seconds
/// optional) and plain dates, the latter two read as UTC. Missing or blank
/// input means no date.
pub fn parse_date_input(field: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Some(naive.and_utc()));
        }
    }

    if let Some(naive) = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Some(naive.and_utc()));
    }

    Err(AppError::Validation(format!(
        "{} is not a valid date: {:?}",
        field, raw
    )))
}

/// Extension used when storing an attachment
pub fn extension_for(file: &UploadedFile) -> &str {
    match file.content_type.as_str() {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/heic" => "heic",
        "application/pdf" => "pdf",
        _ => file
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
            .unwrap_or("bin"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fake::faker::lorem::en::Sentence;
    use fake::Fake;

    fn fields() -> FormFields {
        FormFields {
            titre: Some(Sentence(3..6).fake()),
            chantier_id: Some(Uuid::new_v4().to_string()),
            ..Default::default()
        }
    }

    fn photo(content_type: &str, size: usize) -> UploadedFile {
        UploadedFile {
            kind: DocumentKind::Photo,
            file_name: "facade.jpg".to_string(),
            content_type: content_type.to_string(),
            data: vec![0u8; size],
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 10, 7, 30, 0).unwrap();
        for raw in [
            "2025-03-10T07:30:00Z",
            "2025-03-10T08:30:00+01:00",
            "2025-03-10T07:30",
            "2025-03-10T07:30:00",
            "2025-03-10 07:30:00",
        ] {
            assert_eq!(parse_date_input("dateDebut", Some(raw)).unwrap(), Some(expected), "{raw}");
        }

        assert_eq!(
            parse_date_input("dateDebut", Some("2025-03-10")).unwrap(),
            Some(Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_blank_date_is_none() {
        assert_eq!(parse_date_input("dateDebut", None).unwrap(), None);
        assert_eq!(parse_date_input("dateDebut", Some("")).unwrap(), None);
        assert_eq!(parse_date_input("dateDebut", Some("   ")).unwrap(), None);
    }

    #[test]
    fn test_invalid_date_is_validation_error() {
        let err = parse_date_input("dateDebut", Some("10/03/2025")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_missing_title_is_rejected() {
        let mut f = fields();
        f.titre = None;
        let err = InterventionInput::from_parts(f, Vec::new()).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg.contains("titre")));
    }

    #[test]
    fn test_missing_or_invalid_chantier_is_rejected() {
        let mut f = fields();
        f.chantier_id = None;
        assert!(matches!(
            InterventionInput::from_parts(f, Vec::new()),
            Err(AppError::Validation(_))
        ));

        let mut f = fields();
        f.chantier_id = Some("chantier-12".to_string());
        assert!(matches!(
            InterventionInput::from_parts(f, Vec::new()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let mut f = fields();
        f.date_debut = Some("2025-03-12".to_string());
        f.date_fin = Some("2025-03-10".to_string());
        assert!(matches!(
            InterventionInput::from_parts(f, Vec::new()),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_unscheduled_input() {
        let input = InterventionInput::from_parts(fields(), Vec::new()).unwrap();
        assert!(input.planned_start.is_none());
        assert!(input.affectations.is_none());
    }

    #[test]
    fn test_attachment_checks() {
        assert!(InterventionInput::from_parts(fields(), vec![photo("image/jpeg", 16)]).is_ok());
        assert!(matches!(
            InterventionInput::from_parts(fields(), vec![photo("text/html", 16)]),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            InterventionInput::from_parts(fields(), vec![photo("image/jpeg", MAX_FILE_SIZE + 1)]),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for(&photo("image/jpeg", 1)), "jpg");
        let mut other = photo("application/octet-stream", 1);
        other.file_name = "plan.dwg".to_string();
        assert_eq!(extension_for(&other), "dwg");
    }

    #[test]
    fn test_extension_for_name_without_extension() {
        let mut other = photo("application/octet-stream", 1);
        other.file_name = "releve_chantier".to_string();
        assert_eq!(extension_for(&other), "bin");

        other.file_name = "scan.".to_string();
        assert_eq!(extension_for(&other), "bin");
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  ".to_string()), None);
        assert_eq!(non_blank(" Toiture ".to_string()), Some("Toiture".to_string()));
    }
}
