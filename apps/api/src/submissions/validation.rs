//! Input checks for resume submissions. All run before any extraction or analysis work,
//! except the resume length check, which needs the extracted text.

use crate::errors::AppError;
use crate::extraction::DocumentFormat;

pub const MIN_JOB_DESCRIPTION_CHARS: usize = 50;
pub const MIN_RESUME_CHARS: usize = 100;

/// Accepts only the PDF and DOCX MIME types. Parameters such as `; charset=` are ignored.
pub fn validate_content_type(content_type: Option<&str>) -> Result<DocumentFormat, AppError> {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .unwrap_or_default();
    DocumentFormat::from_mime(essence).map_err(|_| {
        AppError::UnsupportedFormat(
            "Unsupported file type. Only PDF and DOCX files are allowed.".to_string(),
        )
    })
}

pub fn validate_job_description(job_description: &str) -> Result<(), AppError> {
    let trimmed = job_description.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "Job description cannot be empty.".to_string(),
        ));
    }
    if trimmed.chars().count() < MIN_JOB_DESCRIPTION_CHARS {
        return Err(AppError::Validation(format!(
            "Job description is too short. Please provide a more detailed job description (at least {MIN_JOB_DESCRIPTION_CHARS} characters)."
        )));
    }
    Ok(())
}

pub fn validate_upload(bytes: &[u8]) -> Result<(), AppError> {
    if bytes.is_empty() {
        return Err(AppError::Validation("Uploaded file is empty.".to_string()));
    }
    Ok(())
}

pub fn validate_resume_text(resume_text: &str) -> Result<(), AppError> {
    if resume_text.trim().chars().count() < MIN_RESUME_CHARS {
        return Err(AppError::Validation(
            "Resume text is too short. Please ensure your resume contains sufficient content for analysis."
                .to_string(),
        ));
    }
    Ok(())
}
