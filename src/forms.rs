// Forms - submitted post/comment data and field-level validation

use image::{ImageFormat, ImageReader};
use serde::Deserialize;
use std::io::Cursor;
use std::collections::BTreeMap;
use std::fmt;
use validator::{Validate, ValidationErrors};

use crate::infrastructure::media::ImageUpload;
use crate::models::GroupId;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_GROUP_MESSAGE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE_MESSAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Messages keyed by form field, rendered next to the offending input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.to_string());
    }

    pub fn field(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FormErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                out.add(&field.to_string(), &message);
            }
        }
        out
    }
}

/// Raw post form as submitted, before the group is resolved.
#[derive(Debug, Clone, Default)]
pub struct PostFormInput {
    pub text: String,
    pub group: String,
    pub image: Option<ImageUpload>,
    pub clear_image: bool,
}

#[derive(Debug, Clone, Validate)]
pub struct PostForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    pub group_id: Option<GroupId>,
    pub image: Option<ImageUpload>,
    pub clear_image: bool,
}

impl PostForm {
    /// Trim and type-check the raw input. Group existence is checked by the
    /// caller against the store.
    pub fn parse(input: PostFormInput) -> Result<Self, FormErrors> {
        let mut errors = FormErrors::new();

        let group = input.group.trim();
        let group_id = if group.is_empty() {
            None
        } else {
            match group.parse::<GroupId>() {
                Ok(id) => Some(id),
                Err(_) => {
                    errors.add("group", INVALID_GROUP_MESSAGE);
                    None
                }
            }
        };

        let image = input
            .image
            .filter(|upload| !upload.file_name.is_empty() || !upload.bytes.is_empty());
        if let Some(upload) = &image {
            if !is_image(upload) {
                errors.add("image", INVALID_IMAGE_MESSAGE);
            }
        }

        let form = PostForm {
            text: input.text.trim().to_string(),
            group_id,
            image,
            clear_image: input.clear_image,
        };
        if let Err(validation) = form.validate() {
            for (field, messages) in FormErrors::from(validation).0 {
                for message in messages {
                    errors.add(&field, &message);
                }
            }
        }

        errors.into_result().map(|_| form)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

impl CommentForm {
    pub fn cleaned(self) -> Self {
        Self {
            text: self.text.trim().to_string(),
        }
    }
}

/// An upload counts as an image when its declared content type is
/// `image/*`, its extension names a raster format the `image` crate knows,
/// and the bytes decode as that same format. Vector formats never pass.
pub fn is_image(upload: &ImageUpload) -> bool {
    let declared = upload
        .content_type
        .as_deref()
        .map(|ct| ct.starts_with("image/"))
        .unwrap_or(true);
    if !declared || upload.bytes.is_empty() {
        return false;
    }

    let Ok(named) = ImageFormat::from_path(&upload.file_name) else {
        return false;
    };
    let reader = match ImageReader::new(Cursor::new(&upload.bytes)).with_guessed_format() {
        Ok(reader) => reader,
        Err(_) => return false,
    };
    if reader.format() != Some(named) {
        return false;
    }
    reader.decode().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png() -> Vec<u8> {
        let mut bytes = Vec::new();
        image::RgbImage::new(2, 2)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn png() -> ImageUpload {
        ImageUpload {
            file_name: "small.png".to_string(),
            content_type: Some("image/png".to_string()),
            bytes: tiny_png(),
        }
    }

    #[test]
    fn test_post_form_requires_text() {
        let errors = PostForm::parse(PostFormInput {
            text: "   ".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(errors.field("text"), [REQUIRED_MESSAGE.to_string()]);
    }

    #[test]
    fn test_post_form_parses_group_and_trims_text() {
        let form = PostForm::parse(PostFormInput {
            text: "  Hello  ".to_string(),
            group: "3".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(form.text, "Hello");
        assert_eq!(form.group_id, Some(3));
    }

    #[test]
    fn test_post_form_rejects_non_numeric_group() {
        let errors = PostForm::parse(PostFormInput {
            text: "Hello".to_string(),
            group: "cats".to_string(),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(errors.field("group"), [INVALID_GROUP_MESSAGE.to_string()]);
        assert!(errors.field("text").is_empty());
    }

    #[test]
    fn test_post_form_accepts_image() {
        let form = PostForm::parse(PostFormInput {
            text: "With picture".to_string(),
            image: Some(png()),
            ..Default::default()
        })
        .unwrap();
        assert!(form.image.is_some());
    }

    #[test]
    fn test_post_form_rejects_non_image_upload() {
        let upload = ImageUpload {
            file_name: "notes.txt".to_string(),
            content_type: Some("text/plain".to_string()),
            bytes: b"hello".to_vec(),
        };
        let errors = PostForm::parse(PostFormInput {
            text: "Hello".to_string(),
            image: Some(upload),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(errors.field("image"), [INVALID_IMAGE_MESSAGE.to_string()]);
    }

    #[test]
    fn test_is_image_decodes_the_bytes() {
        assert!(is_image(&png()));

        let fake = ImageUpload {
            bytes: b"this is not a png".to_vec(),
            ..png()
        };
        assert!(!is_image(&fake));

        let svg = ImageUpload {
            file_name: "evil.svg".to_string(),
            content_type: Some("image/svg+xml".to_string()),
            bytes: b"<svg><script>alert(1)</script></svg>".to_vec(),
        };
        assert!(!is_image(&svg));

        let renamed = ImageUpload {
            file_name: "small.svg".to_string(),
            ..png()
        };
        assert!(!is_image(&renamed));

        let mislabeled = ImageUpload {
            file_name: "small.gif".to_string(),
            ..png()
        };
        assert!(!is_image(&mislabeled));
    }

    #[test]
    fn test_empty_file_field_means_no_image() {
        let empty = ImageUpload {
            file_name: String::new(),
            content_type: Some("application/octet-stream".to_string()),
            bytes: vec![],
        };
        let form = PostForm::parse(PostFormInput {
            text: "Hello".to_string(),
            image: Some(empty),
            ..Default::default()
        })
        .unwrap();
        assert!(form.image.is_none());
    }

    #[test]
    fn test_comment_form_validation() {
        let blank = CommentForm {
            text: "  ".to_string(),
        }
        .cleaned();
        assert!(blank.validate().is_err());

        let comment = CommentForm {
            text: " Nice ".to_string(),
        }
        .cleaned();
        assert!(comment.validate().is_ok());
        assert_eq!(comment.text, "Nice");
    }

    #[test]
    fn test_form_errors_display() {
        let mut errors = FormErrors::single("text", "required");
        errors.add("group", "invalid");
        assert_eq!(errors.to_string(), "group: invalid; text: required");
    }
}
