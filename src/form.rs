//! Turning what the user typed into a [`SubmissionPayload`].

use crate::error::{ConfiguratorError, Result};

/// Binary blob going out as a multipart file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn png(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime: "image/png".into(),
            bytes,
        }
    }
}

/// State of the optional image upload field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileField {
    /// The input is not on the page.
    #[default]
    Missing,
    /// Present, nothing chosen.
    Empty,
    Selected(Attachment),
}

/// Raw field values as read from the page. `None` means the field is absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawForm {
    pub name: Option<String>,
    pub font: Option<String>,
    pub color: Option<String>,
    pub flavours: Option<String>,
    pub image: FileField,
}

/// One design submission. Built fresh for every submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionPayload {
    pub name: String,
    pub font: String,
    pub color: String,
    pub key_flavours: Vec<String>,
    pub image: Option<Attachment>,
    pub screenshot: Attachment,
    pub user: String,
}

/// Comma-separated flavours, each trimmed. Empty entries are kept.
pub fn split_flavours(text: &str) -> Vec<String> {
    text.split(',').map(|f| f.trim().to_owned()).collect()
}

fn required(value: Option<&String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_owned())
        .ok_or_else(|| ConfiguratorError::Validation(format!("The form is missing the `{field}` field.")))
}

struct Fields {
    name: String,
    font: String,
    color: String,
    flavours: String,
    image: Option<Attachment>,
}

fn read_fields(form: &RawForm) -> Result<Fields> {
    let name = required(form.name.as_ref(), "name")?;
    let font = required(form.font.as_ref(), "font")?;
    let color = required(form.color.as_ref(), "color")?;
    let flavours = required(form.flavours.as_ref(), "flavours")?;

    let image = match &form.image {
        FileField::Missing => {
            return Err(ConfiguratorError::Validation(
                "The form is missing the `image` field.".into(),
            ));
        }
        FileField::Empty => None,
        FileField::Selected(file) => Some(file.clone()),
    };

    if name.is_empty() {
        return Err(ConfiguratorError::Validation("Please give your bag a name.".into()));
    }

    Ok(Fields {
        name,
        font,
        color,
        flavours,
        image,
    })
}

/// Checks the form without needing a snapshot of the view.
pub fn validate(form: &RawForm) -> Result<()> {
    read_fields(form).map(|_| ())
}

/// Reads the fixed field set plus a snapshot of the current view.
pub fn capture(form: &RawForm, screenshot: Attachment, user: &str) -> Result<SubmissionPayload> {
    let fields = read_fields(form)?;
    Ok(SubmissionPayload {
        name: fields.name,
        font: fields.font,
        color: fields.color,
        key_flavours: split_flavours(&fields.flavours),
        image: fields.image,
        screenshot,
        user: user.to_owned(),
    })
}
