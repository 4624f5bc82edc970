use super::multipart::Form;
use bytes::Bytes;

/// An outbound request body.
///
/// When a caller supplies more than one payload kind the precedence is
/// multipart > form > json: file parts always win, form data beats a JSON
/// payload, and an absent payload produces an empty body.
#[derive(Debug, Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    Form(Vec<(String, String)>),
    Json(serde_json::Value),
    Multipart(Form),
    Raw(Bytes),
}

impl Body {
    /// Resolve the precedence between the three caller-facing payload kinds.
    pub(crate) fn resolve(
        form: Option<Vec<(String, String)>>,
        multipart: Option<Form>,
        json: Option<serde_json::Value>,
    ) -> Self {
        if let Some(form_data) = multipart {
            Body::Multipart(form_data)
        } else if let Some(fields) = form {
            Body::Form(fields)
        } else if let Some(value) = json {
            Body::Json(value)
        } else {
            Body::Empty
        }
    }

    /// The Content-Type this body implies, if any.
    pub fn content_type(&self) -> Option<String> {
        match self {
            Body::Empty | Body::Raw(_) => None,
            Body::Form(_) => Some("application/x-www-form-urlencoded".to_string()),
            Body::Json(_) => Some("application/json".to_string()),
            Body::Multipart(form) => Some(form.content_type()),
        }
    }

    /// Render the body into a transport buffer.
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Body::Empty => Bytes::new(),
            Body::Raw(bytes) => bytes.clone(),
            Body::Form(fields) => {
                let mut serializer = url::form_urlencoded::Serializer::new(String::new());
                for (name, value) in fields {
                    serializer.append_pair(name, value);
                }
                Bytes::from(serializer.finish())
            }
            Body::Json(value) => Bytes::from(value.to_string()),
            Body::Multipart(form) => form.to_bytes(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Raw(bytes) => bytes.is_empty(),
            Body::Form(fields) => fields.is_empty(),
            Body::Json(_) => false,
            Body::Multipart(form) => form.is_empty(),
        }
    }
}
