//! Contact form validation and delivery
//!
//! The form is validated locally; sending is delegated to a
//! [`MessageDelivery`] provider so the page never talks to a mail service
//! directly.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;
use thiserror::Error;
use unveil_core::{StageHandle, TimerId};

/// How long the "message sent" confirmation stays up
pub const CONFIRMATION_MS: u64 = 3000;

pub const MIN_MESSAGE_CHARS: usize = 10;

fn is_email(value: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(value))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Email,
    Message,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Message => "message",
        })
    }
}

/// Per-field validation failures, in field order
#[derive(Clone, Debug, Default, PartialEq, Eq, Error)]
pub struct ValidationErrors {
    errors: Vec<(Field, &'static str)>,
}

impl ValidationErrors {
    fn push(&mut self, field: Field, message: &'static str) {
        self.errors.push((field, message));
    }

    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, message)| *message)
    }

    /// Forget the error for a field, as when the user edits it
    pub fn clear(&mut self, field: Field) {
        self.errors.retain(|(f, _)| *f != field);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.errors.iter().copied()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, message)) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    pub fn new(name: impl Into<String>, email: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.name.trim().is_empty() {
            errors.push(Field::Name, "Name is required");
        }

        if self.email.trim().is_empty() {
            errors.push(Field::Email, "Email is required");
        } else if !is_email(&self.email) {
            errors.push(Field::Email, "Please enter a valid email");
        }

        if self.message.trim().is_empty() {
            errors.push(Field::Message, "Message is required");
        } else if self.message.chars().count() < MIN_MESSAGE_CHARS {
            errors.push(Field::Message, "Message must be at least 10 characters");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// What is handed to the delivery provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
    pub reply_to: String,
}

impl From<&ContactForm> for ContactMessage {
    fn from(form: &ContactForm) -> Self {
        Self {
            name: form.name.clone(),
            email: form.email.clone(),
            message: form.message.clone(),
            reply_to: form.email.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("message delivery failed: {0}")]
pub struct DeliveryError(pub String);

#[derive(Debug, Error)]
pub enum ContactError {
    #[error("form is invalid: {0}")]
    Invalid(#[from] ValidationErrors),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Sends a contact message somewhere (mail service, queue, log)
pub trait MessageDelivery {
    fn deliver(&mut self, message: &ContactMessage) -> Result<(), DeliveryError>;
}

/// Keeps every message in memory; optionally fails every send
#[derive(Debug, Default)]
pub struct RecordingDelivery {
    pub sent: Vec<ContactMessage>,
    fail_with: Option<String>,
}

impl RecordingDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            sent: Vec::new(),
            fail_with: Some(reason.into()),
        }
    }
}

impl MessageDelivery for RecordingDelivery {
    fn deliver(&mut self, message: &ContactMessage) -> Result<(), DeliveryError> {
        if let Some(reason) = &self.fail_with {
            return Err(DeliveryError(reason.clone()));
        }
        self.sent.push(message.clone());
        Ok(())
    }
}

/// Validate and send the form, clearing it once sent
///
/// A failed delivery leaves the form as it was so the user can retry.
pub fn submit<D>(form: &mut ContactForm, delivery: &mut D) -> Result<ContactMessage, ContactError>
where
    D: MessageDelivery + ?Sized,
{
    form.validate()?;

    let message = ContactMessage::from(&*form);
    if let Err(e) = delivery.deliver(&message) {
        tracing::error!("Error submitting form: {}", e);
        return Err(e.into());
    }

    tracing::debug!(reply_to = %message.reply_to, "contact message sent");
    form.clear();
    Ok(message)
}

/// A "message sent" notice that hides itself after [`CONFIRMATION_MS`]
pub struct SubmitConfirmation {
    stage: StageHandle,
    visible: Rc<Cell<bool>>,
    timer: Option<TimerId>,
}

impl SubmitConfirmation {
    pub fn new(stage: &StageHandle) -> Self {
        Self {
            stage: stage.clone(),
            visible: Rc::new(Cell::new(false)),
            timer: None,
        }
    }

    /// Show the notice, restarting the hide timer if already shown
    pub fn show(&mut self) {
        if let Some(timer) = self.timer.take() {
            self.stage.cancel_timer(timer);
        }
        self.visible.set(true);

        let visible = Rc::downgrade(&self.visible);
        self.timer = self.stage.schedule(CONFIRMATION_MS, move || {
            if let Some(visible) = visible.upgrade() {
                visible.set(false);
            }
        });
    }

    pub fn is_visible(&self) -> bool {
        self.visible.get()
    }
}

impl Drop for SubmitConfirmation {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            self.stage.cancel_timer(timer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unveil_core::{Rect, Stage};

    #[test]
    fn test_empty_form_reports_every_field() {
        let errors = ContactForm::default().validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors.get(Field::Name), Some("Name is required"));
        assert_eq!(errors.get(Field::Email), Some("Email is required"));
        assert_eq!(errors.get(Field::Message), Some("Message is required"));
    }

    #[test]
    fn test_email_shape() {
        for bad in ["plainaddress", "a@b", "a b@c.com", "@c.com", "a@.com"] {
            let form = ContactForm::new("Ada", bad, "Hello there, world");
            let errors = form.validate().unwrap_err();
            assert_eq!(errors.get(Field::Email), Some("Please enter a valid email"), "{bad}");
        }
        for good in ["ada@example.com", "a.b+c@mail.co.uk"] {
            assert!(ContactForm::new("Ada", good, "Hello there, world").validate().is_ok());
        }
    }

    #[test]
    fn test_message_length() {
        let short = ContactForm::new("Ada", "ada@example.com", "Too short");
        assert_eq!(
            short.validate().unwrap_err().get(Field::Message),
            Some("Message must be at least 10 characters")
        );

        let blank = ContactForm::new("Ada", "ada@example.com", "          ");
        assert_eq!(
            blank.validate().unwrap_err().get(Field::Message),
            Some("Message is required")
        );

        assert!(ContactForm::new("Ada", "ada@example.com", "Ten chars!").validate().is_ok());
    }

    #[test]
    fn test_clear_single_error() {
        let mut errors = ContactForm::default().validate().unwrap_err();
        errors.clear(Field::Email);
        assert_eq!(errors.get(Field::Email), None);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "name: Name is required; message: Message is required"
        );
    }

    #[test]
    fn test_submit_sends_and_clears() {
        let mut form = ContactForm::new("Ada", "ada@example.com", "Let's build something");
        let mut delivery = RecordingDelivery::new();

        let sent = submit(&mut form, &mut delivery).unwrap();
        assert_eq!(sent.reply_to, "ada@example.com");
        assert_eq!(delivery.sent, vec![sent]);
        assert_eq!(form, ContactForm::default());
    }

    #[test]
    fn test_submit_invalid_sends_nothing() {
        let mut form = ContactForm::new("", "ada@example.com", "Let's build something");
        let mut delivery = RecordingDelivery::new();

        assert!(matches!(
            submit(&mut form, &mut delivery),
            Err(ContactError::Invalid(_))
        ));
        assert!(delivery.sent.is_empty());
    }

    #[test]
    fn test_delivery_failure_keeps_form() {
        let original = ContactForm::new("Ada", "ada@example.com", "Let's build something");
        let mut form = original.clone();
        let mut delivery = RecordingDelivery::failing("service unavailable");

        let err = submit(&mut form, &mut delivery).unwrap_err();
        assert!(matches!(err, ContactError::Delivery(DeliveryError(ref r)) if r == "service unavailable"));
        assert_eq!(form, original);
    }

    #[test]
    fn test_confirmation_hides_after_timeout() {
        let stage = Stage::new(Rect::from_size(800.0, 600.0));
        let mut notice = SubmitConfirmation::new(&stage.handle());

        notice.show();
        assert!(notice.is_visible());
        stage.advance(2000);

        // Showing again restarts the countdown
        notice.show();
        stage.advance(2000);
        assert!(notice.is_visible());

        stage.advance(1000);
        assert!(!notice.is_visible());
        assert_eq!(stage.pending_timers(), 0);
    }
}
