//! Create/edit workflow for a single partner record.
//!
//! The editor owns the selection (which partner is being edited, if any),
//! validates form input before anything is sent, and allows one submission
//! in flight at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::contract::client::PartnersApi;
use crate::contract::error::{PartnersError, ValidationErrors};
use crate::contract::model::{Partner, PartnerForm};
use crate::domain::validation;

/// Progress of the last submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    Pending,
    Succeeded(Partner),
    Failed(String),
}

impl MutationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("invalid form: {0}")]
    Invalid(ValidationErrors),
    #[error("a submission is already in progress")]
    Busy,
    #[error(transparent)]
    Api(#[from] PartnersError),
}

impl EditorError {
    /// Field messages to show inline, if this is a validation failure.
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Invalid(errors) => Some(errors),
            Self::Api(PartnersError::Invalid { errors }) => Some(errors),
            _ => None,
        }
    }
}

pub struct PartnerEditor {
    api: Arc<dyn PartnersApi>,
    groups: Vec<String>,
    selected: Mutex<Option<Partner>>,
    open: AtomicBool,
    in_flight: AtomicBool,
    status: watch::Sender<MutationStatus>,
}

/// Clears the in-flight flag when the submission finishes or is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PartnerEditor {
    pub fn new(api: Arc<dyn PartnersApi>, groups: Vec<String>) -> Self {
        let (status, _) = watch::channel(MutationStatus::Idle);
        Self {
            api,
            groups,
            selected: Mutex::new(None),
            open: AtomicBool::new(false),
            in_flight: AtomicBool::new(false),
            status,
        }
    }

    /// Open for a new record; returns the blank form.
    pub fn open_create(&self) -> PartnerForm {
        *self.selected.lock() = None;
        self.open.store(true, Ordering::Release);
        PartnerForm::default()
    }

    /// Open for `partner`; returns the form pre-filled from it.
    pub fn open_edit(&self, partner: Partner) -> PartnerForm {
        let form = partner.to_form();
        *self.selected.lock() = Some(partner);
        self.open.store(true, Ordering::Release);
        form
    }

    /// Close and drop the selection. A pending submission keeps running.
    pub fn cancel(&self) {
        *self.selected.lock() = None;
        self.open.store(false, Ordering::Release);
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    pub fn selected(&self) -> Option<Partner> {
        self.selected.lock().clone()
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn status(&self) -> watch::Receiver<MutationStatus> {
        self.status.subscribe()
    }

    /// Validate `form`, then create (no selection) or update (selection's id
    /// with the form's values).
    pub async fn submit(&self, form: &PartnerForm) -> Result<Partner, EditorError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Rejected submit: another one is pending");
            return Err(EditorError::Busy);
        }
        let _guard = InFlight(&self.in_flight);

        let values = validation::validate_form(form, &self.groups).map_err(|errors| {
            debug!(fields = errors.len(), "Form rejected by validation");
            EditorError::Invalid(errors)
        })?;

        self.status.send_replace(MutationStatus::Pending);
        let target = self.selected();
        let result = match &target {
            Some(current) => self.api.update_partner(current.with_values(values)).await,
            None => self.api.create_partner(values).await,
        };

        match result {
            Ok(saved) => {
                info!(partner_id = %saved.id, "Partner saved");
                let mut selected = self.selected.lock();
                if selected.as_ref().map(|p| p.id) == target.as_ref().map(|p| p.id) {
                    *selected = None;
                    self.open.store(false, Ordering::Release);
                }
                drop(selected);
                self.status
                    .send_replace(MutationStatus::Succeeded(saved.clone()));
                Ok(saved)
            }
            Err(e) => {
                warn!(error = %e, "Partner save failed");
                self.status.send_replace(MutationStatus::Failed(e.to_string()));
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::model::{NewPartner, PartnersPage, TaxIdentity};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::Notify;
    use uuid::Uuid;

    #[derive(Default)]
    struct FakeApi {
        calls: AtomicUsize,
        gate: Option<Arc<Notify>>,
        fail_with: Option<PartnersError>,
    }

    impl FakeApi {
        async fn respond(&self, partner: Partner) -> Result<Partner, PartnersError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(partner),
            }
        }
    }

    #[async_trait]
    impl PartnersApi for FakeApi {
        async fn list_partners(&self, _: u32, _: u32) -> Result<Arc<PartnersPage>, PartnersError> {
            unreachable!("editor never lists")
        }

        async fn create_partner(&self, p: NewPartner) -> Result<Partner, PartnersError> {
            let created = Partner {
                id: Uuid::new_v4(),
                name: p.name,
                group: p.group,
                description: p.description,
                tax: p.tax,
            };
            self.respond(created).await
        }

        async fn update_partner(&self, p: Partner) -> Result<Partner, PartnersError> {
            self.respond(p).await
        }

        async fn delete_partner(&self, p: Partner) -> Result<Partner, PartnersError> {
            Ok(p)
        }

        async fn find_partner(&self, _: Uuid) -> Result<Option<Partner>, PartnersError> {
            Ok(None)
        }
    }

    fn groups() -> Vec<String> {
        vec!["Группа 1".to_string(), "Группа 2".to_string()]
    }

    fn valid_form() -> PartnerForm {
        PartnerForm {
            name: "ООО Ромашка".into(),
            group: "Группа 1".into(),
            inn: "7702070139".into(),
            kpp: "770943002".into(),
            description: None,
            has_legal_entity: true,
        }
    }

    fn existing() -> Partner {
        Partner {
            id: Uuid::new_v4(),
            name: "Старое имя".into(),
            group: "Группа 2".into(),
            description: Some("note".into()),
            tax: TaxIdentity::Individual {
                inn: "500100732259".into(),
                kpp: None,
            },
        }
    }

    #[tokio::test]
    async fn invalid_form_is_not_sent() {
        let api = Arc::new(FakeApi::default());
        let editor = PartnerEditor::new(api.clone(), groups());
        editor.open_create();

        let err = editor.submit(&PartnerForm::default()).await.unwrap_err();
        let fields = err.field_errors().unwrap();
        assert!(fields.contains("name"));
        assert!(fields.contains("inn"));
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
        assert_eq!(*editor.status().borrow(), MutationStatus::Idle);
        assert!(editor.is_open());
    }

    #[tokio::test]
    async fn create_closes_editor_on_success() {
        let api = Arc::new(FakeApi::default());
        let editor = PartnerEditor::new(api.clone(), groups());
        let form = editor.open_create();
        assert_eq!(form, PartnerForm::default());

        let saved = editor.submit(&valid_form()).await.unwrap();
        assert_eq!(saved.name, "ООО Ромашка");
        assert!(!editor.is_open());
        assert_eq!(*editor.status().borrow(), MutationStatus::Succeeded(saved));
    }

    #[tokio::test]
    async fn edit_merges_selected_id_with_form_values() {
        let api = Arc::new(FakeApi::default());
        let editor = PartnerEditor::new(api, groups());
        let original = existing();
        let form = editor.open_edit(original.clone());
        assert_eq!(form.inn, "500100732259");
        assert!(!form.has_legal_entity);

        let saved = editor.submit(&valid_form()).await.unwrap();
        assert_eq!(saved.id, original.id);
        assert_eq!(saved.inn(), "7702070139");
        assert!(editor.selected().is_none());
    }

    #[tokio::test]
    async fn second_submit_while_pending_is_busy() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(FakeApi {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let editor = Arc::new(PartnerEditor::new(api.clone(), groups()));
        editor.open_create();

        let mut status = editor.status();
        let first = tokio::spawn({
            let editor = editor.clone();
            async move { editor.submit(&valid_form()).await }
        });
        status.wait_for(MutationStatus::is_pending).await.unwrap();
        assert!(editor.is_submitting());

        assert_eq!(
            editor.submit(&valid_form()).await.unwrap_err(),
            EditorError::Busy
        );

        gate.notify_one();
        first.await.unwrap().unwrap();
        assert!(!editor.is_submitting());
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_keeps_editor_open_with_message() {
        let api = Arc::new(FakeApi {
            fail_with: Some(PartnersError::rejected("ИНН занят")),
            ..Default::default()
        });
        let editor = PartnerEditor::new(api, groups());
        editor.open_edit(existing());

        let err = editor.submit(&valid_form()).await.unwrap_err();
        assert_eq!(err.to_string(), "ИНН занят");
        assert!(editor.is_open());
        assert!(editor.selected().is_some());
        assert_eq!(
            *editor.status().borrow(),
            MutationStatus::Failed("ИНН занят".into())
        );
    }

    #[tokio::test]
    async fn cancel_does_not_abort_pending_submit() {
        let gate = Arc::new(Notify::new());
        let api = Arc::new(FakeApi {
            gate: Some(gate.clone()),
            ..Default::default()
        });
        let editor = Arc::new(PartnerEditor::new(api, groups()));
        editor.open_edit(existing());

        let mut status = editor.status();
        let pending = tokio::spawn({
            let editor = editor.clone();
            async move { editor.submit(&valid_form()).await }
        });
        status.wait_for(MutationStatus::is_pending).await.unwrap();

        editor.cancel();
        assert!(!editor.is_open());
        gate.notify_one();
        assert!(pending.await.unwrap().is_ok());
    }
}
