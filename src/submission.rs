//! Hand-off of completed registrations to the backend

use crate::error::SubmissionError;
use crate::state::{
    BasicInfo, ContactInfo, DocumentsInfo, FamilyInfo, FormDraft, ProfessionalInfo, StepData,
    StepKey,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A completed registration, as handed to the submission collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationApplication {
    pub id: Uuid,
    pub user_id: String,
    pub submitted_at: DateTime<Utc>,
    pub basic_info: BasicInfo,
    pub contact: ContactInfo,
    pub family: FamilyInfo,
    pub professional: ProfessionalInfo,
    pub documents: DocumentsInfo,
}

impl RegistrationApplication {
    /// Build the payload from a draft. Missing sections are sent empty.
    pub fn assemble(user_id: &str, draft: &FormDraft) -> Self {
        let mut application = Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            submitted_at: Utc::now(),
            basic_info: BasicInfo::default(),
            contact: ContactInfo::default(),
            family: FamilyInfo::default(),
            professional: ProfessionalInfo::default(),
            documents: DocumentsInfo::default(),
        };
        for key in StepKey::ALL {
            match draft.get(key) {
                Some(StepData::BasicInfo(info)) => application.basic_info = info.clone(),
                Some(StepData::Contact(info)) => application.contact = info.clone(),
                Some(StepData::Family(info)) => application.family = info.clone(),
                Some(StepData::Professional(info)) => application.professional = info.clone(),
                Some(StepData::Documents(info)) => application.documents = info.clone(),
                None => {}
            }
        }
        application
    }
}

/// Acknowledgement returned by the collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub application_id: Uuid,
    /// Short reference the applicant can quote to consular staff
    pub reference: String,
    pub received_at: DateTime<Utc>,
}

impl SubmissionReceipt {
    pub fn for_application(application: &RegistrationApplication) -> Self {
        let id = application.id.simple().to_string();
        Self {
            application_id: application.id,
            reference: format!("CR-{}", id[..8].to_uppercase()),
            received_at: Utc::now(),
        }
    }
}

/// Trait for the external collaborator that durably stores applications
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Persist the application, returning a receipt on success
    async fn submit(
        &self,
        application: &RegistrationApplication,
    ) -> Result<SubmissionReceipt, SubmissionError>;
}

/// Writes each application as a JSON file into an outbox directory
#[derive(Debug, Clone)]
pub struct OutboxSubmitter {
    dir: PathBuf,
}

impl OutboxSubmitter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, application: &RegistrationApplication) -> PathBuf {
        self.dir.join(format!("{}.json", application.id))
    }
}

#[async_trait]
impl Submitter for OutboxSubmitter {
    async fn submit(
        &self,
        application: &RegistrationApplication,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(application);
        if tokio::fs::try_exists(&path).await? {
            return Err(SubmissionError::Rejected(format!(
                "application {} was already submitted",
                application.id
            )));
        }

        // Write then rename so the outbox never holds a truncated application
        let body = serde_json::to_vec_pretty(application)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;

        let receipt = SubmissionReceipt::for_application(application);
        tracing::info!(
            application_id = %application.id,
            reference = %receipt.reference,
            path = %path.display(),
            "Application written to outbox"
        );
        Ok(receipt)
    }
}
