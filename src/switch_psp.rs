//! Task list shown while a service moves from one PSP to another.
//!
//! Which tasks exist depends on the provider being switched to; whether each
//! task is done depends on the switching credential's state, the account's
//! 3DS Flex settings and (for Stripe) connector's KYC flags.

use serde::Serialize;

use crate::errors::DomainError;
use crate::models::credential::{CredentialState, GatewayAccountCredential, PaymentProvider};
use crate::models::gateway_account::GatewayAccount;
use crate::models::stripe_setup::StripeAccountSetup;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwitchTask {
    LinkCredentials,
    LinkFlex,
    BankDetails,
    ResponsiblePerson,
    VatNumber,
    CompanyNumber,
    Director,
    GovernmentEntityDocument,
    VerifyPspIntegration,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Complete,
    NotStarted,
    CannotStart,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TaskItem {
    pub task: SwitchTask,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SwitchTaskList {
    pub target_provider: PaymentProvider,
    pub tasks: Vec<TaskItem>,
}

impl SwitchTaskList {
    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(|t| t.status == TaskStatus::Complete)
    }

    pub fn status_of(&self, task: SwitchTask) -> Option<TaskStatus> {
        self.tasks.iter().find(|t| t.task == task).map(|t| t.status)
    }

    /// Everything except the final verification step is done.
    pub fn ready_to_verify(&self) -> bool {
        self.tasks
            .iter()
            .filter(|t| t.task != SwitchTask::VerifyPspIntegration)
            .all(|t| t.status == TaskStatus::Complete)
    }
}

fn done(complete: bool) -> TaskStatus {
    if complete {
        TaskStatus::Complete
    } else {
        TaskStatus::NotStarted
    }
}

/// Build the task list for switching `account` to `switching`.
///
/// `stripe_setup` must be supplied when switching to Stripe.
pub fn build_task_list(
    account: &GatewayAccount,
    switching: &GatewayAccountCredential,
    stripe_setup: Option<&StripeAccountSetup>,
) -> Result<SwitchTaskList, DomainError> {
    let mut tasks = Vec::new();

    match switching.payment_provider {
        PaymentProvider::Stripe => {
            let setup = stripe_setup.ok_or_else(|| {
                DomainError::InvalidConfiguration(format!(
                    "Stripe setup progress missing for gateway account {}",
                    account.external_id
                ))
            })?;
            tasks.push(TaskItem {
                task: SwitchTask::BankDetails,
                status: done(setup.bank_account),
            });
            tasks.push(TaskItem {
                task: SwitchTask::ResponsiblePerson,
                status: done(setup.responsible_person),
            });
            tasks.push(TaskItem {
                task: SwitchTask::VatNumber,
                status: done(setup.vat_number),
            });
            tasks.push(TaskItem {
                task: SwitchTask::CompanyNumber,
                status: done(setup.company_number),
            });
            tasks.push(TaskItem {
                task: SwitchTask::Director,
                status: done(setup.director),
            });
            tasks.push(TaskItem {
                task: SwitchTask::GovernmentEntityDocument,
                status: done(setup.government_entity_document),
            });
        }
        PaymentProvider::Worldpay => {
            tasks.push(TaskItem {
                task: SwitchTask::LinkCredentials,
                status: done(switching.state != CredentialState::Created),
            });
            if account.requires3ds {
                tasks.push(TaskItem {
                    task: SwitchTask::LinkFlex,
                    status: done(account.has_flex_credentials()),
                });
            }
        }
        PaymentProvider::Smartpay | PaymentProvider::Epdq | PaymentProvider::Sandbox => {
            tasks.push(TaskItem {
                task: SwitchTask::LinkCredentials,
                status: done(switching.state != CredentialState::Created),
            });
        }
    }

    let prerequisites_done = tasks.iter().all(|t| t.status == TaskStatus::Complete);
    let verify_status = if switching.state == CredentialState::VerifiedWithLivePayment {
        TaskStatus::Complete
    } else if prerequisites_done {
        TaskStatus::NotStarted
    } else {
        TaskStatus::CannotStart
    };
    tasks.push(TaskItem {
        task: SwitchTask::VerifyPspIntegration,
        status: verify_status,
    });

    Ok(SwitchTaskList {
        target_provider: switching.payment_provider,
        tasks,
    })
}

/// Guard for the "take a live payment" step: everything before it must be
/// done and the credential must not already be verified. `Err` is the
/// message shown back on the task list.
pub fn check_can_verify(
    switching: &GatewayAccountCredential,
    tasks: &SwitchTaskList,
) -> Result<(), &'static str> {
    if switching.state == CredentialState::VerifiedWithLivePayment {
        return Err("You have already verified your PSP integration");
    }
    if !tasks.ready_to_verify() {
        return Err("You must complete the earlier tasks before you can take a live payment");
    }
    Ok(())
}
